//! OAuth 1.0 signatures (RFC 5849).
//!
//! This crate covers the protocol half of an OAuth 1.0 server endpoint:
//!
//! - [`params`]: extracts protocol parameters from the `Authorization` header
//!   or a form-encoded body into a [`SignedRequest`]
//! - [`SignatureMethod`]: `PLAINTEXT`, `HMAC-SHA1` and `RSA-SHA1` verification
//!   against the signature base string
//! - [`key`]: RSA key loading from PEM
//! - [`sign`]: the client side of the same algorithms, used by the CLI and tests
//!
//! # Example
//!
//! ```
//! use oauth1_signature::{ClientSecrets, SignatureMethod, extract};
//!
//! let body = b"oauth_consumer_key=client&oauth_callback=oob\
//!              &oauth_signature_method=PLAINTEXT&oauth_signature=secret%26";
//! let request = extract("POST", "https://auth.example.com/oauth/initiate", None, Some(body))
//!     .unwrap();
//!
//! let secrets = ClientSecrets { secret: Some("secret"), rsa_public_key: None };
//! assert!(SignatureMethod::Plaintext.verify(&request, &secrets, "secret&"));
//! ```

mod base_string;
mod encode;
mod error;
pub mod key;
mod method;
pub mod params;
pub mod sign;

pub use base_string::{normalize_base_url, normalize_parameters, signature_base_string};
pub use encode::oauth_encode;
pub use error::{KeyError, ParamsError, SignError};
pub use method::{ClientSecrets, SignatureMethod};
pub use params::{ParamSource, SignedRequest, extract};

/// Consumer key parameter.
pub const OAUTH_CONSUMER_KEY: &str = "oauth_consumer_key";
/// Callback URI parameter.
pub const OAUTH_CALLBACK: &str = "oauth_callback";
/// Signature method parameter.
pub const OAUTH_SIGNATURE_METHOD: &str = "oauth_signature_method";
/// Signature parameter (never part of the base string).
pub const OAUTH_SIGNATURE: &str = "oauth_signature";
/// Timestamp parameter.
pub const OAUTH_TIMESTAMP: &str = "oauth_timestamp";
/// Nonce parameter.
pub const OAUTH_NONCE: &str = "oauth_nonce";
/// Protocol version parameter.
pub const OAUTH_VERSION: &str = "oauth_version";
/// Token parameter (absent when requesting temporary credentials).
pub const OAUTH_TOKEN: &str = "oauth_token";
/// Callback value for out-of-band verifier delivery.
pub const OUT_OF_BAND: &str = "oob";
