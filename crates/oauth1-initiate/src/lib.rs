//! OAuth 1.0 temporary credential requests (RFC 5849 Section 2.1).
//!
//! [`Initiator`] is the entry point: it extracts the protocol parameters,
//! runs the [`Validator`] and, on success, asks the [`Issuer`] for a fresh
//! [`TemporaryCredential`](oauth1_storage::TemporaryCredential). Rejections
//! are reported as [`OAuthError`], whose [`code`](OAuthError::code) is the
//! wire error code.

mod error;
mod initiator;
mod issuer;
mod policy;
mod validator;

pub use error::{IssueError, OAuthError};
pub use initiator::Initiator;
pub use issuer::Issuer;
pub use policy::{DEFAULT_TIMESTAMP_WINDOW, Policy};
pub use validator::{State, ValidatedRequest, Validator, resolve_client};
