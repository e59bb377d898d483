//! Error types for parameter extraction and key loading.

use std::str::Utf8Error;

/// Error while extracting OAuth parameters from a request.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum ParamsError {
    /// Request URL could not be parsed as an absolute URL.
    #[error("invalid request URL: {0}")]
    InvalidUrl(String),

    /// Form-encoded body could not be decoded.
    #[error("malformed form-encoded body")]
    MalformedBody,

    /// A protocol parameter was supplied more than once.
    #[error("duplicated \"{0}\" in parameters")]
    DuplicateParameter(String),
}

/// RSA key loading/parsing error.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum KeyError {
    /// Key file could not be read.
    #[error("failed to read key file {path}")]
    Read {
        /// Path of the key file.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Invalid UTF-8 in key.
    #[error("invalid UTF-8 in key")]
    InvalidUtf8(#[from] Utf8Error),

    /// PKCS#1 key parsing error.
    #[error("PKCS#1 key error")]
    Pkcs1(#[from] rsa::pkcs1::Error),
}

/// Error while signing a request on the client side.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum SignError {
    /// Request URL could not be parsed as an absolute URL.
    #[error("invalid request URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// `RSA-SHA1` requested without a private key.
    #[error("RSA-SHA1 requires a private key")]
    MissingPrivateKey,

    /// HMAC key could not be initialized.
    #[error("invalid HMAC key")]
    HmacKey(#[from] hmac::digest::InvalidLength),

    /// RSA signing failed.
    #[error("RSA signing failed")]
    Rsa(#[from] rsa::signature::Error),
}
