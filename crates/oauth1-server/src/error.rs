//! Error types for the HTTP server.

use axum::Form;
use axum::http::header::WWW_AUTHENTICATE;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use oauth1_initiate::OAuthError;
use oauth1_signature::KeyError;
use serde::Serialize;

/// Server startup error.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Configured signature method is not implemented.
    #[error("Unknown signature method: {0}")]
    UnknownSignatureMethod(String),

    /// Client public key could not be loaded.
    #[error("Failed to load RSA public key for client {client}: {source}")]
    ClientKey {
        client: String,
        #[source]
        source: KeyError,
    },

    /// Invalid bind address.
    #[error("Invalid address: {0}")]
    Address(#[from] std::net::AddrParseError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Rejected temporary credential request, rendered as a form-encoded body.
pub(crate) struct Rejection {
    pub(crate) error: OAuthError,
    pub(crate) realm: String,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    error_description: String,
}

impl Rejection {
    fn status(&self) -> StatusCode {
        match self.error {
            OAuthError::InvalidClient | OAuthError::InvalidSignature => StatusCode::UNAUTHORIZED,
            OAuthError::TemporarilyUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for Rejection {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Form(ErrorBody {
            error: self.error.code(),
            error_description: self.error.to_string(),
        });

        let mut response = (status, body).into_response();
        if status == StatusCode::UNAUTHORIZED {
            // Skipped for realms that are not valid header text
            if let Ok(value) = HeaderValue::from_str(&format!("OAuth realm=\"{}\"", self.realm)) {
                response.headers_mut().insert(WWW_AUTHENTICATE, value);
            }
        }
        response
    }
}
