//! Error types for temporary credential requests.

use oauth1_signature::ParamsError;
use oauth1_storage::StorageError;

/// Rejection of a temporary credential request.
///
/// Every variant maps to a fixed wire code (see [`OAuthError::code`]). The
/// `Display` output is the `error_description` sent to the client and never
/// carries internal state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OAuthError {
    /// A required protocol parameter is absent or empty.
    #[error("missing \"{0}\" in parameters")]
    MissingParameter(&'static str),

    /// Malformed request or invalid parameter value.
    #[error("{0}")]
    InvalidRequest(String),

    /// `oauth_consumer_key` does not identify a registered client.
    #[error("invalid client")]
    InvalidClient,

    /// Signature method unknown or disabled.
    #[error("unsupported signature method \"{0}\"")]
    UnsupportedSignatureMethod(String),

    /// Signature does not verify.
    #[error("invalid signature")]
    InvalidSignature,

    /// Timestamp outside the accepted window.
    #[error("invalid or expired \"oauth_timestamp\"")]
    InvalidTimestamp,

    /// Nonce already used with this client and timestamp.
    #[error("\"oauth_nonce\" has already been used")]
    InvalidNonce,

    /// A backend failed; the client may retry later.
    #[error("the server is temporarily unable to handle the request")]
    TemporarilyUnavailable,
}

impl OAuthError {
    /// Invalid value for the named parameter.
    pub fn invalid_parameter(name: &str) -> Self {
        Self::InvalidRequest(format!("invalid \"{name}\" in parameters"))
    }

    /// Wire error code (`error` response field).
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingParameter(_) => "missing_required_parameter",
            Self::InvalidRequest(_) => "invalid_request",
            Self::InvalidClient => "invalid_client",
            Self::UnsupportedSignatureMethod(_) => "unsupported_signature_method",
            Self::InvalidSignature => "invalid_signature",
            Self::InvalidTimestamp => "invalid_timestamp",
            Self::InvalidNonce => "invalid_nonce",
            Self::TemporarilyUnavailable => "temporarily_unavailable",
        }
    }
}

impl From<ParamsError> for OAuthError {
    fn from(err: ParamsError) -> Self {
        match err {
            ParamsError::InvalidUrl(detail) => {
                tracing::debug!(%detail, "Unparseable request URL");
                Self::InvalidRequest("invalid request URL".to_owned())
            }
            other => Self::InvalidRequest(other.to_string()),
        }
    }
}

/// Failure to issue temporary credentials.
#[derive(Debug, thiserror::Error)]
pub enum IssueError {
    /// Generated token already exists; regenerate and retry.
    #[error("generated token collides with an existing credential")]
    Collision,

    /// Credential store failed.
    #[error("failed to persist temporary credentials")]
    Storage(#[source] StorageError),
}

impl From<StorageError> for IssueError {
    fn from(err: StorageError) -> Self {
        if err.is_already_exists() {
            Self::Collision
        } else {
            Self::Storage(err)
        }
    }
}
