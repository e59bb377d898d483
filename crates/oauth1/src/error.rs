//! CLI error types.

use oauth1_config::ConfigError;
use oauth1_server::ServerError;
use oauth1_signature::{KeyError, SignError};

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Server(#[from] ServerError),

    #[error("{0}")]
    Key(#[from] KeyError),

    #[error("{0}")]
    Sign(#[from] SignError),

    #[error("{0}")]
    Validation(String),
}
