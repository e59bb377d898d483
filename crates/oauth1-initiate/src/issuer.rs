//! Temporary credential generation.

use std::sync::Arc;

use oauth1_storage::memory::Clock;
use oauth1_storage::{Client, CredentialStore, TemporaryCredential, unix_now};

use crate::error::IssueError;

/// Generate a random token identifier (160 bits, 40 hex characters).
fn generate_token() -> String {
    let bytes: [u8; 20] = rand::random();
    hex::encode(bytes)
}

/// Generate a random token secret (256 bits, 64 hex characters).
fn generate_token_secret() -> String {
    let bytes: [u8; 32] = rand::random();
    hex::encode(bytes)
}

/// Issues and persists temporary credentials.
pub struct Issuer {
    credentials: Arc<dyn CredentialStore>,
    clock: Clock,
}

impl Issuer {
    /// Create an issuer persisting to `credentials`.
    pub fn new(credentials: Arc<dyn CredentialStore>) -> Self {
        Self {
            credentials,
            clock: Arc::new(unix_now),
        }
    }

    /// Replace the system clock.
    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Issue fresh credentials bound to `client` and `callback`.
    ///
    /// # Errors
    ///
    /// Returns [`IssueError::Collision`] if the generated token is taken,
    /// or [`IssueError::Storage`] if the store fails.
    pub fn issue(&self, client: &Client, callback: &str) -> Result<TemporaryCredential, IssueError> {
        let credential = TemporaryCredential {
            token: generate_token(),
            token_secret: generate_token_secret(),
            client_id: client.id.clone(),
            callback: callback.to_owned(),
            created_at: (self.clock)(),
            consumed: false,
        };
        self.credentials.save(&credential)?;
        Ok(credential)
    }
}
