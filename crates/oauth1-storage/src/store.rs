//! Store traits consumed by the temporary credential endpoint.
//!
//! All traits are synchronous and `Send + Sync` so that a single instance
//! can be shared across request handlers as `Arc<dyn Trait>`.

use crate::error::StorageError;
use crate::model::{Client, NonceCheck, TemporaryCredential};

/// Lookup of registered clients.
pub trait ClientRegistry: Send + Sync {
    /// Find a client by its identifier.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(client))` - Client is registered
    /// - `Ok(None)` - No client with this identifier
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the backend cannot be queried.
    fn find_by_id(&self, id: &str) -> Result<Option<Client>, StorageError>;
}

/// Replay protection for `(client, timestamp, nonce)` triples.
pub trait NonceStore: Send + Sync {
    /// Atomically check whether the triple was seen and record it if not.
    ///
    /// Two concurrent calls with the same triple must never both return
    /// [`NonceCheck::Accepted`].
    ///
    /// # Arguments
    ///
    /// * `client_id` - Client the nonce belongs to
    /// * `timestamp` - `oauth_timestamp` as seconds since Unix epoch
    /// * `nonce` - `oauth_nonce` value
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the backend cannot be queried.
    fn check_and_record(
        &self,
        client_id: &str,
        timestamp: u64,
        nonce: &str,
    ) -> Result<NonceCheck, StorageError>;

    /// Drop records with a timestamp older than `before`.
    ///
    /// Returns the number of records removed.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the backend cannot be queried.
    fn purge(&self, before: u64) -> Result<usize, StorageError>;
}

/// Persistence of issued temporary credentials.
pub trait CredentialStore: Send + Sync {
    /// Persist a newly issued credential.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] with kind
    /// [`AlreadyExists`](crate::StorageErrorKind::AlreadyExists) if the token
    /// is already taken, or another kind if the backend fails.
    fn save(&self, credential: &TemporaryCredential) -> Result<(), StorageError>;

    /// Find an unexpired credential by token.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the backend cannot be queried.
    fn find(&self, token: &str) -> Result<Option<TemporaryCredential>, StorageError>;

    /// Remove expired credentials, returning how many were dropped.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the backend cannot be queried.
    fn purge_expired(&self) -> Result<usize, StorageError>;
}
