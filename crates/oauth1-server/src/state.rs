//! Application state.
//!
//! Shared state for all request handlers.

use std::sync::Arc;

use oauth1_initiate::Initiator;
use oauth1_storage::{CredentialStore, NonceStore};

/// Application state shared across all handlers.
pub(crate) struct AppState {
    /// Validates requests and issues temporary credentials.
    pub(crate) initiator: Arc<Initiator>,
    /// Nonce store, also purged by housekeeping.
    pub(crate) nonces: Arc<dyn NonceStore>,
    /// Credential store, also purged by housekeeping.
    pub(crate) credentials: Arc<dyn CredentialStore>,
    /// Route of the temporary credential endpoint.
    pub(crate) endpoint: String,
    /// External base URL without trailing slash.
    pub(crate) public_url: Option<String>,
    /// Realm advertised in `WWW-Authenticate`.
    pub(crate) realm: String,
}
