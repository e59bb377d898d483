//! Storage abstraction for the OAuth 1.0 temporary credential endpoint.
//!
//! The endpoint consults three collaborators, each behind a trait so that
//! durable backends can be plugged in:
//!
//! - [`ClientRegistry`] resolves `oauth_consumer_key` to a [`Client`]
//! - [`NonceStore`] rejects replayed `(client, timestamp, nonce)` triples
//! - [`CredentialStore`] persists issued [`TemporaryCredential`]s
//!
//! In-memory implementations of all three live in [`memory`].
//!
//! # Example
//!
//! ```
//! use oauth1_storage::{ClientRegistry, Client, MemoryClientRegistry};
//!
//! let registry = MemoryClientRegistry::new().with_client(Client::new("client").with_secret("s"));
//! assert!(registry.find_by_id("client").unwrap().is_some());
//! ```

mod error;
pub mod memory;
mod model;
mod store;

pub use error::{StorageError, StorageErrorKind};
pub use memory::{MemoryClientRegistry, MemoryCredentialStore, MemoryNonceStore, unix_now};
pub use model::{Client, NonceCheck, TemporaryCredential};
pub use store::{ClientRegistry, CredentialStore, NonceStore};
