//! In-memory reference backends.
//!
//! Suitable for a single process. Every store takes an injectable clock so
//! that expiry can be tested without sleeping.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::StorageError;
use crate::model::{Client, NonceCheck, TemporaryCredential};
use crate::store::{ClientRegistry, CredentialStore, NonceStore};

const BACKEND: &str = "Memory";

/// Source of the current time in seconds since Unix epoch.
pub type Clock = Arc<dyn Fn() -> u64 + Send + Sync>;

/// Current Unix time in seconds.
pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

fn system_clock() -> Clock {
    Arc::new(unix_now)
}

fn poisoned<T>(err: PoisonError<T>) -> StorageError {
    StorageError::unavailable(err.to_string()).with_backend(BACKEND)
}

/// Client registry backed by a fixed map.
#[derive(Debug, Default)]
pub struct MemoryClientRegistry {
    clients: HashMap<String, Client>,
}

impl MemoryClientRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a client, replacing any client with the same id.
    #[must_use]
    pub fn with_client(mut self, client: Client) -> Self {
        self.clients.insert(client.id.clone(), client);
        self
    }

    /// Number of registered clients.
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    /// Whether no client is registered.
    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

impl FromIterator<Client> for MemoryClientRegistry {
    fn from_iter<I: IntoIterator<Item = Client>>(iter: I) -> Self {
        iter.into_iter().fold(Self::new(), Self::with_client)
    }
}

impl ClientRegistry for MemoryClientRegistry {
    fn find_by_id(&self, id: &str) -> Result<Option<Client>, StorageError> {
        Ok(self.clients.get(id).cloned())
    }
}

/// Nonce store keeping every accepted triple until purged.
///
/// Timestamps further than `window` seconds from the clock are reported as
/// [`NonceCheck::Expired`] without touching the table.
pub struct MemoryNonceStore {
    window: u64,
    clock: Clock,
    seen: Mutex<HashSet<(String, u64, String)>>,
}

impl MemoryNonceStore {
    /// Create a store accepting timestamps within `window` seconds of now.
    #[must_use]
    pub fn new(window: u64) -> Self {
        Self {
            window,
            clock: system_clock(),
            seen: Mutex::new(HashSet::new()),
        }
    }

    /// Replace the system clock.
    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Number of recorded triples.
    pub fn len(&self) -> usize {
        self.seen.lock().map(|seen| seen.len()).unwrap_or_default()
    }

    /// Whether no triple is recorded.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl NonceStore for MemoryNonceStore {
    fn check_and_record(
        &self,
        client_id: &str,
        timestamp: u64,
        nonce: &str,
    ) -> Result<NonceCheck, StorageError> {
        let now = (self.clock)();
        if now.abs_diff(timestamp) > self.window {
            return Ok(NonceCheck::Expired);
        }

        let mut seen = self.seen.lock().map_err(poisoned)?;
        let inserted = seen.insert((client_id.to_owned(), timestamp, nonce.to_owned()));
        Ok(if inserted {
            NonceCheck::Accepted
        } else {
            NonceCheck::Replayed
        })
    }

    fn purge(&self, before: u64) -> Result<usize, StorageError> {
        let mut seen = self.seen.lock().map_err(poisoned)?;
        let count = seen.len();
        seen.retain(|(_, timestamp, _)| *timestamp >= before);
        let removed = count - seen.len();
        if removed > 0 {
            tracing::debug!(removed, before, "Purged nonce records");
        }
        Ok(removed)
    }
}

/// Credential store expiring records `ttl` seconds after issue.
pub struct MemoryCredentialStore {
    ttl: u64,
    clock: Clock,
    credentials: RwLock<HashMap<String, TemporaryCredential>>,
}

impl MemoryCredentialStore {
    /// Create a store whose credentials live for `ttl` seconds.
    #[must_use]
    pub fn new(ttl: u64) -> Self {
        Self {
            ttl,
            clock: system_clock(),
            credentials: RwLock::new(HashMap::new()),
        }
    }

    /// Replace the system clock.
    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    fn is_expired(&self, credential: &TemporaryCredential, now: u64) -> bool {
        credential.created_at.saturating_add(self.ttl) <= now
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn save(&self, credential: &TemporaryCredential) -> Result<(), StorageError> {
        let mut credentials = self.credentials.write().map_err(poisoned)?;
        if credentials.contains_key(&credential.token) {
            return Err(StorageError::already_exists(&credential.token).with_backend(BACKEND));
        }
        credentials.insert(credential.token.clone(), credential.clone());
        Ok(())
    }

    fn find(&self, token: &str) -> Result<Option<TemporaryCredential>, StorageError> {
        let now = (self.clock)();
        let credentials = self.credentials.read().map_err(poisoned)?;
        Ok(credentials
            .get(token)
            .filter(|c| !self.is_expired(c, now))
            .cloned())
    }

    fn purge_expired(&self) -> Result<usize, StorageError> {
        let now = (self.clock)();
        let mut credentials = self.credentials.write().map_err(poisoned)?;
        let count = credentials.len();
        credentials.retain(|_, c| !self.is_expired(c, now));
        let removed = count - credentials.len();
        if removed > 0 {
            tracing::debug!(removed, "Purged expired temporary credentials");
        }
        Ok(removed)
    }
}
