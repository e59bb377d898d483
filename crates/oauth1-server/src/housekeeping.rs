//! Periodic purging of stale nonces and expired credentials.

use std::sync::Arc;
use std::time::Duration;

use oauth1_storage::{CredentialStore, NonceStore, unix_now};
use tokio::time::MissedTickBehavior;

/// Purge both stores every `interval` seconds, forever.
pub(crate) async fn run(
    nonces: Arc<dyn NonceStore>,
    credentials: Arc<dyn CredentialStore>,
    nonce_retention: u64,
    interval: u64,
) {
    let mut ticker = tokio::time::interval(Duration::from_secs(interval));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        purge(
            nonces.as_ref(),
            credentials.as_ref(),
            unix_now().saturating_sub(nonce_retention),
        );
    }
}

/// Drop nonces recorded before `nonce_cutoff` and expired credentials.
pub(crate) fn purge(nonces: &dyn NonceStore, credentials: &dyn CredentialStore, nonce_cutoff: u64) {
    if let Err(e) = nonces.purge(nonce_cutoff) {
        tracing::error!(error = %e, "Failed to purge nonces");
    }
    if let Err(e) = credentials.purge_expired() {
        tracing::error!(error = %e, "Failed to purge temporary credentials");
    }
}
