//! HTTP server for OAuth 1.0 temporary credential requests.
//!
//! Exposes a single `POST` endpoint (default `/oauth/initiate`) backed by an
//! [`Initiator`](oauth1_initiate::Initiator) over in-memory stores, plus a
//! background task that purges stale nonces and expired credentials.
//!
//! # Quick Start
//!
//! ```ignore
//! use oauth1_config::Config;
//! use oauth1_server::{run_server, server_config_from_config};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = Config::load(None, None).unwrap();
//!     let server_config = server_config_from_config(&config).unwrap();
//!     run_server(server_config).await.unwrap();
//! }
//! ```
//!
//! # Architecture
//!
//! ```text
//! Client ──POST──► axum router (oauth1-server)
//!                        │
//!                        ├─► handlers::initiate ──► Initiator (oauth1-initiate)
//!                        │                              ├─► ClientRegistry
//!                        │                              ├─► NonceStore
//!                        │                              └─► CredentialStore
//!                        │
//!                        └─► housekeeping (purges nonces and credentials)
//! ```

mod app;
mod error;
mod handlers;
mod housekeeping;
mod middleware;
mod state;

use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;

use oauth1_config::{ClientConfig, Config};
use oauth1_initiate::{Initiator, Policy};
use oauth1_signature::SignatureMethod;
use oauth1_signature::key::load_public_key_from_file;
use oauth1_storage::{
    Client, ClientRegistry, CredentialStore, MemoryClientRegistry, MemoryCredentialStore,
    MemoryNonceStore, NonceStore,
};
use state::AppState;

pub use error::ServerError;

/// Server configuration.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Host address to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Externally visible base URL used to rebuild signed request URLs.
    pub public_url: Option<String>,
    /// Path of the temporary credential endpoint.
    pub endpoint: String,
    /// Realm advertised in `WWW-Authenticate`.
    pub realm: String,
    /// Validation policy.
    pub policy: Policy,
    /// Seconds a nonce is remembered.
    pub nonce_retention: u64,
    /// Seconds an unused temporary credential stays valid.
    pub credential_ttl: u64,
    /// Seconds between housekeeping runs.
    pub purge_interval: u64,
    /// Registered clients.
    pub clients: Vec<Client>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 7980,
            public_url: None,
            endpoint: "/oauth/initiate".to_owned(),
            realm: "oauth1".to_owned(),
            policy: Policy::default(),
            nonce_retention: 600,
            credential_ttl: 900,
            purge_interval: 60,
            clients: Vec::new(),
        }
    }
}

/// Run the server.
///
/// # Arguments
///
/// * `config` - Server configuration
///
/// # Errors
///
/// Returns an error if the address is invalid or the server fails to start.
pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let state = build_state(&config);

    let purge = tokio::spawn(housekeeping::run(
        Arc::clone(&state.nonces),
        Arc::clone(&state.credentials),
        config.nonce_retention,
        config.purge_interval,
    ));

    let app = app::create_router(state);

    let addr = SocketAddr::from_str(&format!("{}:{}", config.host, config.port))?;
    tracing::info!(address = %addr, endpoint = %config.endpoint, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let result = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    purge.abort();
    result?;
    Ok(())
}

/// Wait for shutdown signal (Ctrl-C).
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, stopping server...");
}

/// Wire the in-memory stores and the initiator into shared handler state.
pub(crate) fn build_state(config: &ServerConfig) -> Arc<AppState> {
    let registry: Arc<dyn ClientRegistry> =
        Arc::new(config.clients.iter().cloned().collect::<MemoryClientRegistry>());
    let nonces: Arc<dyn NonceStore> = Arc::new(MemoryNonceStore::new(config.policy.timestamp_window));
    let credentials: Arc<dyn CredentialStore> =
        Arc::new(MemoryCredentialStore::new(config.credential_ttl));

    let initiator = Initiator::new(
        registry,
        Arc::clone(&nonces),
        Arc::clone(&credentials),
        config.policy.clone(),
    );

    Arc::new(AppState {
        initiator: Arc::new(initiator),
        nonces,
        credentials,
        endpoint: config.endpoint.clone(),
        public_url: config
            .public_url
            .as_deref()
            .map(|url| url.trim_end_matches('/').to_owned()),
        realm: config.realm.clone(),
    })
}

/// Create server configuration from a loaded [`Config`].
///
/// Reads every client's RSA public key from disk.
///
/// # Arguments
///
/// * `config` - Loaded and validated configuration
///
/// # Errors
///
/// Returns [`ServerError::ClientKey`] if a key cannot be loaded, or
/// [`ServerError::UnknownSignatureMethod`] for an unrecognized method name.
pub fn server_config_from_config(config: &Config) -> Result<ServerConfig, ServerError> {
    let signature_methods = config
        .policy
        .signature_methods
        .iter()
        .map(|name| {
            SignatureMethod::from_name(name)
                .ok_or_else(|| ServerError::UnknownSignatureMethod(name.clone()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let clients = config
        .clients
        .iter()
        .map(client_from_config)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ServerConfig {
        host: config.server.host.clone(),
        port: config.server.port,
        public_url: config.server.public_url.clone(),
        endpoint: config.server.endpoint.clone(),
        realm: config.server.realm.clone(),
        policy: Policy {
            timestamp_window: config.policy.timestamp_window,
            signature_methods,
            plaintext_skips_timestamp: config.policy.plaintext_skips_timestamp,
        },
        nonce_retention: config.policy.nonce_retention,
        credential_ttl: config.policy.credential_ttl,
        purge_interval: config.policy.purge_interval,
        clients,
    })
}

fn client_from_config(config: &ClientConfig) -> Result<Client, ServerError> {
    let mut client = Client::new(config.id.clone());
    if let Some(secret) = &config.secret {
        client = client.with_secret(secret.clone());
    }
    if let Some(path) = &config.rsa_public_key {
        let key = load_public_key_from_file(path).map_err(|source| ServerError::ClientKey {
            client: config.id.clone(),
            source,
        })?;
        client = client.with_rsa_public_key(key);
    }
    if let Some(callback) = &config.default_callback {
        client = client.with_default_callback(callback.clone());
    }
    Ok(client)
}
