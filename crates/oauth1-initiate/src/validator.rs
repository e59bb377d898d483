//! Temporary credential request validation.
//!
//! Checks run in a fixed order and the first failure is reported, so that
//! a client always learns about the earliest problem with its request:
//!
//! 1. `oauth_consumer_key` present
//! 2. `oauth_callback` present and either `oob` or an absolute URI
//! 3. client registered; no `oauth_token`; `oauth_version` is `1.0` if sent
//! 4. `oauth_timestamp` and `oauth_nonce` present
//! 5. `oauth_signature_method` present and enabled
//! 6. `oauth_signature` present and valid
//! 7. timestamp fresh and nonce unused
//!
//! Steps 4 and 7 are skipped for `PLAINTEXT` while
//! [`Policy::plaintext_skips_timestamp`] is set, which it is by default.

use std::sync::Arc;

use oauth1_signature::{
    ClientSecrets, OAUTH_CALLBACK, OAUTH_CONSUMER_KEY, OAUTH_NONCE, OAUTH_SIGNATURE,
    OAUTH_SIGNATURE_METHOD, OAUTH_TIMESTAMP, OAUTH_TOKEN, OAUTH_VERSION, OUT_OF_BAND,
    SignatureMethod, SignedRequest,
};
use oauth1_storage::memory::Clock;
use oauth1_storage::{Client, ClientRegistry, NonceCheck, NonceStore, unix_now};
use url::Url;

use crate::error::OAuthError;
use crate::policy::Policy;

/// Only protocol version defined by RFC 5849.
const SUPPORTED_VERSION: &str = "1.0";

/// Progress of a request through validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// Nothing checked yet.
    Start,
    /// Protocol parameters extracted from the request.
    ParamsExtracted,
    /// Callback present and well-formed.
    CallbackValidated,
    /// Client resolved and protocol parameters sane.
    ClientResolved,
    /// Signature method present and enabled.
    SignatureMethodChecked,
    /// Signature verified against the client's key material.
    SignatureVerified,
    /// Timestamp fresh and nonce recorded.
    NonceChecked,
    /// Temporary credentials issued.
    Issued,
}

/// Request that passed every check.
#[derive(Debug, Clone)]
pub struct ValidatedRequest {
    /// Authenticated client.
    pub client: Client,
    /// Callback exactly as supplied.
    pub callback: String,
    /// Signature method the request was verified with.
    pub method: SignatureMethod,
}

/// Validates temporary credential requests.
pub struct Validator {
    registry: Arc<dyn ClientRegistry>,
    nonces: Arc<dyn NonceStore>,
    policy: Policy,
    clock: Clock,
}

impl Validator {
    /// Create a validator over the given stores.
    pub fn new(registry: Arc<dyn ClientRegistry>, nonces: Arc<dyn NonceStore>, policy: Policy) -> Self {
        Self {
            registry,
            nonces,
            policy,
            clock: Arc::new(unix_now),
        }
    }

    /// Replace the system clock.
    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Active policy.
    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    /// Run every check against `request`.
    ///
    /// # Errors
    ///
    /// Returns the [`OAuthError`] of the first failing check.
    pub fn validate(&self, request: &SignedRequest) -> Result<ValidatedRequest, OAuthError> {
        let mut state = State::ParamsExtracted;
        let result = self.run(request, &mut state);
        match &result {
            Ok(validated) => {
                tracing::debug!(client_id = %validated.client.id, method = %validated.method, "Request validated");
            }
            Err(err) => {
                tracing::info!(
                    code = err.code(),
                    last_state = ?state,
                    consumer_key = request.get(OAUTH_CONSUMER_KEY).unwrap_or_default(),
                    "Rejected temporary credential request"
                );
            }
        }
        result
    }

    fn run(&self, request: &SignedRequest, state: &mut State) -> Result<ValidatedRequest, OAuthError> {
        let consumer_key = required(request, OAUTH_CONSUMER_KEY)?;
        let callback = validate_callback(request)?;
        *state = State::CallbackValidated;

        let client = resolve_client(self.registry.as_ref(), consumer_key)?;
        check_protocol_parameters(request)?;
        *state = State::ClientResolved;

        let check_freshness = !self
            .policy
            .skips_freshness(request.get(OAUTH_SIGNATURE_METHOD));
        if check_freshness {
            required(request, OAUTH_TIMESTAMP)?;
            required(request, OAUTH_NONCE)?;
        }

        let method = check_signature_method(request, &self.policy)?;
        *state = State::SignatureMethodChecked;

        verify_signature(request, &client, method)?;
        *state = State::SignatureVerified;

        if check_freshness {
            self.check_nonce(request, &client.id)?;
        }
        *state = State::NonceChecked;

        Ok(ValidatedRequest {
            client,
            callback: callback.to_owned(),
            method,
        })
    }

    fn check_nonce(&self, request: &SignedRequest, client_id: &str) -> Result<(), OAuthError> {
        let raw = required(request, OAUTH_TIMESTAMP)?;
        let nonce = required(request, OAUTH_NONCE)?;
        let timestamp: i64 = raw
            .parse()
            .map_err(|_| OAuthError::invalid_parameter(OAUTH_TIMESTAMP))?;
        let timestamp = u64::try_from(timestamp).map_err(|_| OAuthError::InvalidTimestamp)?;

        let now = (self.clock)();
        if now.abs_diff(timestamp) > self.policy.timestamp_window {
            tracing::debug!(timestamp, now, "Timestamp outside window");
            return Err(OAuthError::InvalidTimestamp);
        }

        match self.nonces.check_and_record(client_id, timestamp, nonce) {
            Ok(NonceCheck::Accepted) => Ok(()),
            Ok(NonceCheck::Replayed) => Err(OAuthError::InvalidNonce),
            Ok(NonceCheck::Expired) => Err(OAuthError::InvalidTimestamp),
            Err(e) => {
                tracing::error!(error = %e, "Nonce store failure");
                Err(OAuthError::TemporarilyUnavailable)
            }
        }
    }
}

/// Resolve `consumer_key` to a registered client.
///
/// # Errors
///
/// Returns [`OAuthError::InvalidClient`] for unknown keys and
/// [`OAuthError::TemporarilyUnavailable`] if the registry fails.
pub fn resolve_client(registry: &dyn ClientRegistry, consumer_key: &str) -> Result<Client, OAuthError> {
    match registry.find_by_id(consumer_key) {
        Ok(Some(client)) => Ok(client),
        Ok(None) => Err(OAuthError::InvalidClient),
        Err(e) => {
            tracing::error!(error = %e, "Client registry failure");
            Err(OAuthError::TemporarilyUnavailable)
        }
    }
}

fn required<'a>(request: &'a SignedRequest, name: &'static str) -> Result<&'a str, OAuthError> {
    request.get(name).ok_or(OAuthError::MissingParameter(name))
}

fn validate_callback(request: &SignedRequest) -> Result<&str, OAuthError> {
    let callback = required(request, OAUTH_CALLBACK)?;
    if callback == OUT_OF_BAND {
        return Ok(callback);
    }
    match Url::parse(callback) {
        Ok(url) if url.has_host() => Ok(callback),
        _ => Err(OAuthError::invalid_parameter(OAUTH_CALLBACK)),
    }
}

fn check_protocol_parameters(request: &SignedRequest) -> Result<(), OAuthError> {
    // No token exists yet when requesting temporary credentials
    if request.get(OAUTH_TOKEN).is_some() {
        return Err(OAuthError::invalid_parameter(OAUTH_TOKEN));
    }
    match request.get(OAUTH_VERSION) {
        Some(version) if version != SUPPORTED_VERSION => {
            Err(OAuthError::invalid_parameter(OAUTH_VERSION))
        }
        _ => Ok(()),
    }
}

fn check_signature_method(request: &SignedRequest, policy: &Policy) -> Result<SignatureMethod, OAuthError> {
    let name = required(request, OAUTH_SIGNATURE_METHOD)?;
    SignatureMethod::from_name(name)
        .filter(|method| policy.allows(*method))
        .ok_or_else(|| OAuthError::UnsupportedSignatureMethod(name.to_owned()))
}

fn verify_signature(request: &SignedRequest, client: &Client, method: SignatureMethod) -> Result<(), OAuthError> {
    let signature = required(request, OAUTH_SIGNATURE)?;
    let secrets = ClientSecrets {
        secret: client.secret.as_deref(),
        rsa_public_key: client.rsa_public_key.as_ref(),
    };
    if method.verify(request, &secrets, signature) {
        Ok(())
    } else {
        Err(OAuthError::InvalidSignature)
    }
}
