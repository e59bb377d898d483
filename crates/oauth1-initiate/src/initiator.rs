//! End-to-end handling of temporary credential requests.

use std::sync::Arc;

use oauth1_signature::{SignedRequest, extract};
use oauth1_storage::memory::Clock;
use oauth1_storage::{ClientRegistry, CredentialStore, NonceStore, TemporaryCredential};

use crate::error::{IssueError, OAuthError};
use crate::issuer::Issuer;
use crate::policy::Policy;
use crate::validator::{State, ValidatedRequest, Validator};

/// Attempts to issue credentials before giving up on token collisions.
const MAX_ISSUE_ATTEMPTS: usize = 3;

/// Validates temporary credential requests and issues credentials.
///
/// Stateless apart from the injected stores, so one instance can be shared
/// across request handlers.
pub struct Initiator {
    validator: Validator,
    issuer: Issuer,
}

impl Initiator {
    /// Create an initiator over the given stores.
    pub fn new(
        registry: Arc<dyn ClientRegistry>,
        nonces: Arc<dyn NonceStore>,
        credentials: Arc<dyn CredentialStore>,
        policy: Policy,
    ) -> Self {
        Self {
            validator: Validator::new(registry, nonces, policy),
            issuer: Issuer::new(credentials),
        }
    }

    /// Replace the system clock used for freshness checks and issue times.
    #[must_use]
    pub fn with_clock(self, clock: Clock) -> Self {
        Self {
            validator: self.validator.with_clock(Arc::clone(&clock)),
            issuer: self.issuer.with_clock(clock),
        }
    }

    /// Active policy.
    pub fn policy(&self) -> &Policy {
        self.validator.policy()
    }

    /// Handle a raw request.
    ///
    /// # Arguments
    /// * `method` - HTTP method
    /// * `url` - Absolute request URL as seen by the client
    /// * `authorization` - `Authorization` header value, if any
    /// * `form_body` - Body bytes when the content type is form-encoded
    ///
    /// # Errors
    ///
    /// Returns the [`OAuthError`] describing why the request was rejected.
    pub fn handle(
        &self,
        method: &str,
        url: &str,
        authorization: Option<&str>,
        form_body: Option<&[u8]>,
    ) -> Result<TemporaryCredential, OAuthError> {
        let request = extract(method, url, authorization, form_body).map_err(|e| {
            tracing::info!(error = %e, last_state = ?State::Start, "Rejected temporary credential request");
            OAuthError::from(e)
        })?;
        self.initiate(&request)
    }

    /// Validate an extracted request and issue credentials.
    ///
    /// # Errors
    ///
    /// Returns the [`OAuthError`] describing why the request was rejected.
    pub fn initiate(&self, request: &SignedRequest) -> Result<TemporaryCredential, OAuthError> {
        let validated = self.validator.validate(request)?;
        self.issue(&validated)
    }

    fn issue(&self, validated: &ValidatedRequest) -> Result<TemporaryCredential, OAuthError> {
        for attempt in 1..=MAX_ISSUE_ATTEMPTS {
            match self.issuer.issue(&validated.client, &validated.callback) {
                Ok(credential) => {
                    tracing::info!(
                        client_id = %credential.client_id,
                        token = %credential.token,
                        state = ?State::Issued,
                        "Issued temporary credentials"
                    );
                    return Ok(credential);
                }
                Err(IssueError::Collision) => {
                    tracing::warn!(attempt, "Token collision, regenerating");
                }
                Err(e @ IssueError::Storage(_)) => {
                    tracing::error!(error = %e, "Credential store failure");
                    return Err(OAuthError::TemporarilyUnavailable);
                }
            }
        }
        tracing::error!(attempts = MAX_ISSUE_ATTEMPTS, "Giving up after repeated token collisions");
        Err(OAuthError::TemporarilyUnavailable)
    }
}
