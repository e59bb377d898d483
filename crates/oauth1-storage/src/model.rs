//! Records kept by the stores.

use std::fmt;

use oauth1_signature::OUT_OF_BAND;
use rsa::RsaPublicKey;

/// Registered client (consumer).
///
/// Built with [`Client::new`] and the `with_*` methods. At least one of the
/// shared secret or the RSA public key is expected to be set.
#[derive(Clone, PartialEq, Eq)]
pub struct Client {
    /// Unique client identifier (`oauth_consumer_key`).
    pub id: String,
    /// Shared secret for `PLAINTEXT` and `HMAC-SHA1`.
    pub secret: Option<String>,
    /// Public key for `RSA-SHA1`.
    pub rsa_public_key: Option<RsaPublicKey>,
    /// Redirect target used when the client requests `oob`.
    pub default_callback: Option<String>,
}

impl Client {
    /// Create a client without key material.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            secret: None,
            rsa_public_key: None,
            default_callback: None,
        }
    }

    /// Set the shared secret.
    #[must_use]
    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        self.secret = Some(secret.into());
        self
    }

    /// Set the RSA public key.
    #[must_use]
    pub fn with_rsa_public_key(mut self, key: RsaPublicKey) -> Self {
        self.rsa_public_key = Some(key);
        self
    }

    /// Set the default callback.
    #[must_use]
    pub fn with_default_callback(mut self, callback: impl Into<String>) -> Self {
        self.default_callback = Some(callback.into());
        self
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("id", &self.id)
            .field("secret", &self.secret.as_ref().map(|_| "<redacted>"))
            .field("rsa_public_key", &self.rsa_public_key.is_some())
            .field("default_callback", &self.default_callback)
            .finish()
    }
}

/// Temporary credentials ("request token") issued to a client.
#[derive(Clone, PartialEq, Eq)]
pub struct TemporaryCredential {
    /// Token identifier (`oauth_token`).
    pub token: String,
    /// Token secret (`oauth_token_secret`).
    pub token_secret: String,
    /// Client the credential was issued to.
    pub client_id: String,
    /// Callback exactly as supplied: `oob` or an absolute URI.
    pub callback: String,
    /// Issue time, seconds since Unix epoch.
    pub created_at: u64,
    /// Set once the credential has been exchanged.
    pub consumed: bool,
}

impl TemporaryCredential {
    /// Whether the client asked for out-of-band verifier delivery.
    pub fn is_out_of_band(&self) -> bool {
        self.callback == OUT_OF_BAND
    }

    /// Where to send the user after authorization.
    ///
    /// `oob` resolves to the client's default callback, if any.
    pub fn redirect_uri<'a>(&'a self, client: &'a Client) -> Option<&'a str> {
        if self.is_out_of_band() {
            client.default_callback.as_deref()
        } else {
            Some(&self.callback)
        }
    }
}

impl fmt::Debug for TemporaryCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemporaryCredential")
            .field("token", &self.token)
            .field("token_secret", &"<redacted>")
            .field("client_id", &self.client_id)
            .field("callback", &self.callback)
            .field("created_at", &self.created_at)
            .field("consumed", &self.consumed)
            .finish()
    }
}

/// Outcome of recording a nonce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NonceCheck {
    /// First use of the triple; it is now recorded.
    Accepted,
    /// The `(client, timestamp, nonce)` triple was seen before.
    Replayed,
    /// Timestamp outside the accepted window; nothing recorded.
    Expired,
}
