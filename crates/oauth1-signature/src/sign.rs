//! Client-side signing of temporary credential requests.
//!
//! Produces the protocol parameters a client sends to the initiation
//! endpoint, either as an `Authorization` header or a form-encoded body.

use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

use base64::Engine;
use base64::prelude::BASE64_STANDARD;
use rsa::RsaPrivateKey;
use rsa::pkcs1v15::SigningKey;
use rsa::signature::{SignatureEncoding, Signer as _};
use sha1::Sha1;
use url::Url;
use url::form_urlencoded;

use crate::base_string::{normalize_base_url, signature_base_string};
use crate::encode::oauth_encode;
use crate::error::SignError;
use crate::method::{SignatureMethod, hmac_sha1, signing_key};
use crate::{
    OAUTH_CALLBACK, OAUTH_CONSUMER_KEY, OAUTH_NONCE, OAUTH_SIGNATURE, OAUTH_SIGNATURE_METHOD,
    OAUTH_TIMESTAMP, OAUTH_VERSION, OUT_OF_BAND,
};

/// Generate cryptographically random nonce (32 hex characters).
fn generate_nonce() -> String {
    let bytes: [u8; 16] = rand::random();
    hex::encode(bytes)
}

/// Current Unix timestamp in seconds.
fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

/// Signs temporary credential requests for one client.
///
/// Nonce and timestamp are generated per call unless fixed with
/// [`with_nonce`](Self::with_nonce) and [`with_timestamp`](Self::with_timestamp).
#[derive(Clone)]
pub struct RequestSigner<'a> {
    consumer_key: &'a str,
    method: SignatureMethod,
    secret: &'a str,
    private_key: Option<&'a RsaPrivateKey>,
    callback: &'a str,
    nonce: Option<&'a str>,
    timestamp: Option<u64>,
    include_version: bool,
}

impl<'a> RequestSigner<'a> {
    /// Create a signer using `oob` as the callback.
    pub fn new(consumer_key: &'a str, method: SignatureMethod) -> Self {
        Self {
            consumer_key,
            method,
            secret: "",
            private_key: None,
            callback: OUT_OF_BAND,
            nonce: None,
            timestamp: None,
            include_version: true,
        }
    }

    /// Shared secret for `PLAINTEXT` and `HMAC-SHA1`.
    #[must_use]
    pub fn with_secret(mut self, secret: &'a str) -> Self {
        self.secret = secret;
        self
    }

    /// Private key for `RSA-SHA1`.
    #[must_use]
    pub fn with_private_key(mut self, key: &'a RsaPrivateKey) -> Self {
        self.private_key = Some(key);
        self
    }

    /// Callback URI sent as `oauth_callback`.
    #[must_use]
    pub fn with_callback(mut self, callback: &'a str) -> Self {
        self.callback = callback;
        self
    }

    /// Fix the nonce instead of generating one.
    #[must_use]
    pub fn with_nonce(mut self, nonce: &'a str) -> Self {
        self.nonce = Some(nonce);
        self
    }

    /// Fix the timestamp instead of using the current time.
    #[must_use]
    pub fn with_timestamp(mut self, timestamp: u64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Omit the optional `oauth_version` parameter.
    #[must_use]
    pub fn without_version(mut self) -> Self {
        self.include_version = false;
        self
    }

    /// Compute the protocol parameters, `oauth_signature` included.
    ///
    /// # Arguments
    /// * `http_method` - HTTP method of the request
    /// * `url` - Absolute request URL; its query takes part in the signature
    /// * `body_params` - Form parameters that will be sent in the body
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or the method's key material
    /// is missing or unusable.
    pub fn sign(
        &self,
        http_method: &str,
        url: &str,
        body_params: &[(String, String)],
    ) -> Result<BTreeMap<String, String>, SignError> {
        let url = Url::parse(url)?;

        let mut oauth_params = BTreeMap::new();
        oauth_params.insert(OAUTH_CONSUMER_KEY.to_owned(), self.consumer_key.to_owned());
        oauth_params.insert(OAUTH_CALLBACK.to_owned(), self.callback.to_owned());
        oauth_params.insert(OAUTH_SIGNATURE_METHOD.to_owned(), self.method.name().to_owned());
        oauth_params.insert(
            OAUTH_NONCE.to_owned(),
            self.nonce.map_or_else(generate_nonce, str::to_owned),
        );
        oauth_params.insert(
            OAUTH_TIMESTAMP.to_owned(),
            self.timestamp.unwrap_or_else(current_timestamp).to_string(),
        );
        if self.include_version {
            oauth_params.insert(OAUTH_VERSION.to_owned(), "1.0".to_owned());
        }

        // Signature covers protocol, query and body parameters (RFC 5849 Section 3.4.1.3)
        let mut signature_params: Vec<(String, String)> = oauth_params
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        signature_params.extend(url.query_pairs().into_owned());
        signature_params.extend(body_params.iter().cloned());

        let base_string =
            signature_base_string(http_method, &normalize_base_url(&url), &signature_params);
        let signature = self.signature(&base_string)?;
        oauth_params.insert(OAUTH_SIGNATURE.to_owned(), signature);

        Ok(oauth_params)
    }

    fn signature(&self, base_string: &str) -> Result<String, SignError> {
        let key = signing_key(self.secret, "");
        match self.method {
            SignatureMethod::Plaintext => Ok(key),
            SignatureMethod::HmacSha1 => Ok(BASE64_STANDARD.encode(hmac_sha1(&key, base_string)?)),
            SignatureMethod::RsaSha1 => {
                let private_key = self.private_key.ok_or(SignError::MissingPrivateKey)?;
                let signing_key = SigningKey::<Sha1>::new(private_key.clone());
                let signature = signing_key.try_sign(base_string.as_bytes())?;
                Ok(BASE64_STANDARD.encode(signature.to_bytes()))
            }
        }
    }
}

/// Build OAuth Authorization header from signed protocol parameters.
pub fn authorization_header(oauth_params: &BTreeMap<String, String>, realm: Option<&str>) -> String {
    let realm = realm.map(|r| format!("realm=\"{}\"", oauth_encode(r)));
    let header_parts: Vec<String> = realm
        .into_iter()
        .chain(
            oauth_params
                .iter()
                .map(|(k, v)| format!("{}=\"{}\"", k, oauth_encode(v))),
        )
        .collect();
    format!("OAuth {}", header_parts.join(", "))
}

/// Build a form-encoded body carrying protocol and extra parameters.
pub fn form_body(oauth_params: &BTreeMap<String, String>, body_params: &[(String, String)]) -> String {
    form_urlencoded::Serializer::new(String::new())
        .extend_pairs(oauth_params)
        .extend_pairs(body_params.iter().map(|(k, v)| (k, v)))
        .finish()
}
