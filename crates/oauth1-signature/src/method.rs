//! Signature methods (RFC 5849 Section 3.4).

use std::fmt;

use base64::Engine;
use base64::prelude::BASE64_STANDARD;
use hmac::digest::InvalidLength;
use hmac::{Hmac, Mac};
use rsa::RsaPublicKey;
use rsa::pkcs1v15::{Signature, VerifyingKey};
use rsa::signature::Verifier;
use sha1::Sha1;
use subtle::ConstantTimeEq;

use crate::encode::oauth_encode;
use crate::params::SignedRequest;

type HmacSha1 = Hmac<Sha1>;

/// Key material of the client whose signature is being verified.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClientSecrets<'a> {
    /// Shared secret for `PLAINTEXT` and `HMAC-SHA1`.
    pub secret: Option<&'a str>,
    /// Registered public key for `RSA-SHA1`.
    pub rsa_public_key: Option<&'a RsaPublicKey>,
}

/// Supported signature methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignatureMethod {
    /// `PLAINTEXT` (RFC 5849 Section 3.4.4).
    Plaintext,
    /// `HMAC-SHA1` (RFC 5849 Section 3.4.2).
    HmacSha1,
    /// `RSA-SHA1` (RFC 5849 Section 3.4.3).
    RsaSha1,
}

impl SignatureMethod {
    /// Every supported method.
    pub const ALL: [Self; 3] = [Self::Plaintext, Self::HmacSha1, Self::RsaSha1];

    /// Look up a method by its `oauth_signature_method` value.
    ///
    /// Matching is case-sensitive.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.name() == name)
    }

    /// Protocol name of the method.
    pub fn name(self) -> &'static str {
        match self {
            Self::Plaintext => "PLAINTEXT",
            Self::HmacSha1 => "HMAC-SHA1",
            Self::RsaSha1 => "RSA-SHA1",
        }
    }

    /// Verify `signature` for `request` using the client's key material.
    ///
    /// No token has been issued when temporary credentials are requested,
    /// so the token secret is always empty here. Any failure (missing key
    /// material, malformed encoding, mismatch) yields `false`.
    pub fn verify(self, request: &SignedRequest, secrets: &ClientSecrets<'_>, signature: &str) -> bool {
        let verified = match self {
            Self::Plaintext => verify_plaintext(secrets.secret, signature),
            Self::HmacSha1 => verify_hmac_sha1(&request.base_string(), secrets.secret, signature),
            Self::RsaSha1 => {
                verify_rsa_sha1(&request.base_string(), secrets.rsa_public_key, signature)
            }
        };
        if !verified {
            tracing::debug!(method = self.name(), "Signature verification failed");
        }
        verified
    }
}

impl fmt::Display for SignatureMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Key shared by `PLAINTEXT` and `HMAC-SHA1`: `encode(client) & encode(token)`.
pub(crate) fn signing_key(client_secret: &str, token_secret: &str) -> String {
    format!(
        "{}&{}",
        oauth_encode(client_secret),
        oauth_encode(token_secret)
    )
}

/// Compute the raw `HMAC-SHA1` digest of `base_string`.
pub(crate) fn hmac_sha1(key: &str, base_string: &str) -> Result<Vec<u8>, InvalidLength> {
    let mut mac = HmacSha1::new_from_slice(key.as_bytes())?;
    mac.update(base_string.as_bytes());
    Ok(mac.finalize().into_bytes().to_vec())
}

fn verify_plaintext(secret: Option<&str>, signature: &str) -> bool {
    let Some(secret) = secret else {
        tracing::debug!("Client has no shared secret");
        return false;
    };
    let expected = signing_key(secret, "");
    expected.as_bytes().ct_eq(signature.as_bytes()).into()
}

fn verify_hmac_sha1(base_string: &str, secret: Option<&str>, signature: &str) -> bool {
    let Some(secret) = secret else {
        tracing::debug!("Client has no shared secret");
        return false;
    };
    let Ok(supplied) = BASE64_STANDARD.decode(signature) else {
        tracing::debug!("Signature is not valid base64");
        return false;
    };
    let Ok(expected) = hmac_sha1(&signing_key(secret, ""), base_string) else {
        return false;
    };
    expected.as_slice().ct_eq(supplied.as_slice()).into()
}

fn verify_rsa_sha1(base_string: &str, key: Option<&RsaPublicKey>, signature: &str) -> bool {
    let Some(key) = key else {
        tracing::debug!("Client has no registered RSA public key");
        return false;
    };
    let Ok(supplied) = BASE64_STANDARD.decode(signature) else {
        tracing::debug!("Signature is not valid base64");
        return false;
    };
    let Ok(supplied) = Signature::try_from(supplied.as_slice()) else {
        return false;
    };
    VerifyingKey::<Sha1>::new(key.clone())
        .verify(base_string.as_bytes(), &supplied)
        .is_ok()
}
