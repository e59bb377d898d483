//! Validation policy.

use oauth1_signature::SignatureMethod;

/// Default accepted clock skew in seconds.
pub const DEFAULT_TIMESTAMP_WINDOW: u64 = 300;

/// Tunable rules applied by the [`Validator`](crate::Validator).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Policy {
    /// Maximum distance in seconds between `oauth_timestamp` and now.
    pub timestamp_window: u64,
    /// Signature methods accepted from clients.
    pub signature_methods: Vec<SignatureMethod>,
    /// Skip timestamp and nonce checks for `PLAINTEXT` (RFC 5849 Section 3.3).
    pub plaintext_skips_timestamp: bool,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            timestamp_window: DEFAULT_TIMESTAMP_WINDOW,
            signature_methods: SignatureMethod::ALL.to_vec(),
            plaintext_skips_timestamp: true,
        }
    }
}

impl Policy {
    /// Whether `method` is enabled.
    pub fn allows(&self, method: SignatureMethod) -> bool {
        self.signature_methods.contains(&method)
    }

    /// Whether timestamp and nonce checks are skipped for the declared method.
    pub(crate) fn skips_freshness(&self, declared_method: Option<&str>) -> bool {
        self.plaintext_skips_timestamp
            && declared_method == Some(SignatureMethod::Plaintext.name())
    }
}
