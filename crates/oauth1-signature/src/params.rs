//! Protocol parameter extraction (RFC 5849 Section 3.5).
//!
//! OAuth parameters are taken from exactly one place: the `Authorization`
//! header when it carries a well-formed `OAuth` credential, otherwise the
//! form-encoded body. The two sources are never merged. Independently of
//! where the protocol parameters come from, every request parameter except
//! `oauth_signature` (and the header `realm`) takes part in the signature
//! base string.

use std::collections::BTreeMap;

use url::Url;

use crate::base_string::{normalize_base_url, signature_base_string};
use crate::encode::oauth_decode;
use crate::error::ParamsError;
use crate::OAUTH_SIGNATURE;

/// Authentication scope parameter, excluded from the base string.
const REALM: &str = "realm";

/// Prefix shared by all protocol parameters.
const OAUTH_PREFIX: &str = "oauth_";

/// Where the protocol parameters of a request were read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamSource {
    /// `Authorization: OAuth ...` header.
    Header,
    /// `application/x-www-form-urlencoded` body.
    Body,
}

/// Request with its protocol parameters extracted and normalized.
#[derive(Debug, Clone)]
pub struct SignedRequest {
    method: String,
    base_url: String,
    source: ParamSource,
    oauth_params: BTreeMap<String, String>,
    signature_params: Vec<(String, String)>,
}

impl SignedRequest {
    /// Uppercase HTTP method.
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Base string URI (scheme, authority and path).
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Source of the protocol parameters.
    pub fn source(&self) -> ParamSource {
        self.source
    }

    /// Look up a protocol parameter.
    ///
    /// Empty values are reported as absent.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.oauth_params
            .get(name)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    /// All protocol parameters from the selected source.
    pub fn oauth_params(&self) -> &BTreeMap<String, String> {
        &self.oauth_params
    }

    /// Parameters covered by the signature, `oauth_signature` excluded.
    pub fn signature_params(&self) -> &[(String, String)] {
        &self.signature_params
    }

    /// Signature base string for this request.
    pub fn base_string(&self) -> String {
        signature_base_string(&self.method, &self.base_url, &self.signature_params)
    }
}

/// Parse an `Authorization` header value carrying OAuth credentials.
///
/// Returns `None` when the scheme is not `OAuth` or the parameter list is
/// malformed, so that callers can fall back to the request body.
pub fn parse_authorization_header(value: &str) -> Option<Vec<(String, String)>> {
    let (scheme, rest) = value.trim().split_once(char::is_whitespace)?;
    if !scheme.eq_ignore_ascii_case("OAuth") {
        return None;
    }

    let mut params = Vec::new();
    for part in rest.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let (key, value) = part.split_once('=')?;
        let value = value.trim().strip_prefix('"')?.strip_suffix('"')?;
        params.push((oauth_decode(key.trim())?, oauth_decode(value)?));
    }

    if params.is_empty() {
        return None;
    }
    Some(params)
}

/// Extract OAuth parameters from a request.
///
/// # Arguments
/// * `method` - HTTP method
/// * `url` - Absolute request URL including the query string
/// * `authorization` - `Authorization` header value, if any
/// * `form_body` - Body bytes when the content type is form-encoded
///
/// Missing parameters are not an error here; only malformed input is.
pub fn extract(
    method: &str,
    url: &str,
    authorization: Option<&str>,
    form_body: Option<&[u8]>,
) -> Result<SignedRequest, ParamsError> {
    let url = Url::parse(url).map_err(|e| ParamsError::InvalidUrl(e.to_string()))?;
    let query: Vec<(String, String)> = url.query_pairs().into_owned().collect();
    let body: Vec<(String, String)> = match form_body {
        Some(bytes) => serde_urlencoded::from_bytes(bytes).map_err(|_| ParamsError::MalformedBody)?,
        None => Vec::new(),
    };

    let header = authorization.and_then(|value| {
        let parsed = parse_authorization_header(value);
        if parsed.is_none() {
            tracing::debug!("Ignoring Authorization header without OAuth credentials");
        }
        parsed
    });

    let (source, protocol): (ParamSource, Vec<(String, String)>) = match header {
        Some(params) => (
            ParamSource::Header,
            params.into_iter().filter(|(k, _)| k != REALM).collect(),
        ),
        None => (
            ParamSource::Body,
            body.iter()
                .filter(|(k, _)| k.starts_with(OAUTH_PREFIX))
                .cloned()
                .collect(),
        ),
    };

    let mut oauth_params = BTreeMap::new();
    for (key, value) in &protocol {
        if oauth_params.insert(key.clone(), value.clone()).is_some() {
            return Err(ParamsError::DuplicateParameter(key.clone()));
        }
    }

    // Body protocol parameters are already part of `body`
    let mut signature_params = match source {
        ParamSource::Header => protocol,
        ParamSource::Body => Vec::new(),
    };
    signature_params.extend(query);
    signature_params.extend(body);
    signature_params.retain(|(k, _)| k != OAUTH_SIGNATURE);

    Ok(SignedRequest {
        method: method.to_uppercase(),
        base_url: normalize_base_url(&url),
        source,
        oauth_params,
        signature_params,
    })
}
