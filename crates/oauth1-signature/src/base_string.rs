//! Signature base string construction (RFC 5849 Section 3.4.1).

use url::Url;

use crate::encode::oauth_encode;

/// Normalize a request URL into the base string URI.
///
/// Scheme and host are lowercased, the default port is dropped and the
/// query and fragment are excluded (RFC 5849 Section 3.4.1.2).
pub fn normalize_base_url(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default().to_ascii_lowercase();
    // `Url::port` is None when the port is the scheme default
    let port = url.port().map(|p| format!(":{p}")).unwrap_or_default();
    let path = if url.path().is_empty() { "/" } else { url.path() };
    format!("{}://{host}{port}{path}", url.scheme())
}

/// Normalize request parameters (RFC 5849 Section 3.4.1.3.2).
///
/// Names and values are encoded, sorted by name then value, and joined
/// as `name=value` pairs separated by `&`.
pub fn normalize_parameters(params: &[(String, String)]) -> String {
    let mut encoded: Vec<(String, String)> = params
        .iter()
        .map(|(k, v)| (oauth_encode(k), oauth_encode(v)))
        .collect();
    encoded.sort();

    encoded
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&")
}

/// Build OAuth signature base string.
///
/// Format: `HTTP_METHOD&encoded_base_url&encoded_parameters`
pub fn signature_base_string(method: &str, base_url: &str, params: &[(String, String)]) -> String {
    format!(
        "{}&{}&{}",
        method.to_uppercase(),
        oauth_encode(base_url),
        oauth_encode(&normalize_parameters(params))
    )
}
