//! Temporary credential endpoint.
//!
//! Rebuilds the URL the client signed, hands the raw request to the
//! [`Initiator`](oauth1_initiate::Initiator) on the blocking pool, and
//! renders the outcome as a form-encoded body.

use std::sync::Arc;

use axum::Form;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE, HOST};
use axum::http::{HeaderMap, Method, Uri};
use axum::response::{IntoResponse, Response};
use oauth1_initiate::OAuthError;
use serde::Serialize;

use crate::error::Rejection;
use crate::state::AppState;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Response for a successful temporary credential request.
#[derive(Serialize)]
struct CredentialsResponse {
    oauth_token: String,
    oauth_token_secret: String,
    oauth_callback_confirmed: bool,
}

/// Handle `POST {endpoint}`.
pub(crate) async fn initiate(
    State(state): State<Arc<AppState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    match process(&state, &method, &uri, &headers, body).await {
        Ok(response) => Form(response).into_response(),
        Err(error) => Rejection {
            error,
            realm: state.realm.clone(),
        }
        .into_response(),
    }
}

async fn process(
    state: &AppState,
    method: &Method,
    uri: &Uri,
    headers: &HeaderMap,
    body: Bytes,
) -> Result<CredentialsResponse, OAuthError> {
    let url = request_url(state.public_url.as_deref(), uri, headers)?;
    let method = method.as_str().to_owned();
    let authorization = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);
    let form_body = is_form_encoded(headers).then_some(body);

    let initiator = Arc::clone(&state.initiator);
    let credential = tokio::task::spawn_blocking(move || {
        initiator.handle(&method, &url, authorization.as_deref(), form_body.as_deref())
    })
    .await
    .map_err(|e| {
        tracing::error!(error = %e, "Request validation task failed");
        OAuthError::TemporarilyUnavailable
    })??;

    Ok(CredentialsResponse {
        oauth_token: credential.token,
        oauth_token_secret: credential.token_secret,
        oauth_callback_confirmed: true,
    })
}

/// Absolute URL the client is expected to have signed.
///
/// Uses the configured public URL when set, otherwise `http://` plus the
/// `Host` header.
fn request_url(public_url: Option<&str>, uri: &Uri, headers: &HeaderMap) -> Result<String, OAuthError> {
    let path = uri.path_and_query().map_or("/", |pq| pq.as_str());

    if let Some(base) = public_url {
        return Ok(format!("{base}{path}"));
    }

    let host = headers
        .get(HOST)
        .and_then(|value| value.to_str().ok())
        .filter(|host| !host.is_empty())
        .ok_or_else(|| OAuthError::InvalidRequest("missing or invalid Host header".to_owned()))?;
    Ok(format!("http://{host}{path}"))
}

fn is_form_encoded(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .is_some_and(|mime| mime.trim().eq_ignore_ascii_case(FORM_CONTENT_TYPE))
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::header::{CACHE_CONTROL, WWW_AUTHENTICATE};
    use axum::http::{HeaderValue, Request, StatusCode};
    use oauth1_signature::SignatureMethod;
    use oauth1_signature::key::{load_private_key, load_public_key};
    use oauth1_signature::sign::{RequestSigner, authorization_header, form_body};
    use oauth1_storage::{Client, CredentialStore};
    use pretty_assertions::assert_eq;
    use tower::ServiceExt;

    use super::*;
    use crate::app::create_router;
    use crate::{ServerConfig, build_state};

    const PUBLIC_URL: &str = "https://auth.example.com";
    const ENDPOINT_URL: &str = "https://auth.example.com/oauth/initiate";

    fn config() -> ServerConfig {
        ServerConfig {
            public_url: Some(PUBLIC_URL.to_owned()),
            clients: vec![
                Client::new("client")
                    .with_secret("secret")
                    .with_default_callback("https://client.example.com/cb"),
            ],
            ..ServerConfig::default()
        }
    }

    fn app() -> (axum::Router, Arc<AppState>) {
        let state = build_state(&config());
        (create_router(Arc::clone(&state)), state)
    }

    fn post(authorization: Option<&str>, body: String) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/oauth/initiate")
            .header("host", "auth.example.com")
            .header("content-type", FORM_CONTENT_TYPE);
        if let Some(value) = authorization {
            builder = builder.header("authorization", value);
        }
        builder.body(Body::from(body)).unwrap()
    }

    async fn send(app: axum::Router, request: Request<Body>) -> (StatusCode, HeaderMap, Vec<(String, String)>) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let fields = serde_urlencoded::from_bytes(&body).unwrap();
        (status, headers, fields)
    }

    fn field<'a>(fields: &'a [(String, String)], name: &str) -> Option<&'a str> {
        fields
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    fn hmac_params(nonce: &str) -> std::collections::BTreeMap<String, String> {
        RequestSigner::new("client", SignatureMethod::HmacSha1)
            .with_secret("secret")
            .with_nonce(nonce)
            .sign("POST", ENDPOINT_URL, &[])
            .unwrap()
    }

    #[tokio::test]
    async fn test_issues_credentials_from_body() {
        let (app, state) = app();
        let body = form_body(&hmac_params("n1"), &[]);

        let (status, headers, fields) = send(app, post(None, body)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers.get(CONTENT_TYPE).unwrap(), FORM_CONTENT_TYPE);
        assert_eq!(headers.get(CACHE_CONTROL).unwrap(), "no-store");
        assert_eq!(field(&fields, "oauth_callback_confirmed"), Some("true"));
        let token = field(&fields, "oauth_token").unwrap();
        assert!(!field(&fields, "oauth_token_secret").unwrap().is_empty());
        let stored = state.credentials.find(token).unwrap().unwrap();
        assert_eq!(stored.client_id, "client");
        assert_eq!(stored.callback, "oob");
    }

    #[tokio::test]
    async fn test_issues_credentials_from_header() {
        let (app, _) = app();
        let header = authorization_header(&hmac_params("n1"), Some("oauth1"));

        let (status, _, fields) = send(app, post(Some(&header), String::new())).await;

        assert_eq!(status, StatusCode::OK);
        assert!(field(&fields, "oauth_token").is_some());
    }

    #[tokio::test]
    async fn test_plaintext_scenario() {
        let (app, _) = app();
        let params = RequestSigner::new("client", SignatureMethod::Plaintext)
            .with_secret("secret")
            .sign("POST", ENDPOINT_URL, &[])
            .unwrap();
        assert_eq!(params["oauth_signature"], "secret&");

        let (status, _, fields) = send(app, post(None, form_body(&params, &[]))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(field(&fields, "oauth_callback_confirmed"), Some("true"));
    }

    #[tokio::test]
    async fn test_literal_plaintext_without_timestamp() {
        let (app, _) = app();
        let body = "oauth_consumer_key=client&oauth_signature_method=PLAINTEXT&oauth_callback=oob&oauth_signature=secret%26";

        let (status, _, fields) = send(app.clone(), post(None, body.to_owned())).await;
        assert_eq!(status, StatusCode::OK);
        assert!(field(&fields, "oauth_token").is_some());

        let header = r#"OAuth oauth_consumer_key="client",oauth_signature_method="PLAINTEXT",oauth_callback="oob",oauth_signature="secret%26""#;
        let (status, _, fields) = send(app, post(Some(header), String::new())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(field(&fields, "oauth_callback_confirmed"), Some("true"));
    }

    #[tokio::test]
    async fn test_unparseable_host_hides_parser_detail() {
        let config = ServerConfig {
            public_url: None,
            ..config()
        };
        let app = create_router(build_state(&config));
        let request = Request::builder()
            .method("POST")
            .uri("/oauth/initiate")
            .header("host", "bad host")
            .header("content-type", FORM_CONTENT_TYPE)
            .body(Body::from(form_body(&hmac_params("n1"), &[])))
            .unwrap();

        let (status, _, fields) = send(app, request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(field(&fields, "error"), Some("invalid_request"));
        assert_eq!(field(&fields, "error_description"), Some("invalid request URL"));
    }

    #[tokio::test]
    async fn test_rsa_scenario() {
        let mut config = config();
        config.clients.push(
            Client::new("rsa-client")
                .with_rsa_public_key(load_public_key(include_bytes!("../../testdata/client.pub")).unwrap()),
        );
        let state = build_state(&config);
        let app = create_router(state);

        let private_key = load_private_key(include_bytes!("../../testdata/client.key")).unwrap();
        let params = RequestSigner::new("rsa-client", SignatureMethod::RsaSha1)
            .with_private_key(&private_key)
            .with_callback("https://client.example.com/cb")
            .sign("POST", ENDPOINT_URL, &[])
            .unwrap();
        let header = authorization_header(&params, None);

        let (status, _, fields) = send(app, post(Some(&header), String::new())).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(field(&fields, "oauth_callback_confirmed"), Some("true"));
    }

    #[tokio::test]
    async fn test_missing_consumer_key_reported_first() {
        let (app, _) = app();

        let (status, headers, fields) = send(app, post(None, String::new())).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(headers.get(WWW_AUTHENTICATE).is_none());
        assert_eq!(field(&fields, "error"), Some("missing_required_parameter"));
        assert_eq!(
            field(&fields, "error_description"),
            Some("missing \"oauth_consumer_key\" in parameters")
        );
    }

    #[tokio::test]
    async fn test_unknown_client_is_unauthorized() {
        let (app, _) = app();
        let body = "oauth_consumer_key=unknown&oauth_callback=oob".to_owned();

        let (status, headers, fields) = send(app, post(None, body)).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(
            headers.get(WWW_AUTHENTICATE).unwrap(),
            "OAuth realm=\"oauth1\""
        );
        assert_eq!(field(&fields, "error"), Some("invalid_client"));
    }

    #[tokio::test]
    async fn test_bad_signature_is_unauthorized() {
        let (app, _) = app();
        let mut params = hmac_params("n1");
        params.insert("oauth_signature".to_owned(), "forged".to_owned());

        let (status, _, fields) = send(app, post(None, form_body(&params, &[]))).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(field(&fields, "error"), Some("invalid_signature"));
    }

    #[tokio::test]
    async fn test_replay_rejected() {
        let (app, _) = app();
        let body = form_body(&hmac_params("n1"), &[]);

        let (first, _, _) = send(app.clone(), post(None, body.clone())).await;
        let (second, _, fields) = send(app, post(None, body)).await;

        assert_eq!(first, StatusCode::OK);
        assert_eq!(second, StatusCode::BAD_REQUEST);
        assert_eq!(field(&fields, "error"), Some("invalid_nonce"));
    }

    #[tokio::test]
    async fn test_body_ignored_without_form_content_type() {
        let (app, _) = app();
        let request = Request::builder()
            .method("POST")
            .uri("/oauth/initiate")
            .header("host", "auth.example.com")
            .header("content-type", "text/plain")
            .body(Body::from(form_body(&hmac_params("n1"), &[])))
            .unwrap();

        let (status, _, fields) = send(app, request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(field(&fields, "error"), Some("missing_required_parameter"));
    }

    #[tokio::test]
    async fn test_get_not_allowed() {
        let (app, _) = app();
        let request = Request::builder()
            .method("GET")
            .uri("/oauth/initiate")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[test]
    fn test_request_url_prefers_public_url() {
        let uri: Uri = "/oauth/initiate?x=1".parse().unwrap();
        let mut headers = HeaderMap::new();
        headers.insert(HOST, HeaderValue::from_static("internal:7980"));

        assert_eq!(
            request_url(Some(PUBLIC_URL), &uri, &headers).unwrap(),
            "https://auth.example.com/oauth/initiate?x=1"
        );
        assert_eq!(
            request_url(None, &uri, &headers).unwrap(),
            "http://internal:7980/oauth/initiate?x=1"
        );
    }

    #[test]
    fn test_request_url_requires_host() {
        let uri: Uri = "/oauth/initiate".parse().unwrap();

        let err = request_url(None, &uri, &HeaderMap::new()).unwrap_err();

        assert_eq!(err.code(), "invalid_request");
    }

    #[test]
    fn test_form_content_type_detection() {
        let mut headers = HeaderMap::new();
        assert!(!is_form_encoded(&headers));

        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("Application/X-WWW-Form-Urlencoded; charset=utf-8"),
        );
        assert!(is_form_encoded(&headers));

        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        assert!(!is_form_encoded(&headers));
    }
}
