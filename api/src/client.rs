use crate::storage::SessionStorage;
use log::{debug, warn};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Client, Method, StatusCode, Url};
use serde_json::Value;
use std::fmt;
use std::sync::{Arc, RwLock};
use std::time::Duration;

pub type ApiResult<T> = Result<T, ApiError>;

pub const DEFAULT_API_URL: &str = "https://api.tourneyfund.app/api";
pub const FALLBACK_MESSAGE: &str = "Something went wrong. Please try again.";

/// Gateway to the fundraiser REST backend. Every resource service goes
/// through [`FundApi::send`], which attaches credentials and reacts to 401s.
#[derive(Debug, Clone)]
pub struct FundApi {
    client: Client,
    base_url: String,
    storage: SessionStorage,
    default_authorization: Arc<RwLock<Option<String>>>,
    timeout: Option<Duration>,
}

#[derive(Debug)]
pub enum ApiError {
    Network(reqwest::Error, String),
    Api {
        status: u16,
        message: Option<String>,
        url: String,
    },
    Unauthorized {
        message: Option<String>,
        url: String,
    },
    Parsing(String, String),
    Storage(String),
    Other(String),
}

impl ApiError {
    /// Human-readable message: what the server said, else what the
    /// transport said, else a fixed fallback.
    pub fn message(&self) -> String {
        match self {
            ApiError::Api { message: Some(m), .. } | ApiError::Unauthorized { message: Some(m), .. } => {
                m.clone()
            }
            ApiError::Api { status, .. } => format!("Request failed with status code {status}"),
            ApiError::Unauthorized { .. } => "Your session has expired. Please log in again.".into(),
            ApiError::Network(e, _) => {
                let text = e.to_string();
                if text.trim().is_empty() { FALLBACK_MESSAGE.to_owned() } else { text }
            }
            ApiError::Parsing(..) => "Unexpected response from server".into(),
            ApiError::Storage(m) | ApiError::Other(m) => {
                if m.trim().is_empty() { FALLBACK_MESSAGE.to_owned() } else { m.clone() }
            }
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Api { status, .. } => Some(*status),
            ApiError::Unauthorized { .. } => Some(StatusCode::UNAUTHORIZED.as_u16()),
            ApiError::Network(e, _) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Network(e, url) => write!(f, "Network error for {url}: {e}"),
            ApiError::Api { status, url, .. } => {
                write!(f, "API error {status} for {url}: {}", self.message())
            }
            ApiError::Unauthorized { url, .. } => write!(f, "Unauthorized for {url}"),
            ApiError::Parsing(e, url) => write!(f, "Parse error for {url}: {e}"),
            ApiError::Storage(msg) => write!(f, "Storage error: {msg}"),
            ApiError::Other(msg) => write!(f, "Error: {msg}"),
        }
    }
}

impl std::error::Error for ApiError {}

/// Pull a message out of an error payload: `message`, `error`, or
/// `error.message`.
pub fn server_message(body: &Value) -> Option<String> {
    let candidate = body
        .get("message")
        .and_then(Value::as_str)
        .or_else(|| body.get("error").and_then(Value::as_str))
        .or_else(|| body.pointer("/error/message").and_then(Value::as_str))
        .or_else(|| body.as_str());
    candidate
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(ToOwned::to_owned)
}

impl FundApi {
    pub fn new(base_url: impl Into<String>, storage: SessionStorage) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        Self {
            client: Client::builder()
                .user_agent("tourneyfund/0.1 (terminal client)")
                .default_headers(headers)
                .cookie_store(true)
                .build()
                .unwrap_or_default(),
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            storage,
            default_authorization: Arc::new(RwLock::new(None)),
            timeout: None,
        }
    }

    /// Base URL from `TOURNEYFUND_API_URL`, else the hosted backend.
    pub fn from_env(storage: SessionStorage) -> Self {
        let base_url = std::env::var("TOURNEYFUND_API_URL")
            .ok()
            .filter(|u| !u.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_owned());
        Self::new(base_url, storage)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn storage(&self) -> &SessionStorage {
        &self.storage
    }

    /// Install (or remove) the authorization attached to every request that
    /// doesn't carry its own.
    pub fn set_default_token(&self, token: Option<&str>) {
        if let Ok(mut guard) = self.default_authorization.write() {
            *guard = token
                .filter(|t| !t.trim().is_empty())
                .map(|t| format!("Bearer {t}"));
        }
    }

    pub fn default_authorization(&self) -> Option<String> {
        self.default_authorization.read().ok().and_then(|g| g.clone())
    }

    pub(crate) async fn get(&self, path: &str, query: &[(&str, &str)]) -> ApiResult<Value> {
        self.send(Method::GET, path, query, None, None).await
    }

    pub(crate) async fn post(&self, path: &str, body: &Value) -> ApiResult<Value> {
        self.send(Method::POST, path, &[], Some(body), None).await
    }

    pub(crate) async fn put(&self, path: &str, body: &Value) -> ApiResult<Value> {
        self.send(Method::PUT, path, &[], Some(body), None).await
    }

    pub(crate) async fn delete(&self, path: &str) -> ApiResult<Value> {
        self.send(Method::DELETE, path, &[], None, None).await
    }

    /// Issue one request. `authorization` overrides the default/stored token.
    /// Empty success bodies come back as `Value::Null`.
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<&Value>,
        authorization: Option<&str>,
    ) -> ApiResult<Value> {
        let url = self.url(path, query)?;
        let url_str = url.to_string();
        debug!("{method} {url_str}");

        let mut request = self.client.request(method, url);
        if let Some(auth) = self.resolve_authorization(authorization) {
            request = request.header(AUTHORIZATION, auth);
        }
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ApiError::Network(e, url_str.clone()))?;
        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ApiError::Network(e, url_str.clone()))?;
        let payload: Option<Value> = if bytes.is_empty() {
            None
        } else {
            serde_json::from_slice(&bytes).ok()
        };

        if status == StatusCode::UNAUTHORIZED {
            self.handle_unauthorized();
            return Err(ApiError::Unauthorized {
                message: payload.as_ref().and_then(server_message),
                url: url_str,
            });
        }

        if !status.is_success() {
            return Err(ApiError::Api {
                status: status.as_u16(),
                message: payload.as_ref().and_then(server_message),
                url: url_str,
            });
        }

        if bytes.is_empty() {
            return Ok(Value::Null);
        }
        payload.ok_or_else(|| {
            ApiError::Parsing(
                format!("response body is not JSON ({} bytes)", bytes.len()),
                url_str,
            )
        })
    }

    fn url(&self, path: &str, query: &[(&str, &str)]) -> ApiResult<Url> {
        let joined = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        let mut url = Url::parse(&joined)
            .map_err(|e| ApiError::Other(format!("invalid url {joined}: {e}")))?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    fn resolve_authorization(&self, explicit: Option<&str>) -> Option<String> {
        if let Some(auth) = explicit.filter(|a| !a.trim().is_empty()) {
            return Some(auth.to_owned());
        }
        self.default_authorization()
            .or_else(|| self.storage.token().map(|t| format!("Bearer {t}")))
    }

    fn handle_unauthorized(&self) {
        warn!("received 401, clearing stored credentials");
        if let Err(e) = self.storage.clear_auth() {
            warn!("could not clear stored credentials: {e}");
        }
        if let Ok(mut guard) = self.default_authorization.write() {
            *guard = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::temp_storage;
    use mockito::Matcher;
    use serde_json::json;

    #[test]
    fn server_message_prefers_message_then_error() {
        assert_eq!(
            server_message(&json!({"message": "Email taken", "error": "x"})).as_deref(),
            Some("Email taken")
        );
        assert_eq!(server_message(&json!({"error": "Bad seed"})).as_deref(), Some("Bad seed"));
        assert_eq!(
            server_message(&json!({"error": {"message": "nested"}})).as_deref(),
            Some("nested")
        );
        assert_eq!(server_message(&json!({"message": "  "})), None);
        assert_eq!(server_message(&json!({})), None);
    }

    #[test]
    fn api_error_message_falls_back_to_status_text() {
        let err = ApiError::Api { status: 500, message: None, url: "u".into() };
        assert_eq!(err.message(), "Request failed with status code 500");
        assert_eq!(err.status(), Some(500));
        assert_eq!(ApiError::Other(String::new()).message(), FALLBACK_MESSAGE);
    }

    #[tokio::test]
    async fn attaches_stored_token_when_no_header_set() {
        let mut server = mockito::Server::new_async().await;
        let storage = temp_storage("client-stored-token");
        storage.update(|s| s.token = Some("stored".into())).unwrap();

        let mock = server
            .mock("GET", "/tournaments")
            .match_header("authorization", "Bearer stored")
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;

        let api = FundApi::new(server.url(), storage);
        let body = api.get("/tournaments", &[]).await.unwrap();
        assert_eq!(body, json!([]));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn explicit_authorization_is_not_replaced() {
        let mut server = mockito::Server::new_async().await;
        let storage = temp_storage("client-explicit-token");
        storage.update(|s| s.token = Some("stored".into())).unwrap();

        let mock = server
            .mock("GET", "/dashboard/players/recent")
            .match_header("authorization", "Bearer explicit")
            .with_status(200)
            .with_body(r#"{"data": []}"#)
            .create_async()
            .await;

        let api = FundApi::new(server.url(), storage);
        api.send(Method::GET, "/dashboard/players/recent", &[], None, Some("Bearer explicit"))
            .await
            .unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn no_token_means_no_authorization_header() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/tournaments")
            .match_header("authorization", Matcher::Missing)
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;

        let api = FundApi::new(server.url(), temp_storage("client-no-token"));
        api.get("/tournaments", &[]).await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn unauthorized_clears_storage_and_default_header() {
        let mut server = mockito::Server::new_async().await;
        let storage = temp_storage("client-401");
        storage
            .update(|s| {
                s.token = Some("stale".into());
                s.is_admin = true;
                s.active_tab = Some("users".into());
            })
            .unwrap();

        server
            .mock("GET", "/payments")
            .with_status(401)
            .with_body(r#"{"message": "Token expired"}"#)
            .create_async()
            .await;

        let api = FundApi::new(server.url(), storage.clone());
        api.set_default_token(Some("stale"));
        let err = api.get("/payments", &[]).await.unwrap_err();

        assert!(matches!(err, ApiError::Unauthorized { .. }));
        assert_eq!(err.message(), "Token expired");
        assert!(api.default_authorization().is_none());
        let stored = storage.load().unwrap();
        assert!(stored.token.is_none());
        assert!(!stored.is_admin);
        assert_eq!(stored.active_tab.as_deref(), Some("users"));
    }

    #[tokio::test]
    async fn server_errors_keep_status_and_message() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/tournaments")
            .with_status(422)
            .with_body(r#"{"message": "Name is required"}"#)
            .create_async()
            .await;

        let api = FundApi::new(server.url(), temp_storage("client-422"));
        let err = api.post("/tournaments", &json!({})).await.unwrap_err();
        assert_eq!(err.status(), Some(422));
        assert_eq!(err.message(), "Name is required");
    }

    #[tokio::test]
    async fn empty_success_body_is_null() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("DELETE", "/tickets/t1")
            .with_status(204)
            .create_async()
            .await;

        let api = FundApi::new(server.url(), temp_storage("client-204"));
        assert_eq!(api.delete("/tickets/t1").await.unwrap(), Value::Null);
    }

    #[tokio::test]
    async fn query_parameters_are_encoded() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", Matcher::Regex(r"^/scores".into()))
            .match_query(Matcher::UrlEncoded("tournamentId".into(), "t 1".into()))
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;

        let api = FundApi::new(format!("{}/", server.url()), temp_storage("client-query"));
        api.get("/scores", &[("tournamentId", "t 1")]).await.unwrap();
        mock.assert_async().await;
    }
}
