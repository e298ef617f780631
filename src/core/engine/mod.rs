//! Client for the workflow engine's public REST API (`/api/v1`).

pub mod bootstrap;
pub mod watcher;

use async_trait::async_trait;
use reqwest::{Client, Method, header};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

use crate::core::config::ConfigStore;
use crate::core::settings::HubSettings;

pub const API_KEY_HEADER: &str = "X-N8N-API-KEY";
pub const API_PREFIX: &str = "/api/v1";

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("engine {status}: {body}")]
    Status { status: u16, body: String },
    #[error("engine request timed out after {}s", .0.as_secs())]
    Timeout(Duration),
    #[error("engine unreachable: {0}")]
    Connect(String),
    #[error("engine request failed: {0}")]
    Transport(String),
    #[error("engine returned an unreadable body: {0}")]
    Decode(String),
}

impl UpstreamError {
    fn from_reqwest(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            UpstreamError::Timeout(timeout)
        } else if err.is_connect() {
            UpstreamError::Connect(err.to_string())
        } else {
            UpstreamError::Transport(err.to_string())
        }
    }

    pub fn status_code(&self) -> Option<u16> {
        match self {
            UpstreamError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            UpstreamError::Timeout(_) => ErrorKind::Timeout,
            UpstreamError::Connect(_) => ErrorKind::Unavailable,
            _ => classify(&self.to_string()),
        }
    }

    pub fn human_message(&self) -> String {
        humanize(&self.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Auth,
    NotFound,
    Conflict,
    Unavailable,
    Timeout,
    Validation,
    Unknown,
}

/// Map raw error text to a category. A leading `engine <code>:` decides by
/// status; otherwise the text is searched for well-known phrases.
pub fn classify(raw: &str) -> ErrorKind {
    let lower = raw.trim().to_ascii_lowercase();

    if let Some(code) = leading_status(&lower) {
        match code {
            401 | 403 => return ErrorKind::Auth,
            404 => return ErrorKind::NotFound,
            409 => return ErrorKind::Conflict,
            502 | 503 => return ErrorKind::Unavailable,
            504 => return ErrorKind::Timeout,
            _ => {}
        }
    }

    if lower.contains("unauthorized") || lower.contains("forbidden") {
        ErrorKind::Auth
    } else if lower.contains("not found") {
        ErrorKind::NotFound
    } else if lower.contains("conflict") {
        ErrorKind::Conflict
    } else if lower.contains("econnrefused")
        || lower.contains("connection refused")
        || lower.contains("unreachable")
        || lower.contains("bad gateway")
    {
        ErrorKind::Unavailable
    } else if lower.contains("timed out") || lower.contains("timeout") {
        ErrorKind::Timeout
    } else {
        ErrorKind::Unknown
    }
}

fn leading_status(lower: &str) -> Option<u16> {
    let rest = lower
        .strip_prefix("engine ")
        .or_else(|| lower.strip_prefix("n8n "))?;
    let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.len() == 3 && rest[digits.len()..].starts_with(':') {
        digits.parse().ok()
    } else {
        None
    }
}

/// The message shown to a user for a raw error. Unknown errors pass through.
pub fn humanize(raw: &str) -> String {
    match classify(raw) {
        ErrorKind::Auth => {
            "The workflow engine rejected the API key. Reconfigure the credential in Settings."
                .to_string()
        }
        ErrorKind::NotFound => {
            "The requested resource does not exist in the workflow engine.".to_string()
        }
        ErrorKind::Conflict => {
            "The workflow engine reported a conflict. Refresh and try again.".to_string()
        }
        ErrorKind::Unavailable => {
            "The workflow engine is unreachable. It may still be starting up.".to_string()
        }
        ErrorKind::Timeout => "The workflow engine did not respond in time.".to_string(),
        ErrorKind::Validation => "The request was rejected as invalid.".to_string(),
        ErrorKind::Unknown => raw.to_string(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthStatus {
    pub online: bool,
    /// 0 when no response arrived.
    pub status_code: u16,
}

impl HealthStatus {
    pub fn offline() -> Self {
        Self {
            online: false,
            status_code: 0,
        }
    }

    pub fn label(&self) -> &'static str {
        match (self.online, self.status_code) {
            (true, _) => "running",
            (false, 0) => "offline",
            (false, _) => "error",
        }
    }
}

/// The engine operations the hub depends on.
#[async_trait]
pub trait EngineApi: Send + Sync {
    /// Call `<engine>/api/v1<endpoint>` and return the decoded JSON body.
    async fn call(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<Value>,
    ) -> Result<Value, UpstreamError>;

    /// Liveness check; failures of any kind report offline.
    async fn probe_health(&self) -> HealthStatus;
}

pub struct EngineClient {
    http: Client,
    base: String,
    config: ConfigStore,
    request_timeout: Duration,
    health_timeout: Duration,
}

impl EngineClient {
    pub fn new(settings: &HubSettings, config: ConfigStore) -> anyhow::Result<Self> {
        let http = Client::builder()
            .user_agent(concat!("workflow-hub/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            base: settings.engine_base(),
            config,
            request_timeout: settings.request_timeout(),
            health_timeout: settings.health_timeout(),
        })
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    fn api_url(&self, endpoint: &str) -> String {
        format!("{}{}{}", self.base, API_PREFIX, endpoint)
    }
}

#[async_trait]
impl EngineApi for EngineClient {
    async fn call(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<Value>,
    ) -> Result<Value, UpstreamError> {
        let mut request = self
            .http
            .request(method, self.api_url(endpoint))
            .timeout(self.request_timeout)
            .header(header::ACCEPT, "application/json");

        let cfg = self.config.read();
        if let Some(key) = cfg.api_key() {
            request = request.header(API_KEY_HEADER, key);
        }
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| UpstreamError::from_reqwest(e, self.request_timeout))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| UpstreamError::from_reqwest(e, self.request_timeout))?;

        if !status.is_success() {
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                body: text,
            });
        }
        if text.trim().is_empty() {
            return Ok(Value::Object(Default::default()));
        }
        serde_json::from_str(&text).map_err(|e| UpstreamError::Decode(e.to_string()))
    }

    async fn probe_health(&self) -> HealthStatus {
        match self
            .http
            .get(format!("{}/healthz", self.base))
            .timeout(self.health_timeout)
            .send()
            .await
        {
            Ok(res) => HealthStatus {
                online: res.status().is_success(),
                status_code: res.status().as_u16(),
            },
            Err(_) => HealthStatus::offline(),
        }
    }
}

/// Records from a list response. The engine wraps lists as `{ data: [...] }`;
/// a bare array is accepted too.
pub fn list_data(envelope: &Value) -> Vec<Value> {
    match envelope {
        Value::Array(items) => items.clone(),
        other => other
            .get("data")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default(),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use axum::{Json, Router, http::HeaderMap, http::StatusCode, routing::get};
    use serde_json::json;
    use std::time::Instant;

    pub(crate) async fn spawn_engine(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });
        format!("http://{}", addr)
    }

    pub(crate) fn client_for(base: &str, dir: &std::path::Path) -> EngineClient {
        let settings = HubSettings {
            engine_url: base.to_string(),
            request_timeout_secs: 1,
            health_timeout_secs: 1,
            ..HubSettings::default()
        };
        EngineClient::new(&settings, ConfigStore::new(dir)).unwrap()
    }

    #[test]
    fn classify_by_status_prefix() {
        assert_eq!(classify("engine 401: unauthorized"), ErrorKind::Auth);
        assert_eq!(classify("engine 403: {}"), ErrorKind::Auth);
        assert_eq!(classify("engine 404: {\"message\":\"x\"}"), ErrorKind::NotFound);
        assert_eq!(classify("engine 409: duplicate"), ErrorKind::Conflict);
        assert_eq!(classify("engine 502: Bad Gateway"), ErrorKind::Unavailable);
        assert_eq!(classify("n8n 401: legacy"), ErrorKind::Auth);
    }

    #[test]
    fn classify_by_text() {
        assert_eq!(
            classify("connect ECONNREFUSED 127.0.0.1:5678"),
            ErrorKind::Unavailable
        );
        assert_eq!(classify("engine request timed out after 10s"), ErrorKind::Timeout);
        assert_eq!(classify("engine unreachable: tcp connect error"), ErrorKind::Unavailable);
        assert_eq!(classify("engine 500: boom"), ErrorKind::Unknown);
        assert_eq!(classify("something odd"), ErrorKind::Unknown);
    }

    #[test]
    fn humanize_passes_unknown_through() {
        assert_eq!(humanize("engine 500: boom"), "engine 500: boom");
        assert!(humanize("engine 401: no").contains("Reconfigure"));
        assert!(humanize("ECONNREFUSED").contains("starting up"));
    }

    #[test]
    fn list_data_accepts_both_shapes() {
        assert_eq!(list_data(&json!({ "data": [1, 2] })).len(), 2);
        assert_eq!(list_data(&json!([1])).len(), 1);
        assert!(list_data(&json!({ "nextCursor": null })).is_empty());
    }

    #[tokio::test]
    async fn call_sends_stored_api_key() {
        let base = spawn_engine(Router::new().route(
            "/api/v1/workflows",
            get(|headers: HeaderMap| async move {
                let key = headers
                    .get(API_KEY_HEADER)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("")
                    .to_string();
                Json(json!({ "data": [], "key": key }))
            }),
        ))
        .await;
        let tmp = tempfile::tempdir().unwrap();
        ConfigStore::new(tmp.path()).set_api_key("k-123").unwrap();

        let client = client_for(&base, tmp.path());
        let body = client.call(Method::GET, "/workflows", None).await.unwrap();
        assert_eq!(body["key"], json!("k-123"));
    }

    #[tokio::test]
    async fn call_omits_header_without_key() {
        let base = spawn_engine(Router::new().route(
            "/api/v1/workflows",
            get(|headers: HeaderMap| async move {
                Json(json!({ "has_key": headers.contains_key(API_KEY_HEADER) }))
            }),
        ))
        .await;
        let tmp = tempfile::tempdir().unwrap();
        let client = client_for(&base, tmp.path());
        let body = client.call(Method::GET, "/workflows", None).await.unwrap();
        assert_eq!(body["has_key"], json!(false));
    }

    #[tokio::test]
    async fn non_success_status_becomes_status_error() {
        let base = spawn_engine(Router::new().route(
            "/api/v1/workflows/{id}",
            get(|| async { (StatusCode::UNAUTHORIZED, "{\"message\":\"unauthorized\"}") }),
        ))
        .await;
        let tmp = tempfile::tempdir().unwrap();
        let client = client_for(&base, tmp.path());

        let err = client
            .call(Method::GET, "/workflows/7", None)
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), Some(401));
        assert_eq!(err.kind(), ErrorKind::Auth);
        assert!(err.to_string().starts_with("engine 401:"));
    }

    #[tokio::test]
    async fn slow_engine_times_out() {
        let base = spawn_engine(Router::new().route(
            "/api/v1/workflows",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Json(json!({}))
            }),
        ))
        .await;
        let tmp = tempfile::tempdir().unwrap();
        let client = client_for(&base, tmp.path());

        let started = Instant::now();
        let err = client.call(Method::GET, "/workflows", None).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Timeout);
        assert!(started.elapsed() < Duration::from_secs(3));
    }

    #[tokio::test]
    async fn probe_reports_running_and_offline() {
        let base = spawn_engine(
            Router::new().route("/healthz", get(|| async { Json(json!({ "status": "ok" })) })),
        )
        .await;
        let tmp = tempfile::tempdir().unwrap();
        let health = client_for(&base, tmp.path()).probe_health().await;
        assert!(health.online);
        assert_eq!(health.label(), "running");

        let closed = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            format!("http://{}", listener.local_addr().unwrap())
        };
        let health = client_for(&closed, tmp.path()).probe_health().await;
        assert_eq!(health, HealthStatus::offline());
    }

    #[tokio::test]
    async fn probe_gives_up_at_health_timeout() {
        let base = spawn_engine(Router::new().route(
            "/healthz",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                "late"
            }),
        ))
        .await;
        let tmp = tempfile::tempdir().unwrap();
        let started = Instant::now();
        let health = client_for(&base, tmp.path()).probe_health().await;
        assert!(!health.online);
        assert!(started.elapsed() < Duration::from_secs(3));
    }
}
