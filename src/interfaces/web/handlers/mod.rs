pub mod analytics;
pub mod config;
pub mod connectors;
pub mod executions;
pub mod status;
pub mod templates;
pub mod workflows;

use axum::body::Bytes;
use serde_json::Value;

use super::error::{ApiError, ApiResult};

/// `endpoint` with the caller's raw query string appended verbatim.
pub(crate) fn with_query(endpoint: &str, query: Option<&str>) -> String {
    match query.filter(|q| !q.is_empty()) {
        Some(q) => format!("{}?{}", endpoint, q),
        None => endpoint.to_string(),
    }
}

/// Percent-encode a client-supplied id before splicing it into an engine path.
pub(crate) fn segment(id: &str) -> String {
    urlencoding::encode(id).into_owned()
}

/// Optional JSON request body; empty means absent.
pub(crate) fn json_body(body: &Bytes) -> ApiResult<Option<Value>> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    serde_json::from_slice(body)
        .map(Some)
        .map_err(|e| ApiError::Validation(format!("Request body is not valid JSON: {}", e)))
}
