use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::{error, warn};

use crate::core::catalog::deploy::DeployError;
use crate::core::engine::{ErrorKind, UpstreamError};

#[derive(Debug, Error)]
pub(crate) enum ApiError {
    #[error(transparent)]
    Upstream(#[from] UpstreamError),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<DeployError> for ApiError {
    fn from(err: DeployError) -> Self {
        match err {
            DeployError::TemplateNotFound(_) => ApiError::NotFound("Template not found".into()),
            DeployError::Upstream(e) => ApiError::Upstream(e),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Upstream(e) => {
                let kind = e.kind();
                let status = if kind == ErrorKind::Timeout {
                    StatusCode::GATEWAY_TIMEOUT
                } else {
                    StatusCode::BAD_GATEWAY
                };
                warn!("Upstream call failed: {}", e);
                (
                    status,
                    Json(serde_json::json!({ "error": e.human_message(), "kind": kind })),
                )
                    .into_response()
            }
            ApiError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                Json(serde_json::json!({ "error": msg })),
            )
                .into_response(),
            ApiError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({ "error": msg, "kind": ErrorKind::Validation })),
            )
                .into_response(),
            ApiError::Internal(e) => {
                error!("Request failed: {:#}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(serde_json::json!({ "error": "Internal error; see the hub log" })),
                )
                    .into_response()
            }
        }
    }
}

pub(crate) type ApiResult<T> = Result<T, ApiError>;
