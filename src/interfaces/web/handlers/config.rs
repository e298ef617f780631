use axum::{Json, body::Bytes, extract::State};
use serde_json::{Value, json};

use super::super::AppState;
use super::super::error::{ApiError, ApiResult};
use super::json_body;
use crate::core::config::HubConfig;

pub async fn get_config(State(state): State<AppState>) -> Json<HubConfig> {
    Json(state.config.read().redacted())
}

pub async fn put_config(State(state): State<AppState>, body: Bytes) -> ApiResult<Json<Value>> {
    let Some(Value::Object(fields)) = json_body(&body)? else {
        return Err(ApiError::Validation(
            "Config update must be a JSON object".into(),
        ));
    };
    state.config.write_json(&fields)?;
    Ok(Json(json!({ "ok": true })))
}
