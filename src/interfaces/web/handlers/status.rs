use axum::{Json, extract::State};
use serde_json::json;

use super::super::AppState;

pub async fn get_status(State(state): State<AppState>) -> Json<serde_json::Value> {
    let health = state.engine.probe_health().await;
    let cfg = state.config.read();
    Json(json!({
        "online": health.online,
        "configured": cfg.is_configured(),
        "firstRun": !cfg.setup_complete,
        "engine": health.label(),
        "statusCode": health.status_code,
    }))
}
