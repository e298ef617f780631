use axum::{
    Json,
    extract::{Path, RawQuery, State},
};
use reqwest::Method;
use serde_json::Value;

use super::super::AppState;
use super::super::error::ApiResult;
use super::{segment, with_query};

pub async fn list_executions(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> ApiResult<Json<Value>> {
    let endpoint = with_query("/executions", query.as_deref());
    Ok(Json(state.engine.call(Method::GET, &endpoint, None).await?))
}

pub async fn get_execution(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> ApiResult<Json<Value>> {
    let endpoint = format!("/executions/{}", segment(&id));
    Ok(Json(state.engine.call(Method::GET, &endpoint, None).await?))
}
