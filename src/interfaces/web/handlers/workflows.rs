use axum::{
    Json,
    body::Bytes,
    extract::{Path, RawQuery, State},
};
use reqwest::Method;
use serde_json::Value;

use super::super::AppState;
use super::super::error::ApiResult;
use super::{json_body, segment, with_query};

pub async fn list_workflows(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> ApiResult<Json<Value>> {
    let endpoint = with_query("/workflows", query.as_deref());
    Ok(Json(state.engine.call(Method::GET, &endpoint, None).await?))
}

pub async fn create_workflow(State(state): State<AppState>, body: Bytes) -> ApiResult<Json<Value>> {
    let body = json_body(&body)?;
    Ok(Json(state.engine.call(Method::POST, "/workflows", body).await?))
}

pub async fn get_workflow(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> ApiResult<Json<Value>> {
    let endpoint = format!("/workflows/{}", segment(&id));
    Ok(Json(state.engine.call(Method::GET, &endpoint, None).await?))
}

pub async fn update_workflow(
    Path(id): Path<String>,
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<Json<Value>> {
    let endpoint = format!("/workflows/{}", segment(&id));
    let body = json_body(&body)?;
    Ok(Json(state.engine.call(Method::PUT, &endpoint, body).await?))
}

pub async fn delete_workflow(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> ApiResult<Json<Value>> {
    let endpoint = format!("/workflows/{}", segment(&id));
    Ok(Json(state.engine.call(Method::DELETE, &endpoint, None).await?))
}

pub async fn activate_workflow(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> ApiResult<Json<Value>> {
    let endpoint = format!("/workflows/{}/activate", segment(&id));
    Ok(Json(state.engine.call(Method::POST, &endpoint, None).await?))
}

pub async fn deactivate_workflow(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> ApiResult<Json<Value>> {
    let endpoint = format!("/workflows/{}/deactivate", segment(&id));
    Ok(Json(state.engine.call(Method::POST, &endpoint, None).await?))
}

/// Manual run. The engine calls this `run`; an absent body is sent as `{}`.
pub async fn execute_workflow(
    Path(id): Path<String>,
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<Json<Value>> {
    let endpoint = format!("/workflows/{}/run", segment(&id));
    let body = json_body(&body)?.unwrap_or_else(|| Value::Object(Default::default()));
    Ok(Json(
        state.engine.call(Method::POST, &endpoint, Some(body)).await?,
    ))
}
