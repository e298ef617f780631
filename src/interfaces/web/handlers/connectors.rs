use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;

use super::super::AppState;
use super::super::error::{ApiError, ApiResult};
use crate::core::catalog::ConnectorDefinition;

#[derive(Debug, Deserialize)]
pub struct ConnectorFilter {
    category: Option<String>,
    search: Option<String>,
}

pub async fn list_connectors(
    State(state): State<AppState>,
    Query(filter): Query<ConnectorFilter>,
) -> Json<Vec<ConnectorDefinition>> {
    Json(
        state
            .catalog
            .list_connectors(filter.category.as_deref(), filter.search.as_deref())
            .into_iter()
            .cloned()
            .collect(),
    )
}

pub async fn get_connector(
    Path(slug): Path<String>,
    State(state): State<AppState>,
) -> ApiResult<Json<ConnectorDefinition>> {
    state
        .catalog
        .find_connector(&slug)
        .cloned()
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Connector not found".into()))
}
