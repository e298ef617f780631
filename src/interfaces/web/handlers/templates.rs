use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;

use super::super::AppState;
use super::super::error::{ApiError, ApiResult};
use crate::core::catalog::deploy::{self, DeployOutcome};
use crate::core::catalog::{TemplateDefinition, TemplateSummary};

#[derive(Debug, Deserialize)]
pub struct TemplateFilter {
    category: Option<String>,
}

pub async fn list_templates(
    State(state): State<AppState>,
    Query(filter): Query<TemplateFilter>,
) -> Json<Vec<TemplateSummary>> {
    Json(state.catalog.list_templates(filter.category.as_deref()))
}

pub async fn list_categories(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.catalog.categories())
}

pub async fn get_template(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> ApiResult<Json<TemplateDefinition>> {
    state
        .catalog
        .get_template(&id)
        .cloned()
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Template not found".into()))
}

pub async fn deploy_template(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> ApiResult<Json<DeployOutcome>> {
    let outcome = deploy::deploy_template(
        state.engine.as_ref(),
        &state.catalog,
        &id,
        &state.webhook_base,
    )
    .await?;
    Ok(Json(outcome))
}
