use axum::{Json, extract::State};

use super::super::AppState;
use super::super::error::ApiResult;
use crate::core::analytics::{self, AnalyticsSummary};

pub async fn get_analytics(State(state): State<AppState>) -> ApiResult<Json<AnalyticsSummary>> {
    Ok(Json(analytics::fetch_summary(state.engine.as_ref()).await?))
}
