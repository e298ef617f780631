//! Summary counts over the engine's workflow and execution lists.

use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use crate::core::engine::{EngineApi, UpstreamError, list_data};

pub const RECENT_EXECUTIONS: usize = 20;
pub const EXECUTION_WINDOW: usize = 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowSummary {
    pub id: Value,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Execution {
    pub id: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow_id: Option<Value>,
    #[serde(default)]
    pub finished: bool,
    #[serde(default)]
    pub started_at: Option<String>,
    #[serde(default)]
    pub stopped_at: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionOutcome {
    Success,
    Error,
    InFlight,
}

impl Execution {
    /// A finished run succeeded; an unfinished one with a stop time failed;
    /// anything else is still running.
    pub fn outcome(&self) -> ExecutionOutcome {
        match (self.finished, self.stopped_at.is_some()) {
            (true, _) => ExecutionOutcome::Success,
            (false, true) => ExecutionOutcome::Error,
            (false, false) => ExecutionOutcome::InFlight,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSummary {
    pub total_workflows: usize,
    pub active_workflows: usize,
    pub total_executions: usize,
    pub success_count: usize,
    pub error_count: usize,
    pub in_flight_count: usize,
    pub success_rate: u32,
    pub recent_executions: Vec<Execution>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub executions_error: Option<String>,
}

/// Decode every record of a list envelope, skipping ones that do not fit.
pub fn decode_list<T: serde::de::DeserializeOwned>(envelope: &Value) -> Vec<T> {
    list_data(envelope)
        .into_iter()
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect()
}

/// Rounded percentage, half away from zero. 0 when `total` is 0.
pub fn success_rate(success: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    let (s, t) = (success.min(total) as u64, total as u64);
    ((200 * s + t) / (2 * t)) as u32
}

pub fn summarize(workflows: &[WorkflowSummary], executions: &[Execution]) -> AnalyticsSummary {
    let (mut success, mut error, mut in_flight) = (0, 0, 0);
    for exec in executions {
        match exec.outcome() {
            ExecutionOutcome::Success => success += 1,
            ExecutionOutcome::Error => error += 1,
            ExecutionOutcome::InFlight => in_flight += 1,
        }
    }

    AnalyticsSummary {
        total_workflows: workflows.len(),
        active_workflows: workflows.iter().filter(|w| w.active).count(),
        total_executions: executions.len(),
        success_count: success,
        error_count: error,
        in_flight_count: in_flight,
        success_rate: success_rate(success, executions.len()),
        recent_executions: executions.iter().take(RECENT_EXECUTIONS).cloned().collect(),
        executions_error: None,
    }
}

/// Fetch both lists concurrently and summarize. A failed workflow list fails
/// the whole call; a failed execution list degrades to zero executions.
pub async fn fetch_summary(engine: &dyn EngineApi) -> Result<AnalyticsSummary, UpstreamError> {
    let executions_endpoint = format!("/executions?limit={}", EXECUTION_WINDOW);
    let (workflows, executions) = tokio::join!(
        engine.call(Method::GET, "/workflows", None),
        engine.call(Method::GET, &executions_endpoint, None),
    );

    let workflows: Vec<WorkflowSummary> = decode_list(&workflows?);
    match executions {
        Ok(body) => Ok(summarize(&workflows, &decode_list(&body))),
        Err(e) => {
            warn!("Execution list unavailable for analytics: {}", e);
            let mut summary = summarize(&workflows, &[]);
            summary.executions_error = Some(e.human_message());
            Ok(summary)
        }
    }
}
