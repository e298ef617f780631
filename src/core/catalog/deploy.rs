//! One-call deployment of a catalog template to the engine.

use reqwest::Method;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;
use thiserror::Error;
use tracing::info;

use super::Catalog;
use crate::core::engine::{EngineApi, UpstreamError};

pub const WEBHOOK_NODE_TYPE: &str = "n8n-nodes-base.webhook";

#[derive(Debug, Error)]
pub enum DeployError {
    #[error("template '{0}' not found")]
    TemplateNotFound(String),
    #[error(transparent)]
    Upstream(#[from] UpstreamError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WebhookUrls {
    pub test: String,
    pub production: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequiredCredential {
    pub node: String,
    pub connector: String,
    pub auth_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployOutcome {
    pub ok: bool,
    pub workflow: Value,
    pub webhook_url: Option<WebhookUrls>,
    pub required_credentials: Vec<RequiredCredential>,
}

/// Create the template's workflow on the engine and describe what the user
/// still has to wire up. `webhook_base` is the engine's browser-facing URL.
pub async fn deploy_template(
    engine: &dyn EngineApi,
    catalog: &Catalog,
    template_id: &str,
    webhook_base: &str,
) -> Result<DeployOutcome, DeployError> {
    let template = catalog
        .get_template(template_id)
        .ok_or_else(|| DeployError::TemplateNotFound(template_id.to_string()))?;
    let definition = &template.engine_definition;

    let workflow = engine
        .call(Method::POST, "/workflows", Some(definition.clone()))
        .await?;
    info!("Deployed template '{}' to the engine", template.id);

    Ok(DeployOutcome {
        ok: true,
        workflow,
        webhook_url: webhook_urls(definition, webhook_base),
        required_credentials: required_credentials(definition, catalog),
    })
}

fn nodes(definition: &Value) -> &[Value] {
    definition
        .get("nodes")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

/// URLs for the first webhook node that declares a path.
pub fn webhook_urls(definition: &Value, webhook_base: &str) -> Option<WebhookUrls> {
    let path = nodes(definition)
        .iter()
        .filter(|n| n.get("type").and_then(Value::as_str) == Some(WEBHOOK_NODE_TYPE))
        .find_map(|n| n.pointer("/parameters/path").and_then(Value::as_str))?;
    let base = webhook_base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    Some(WebhookUrls {
        test: format!("{}/webhook-test/{}", base, path),
        production: format!("{}/webhook/{}", base, path),
    })
}

/// Names of nodes that some connection points at. Everything else is a
/// trigger.
fn connection_targets(definition: &Value) -> HashSet<&str> {
    let mut targets = HashSet::new();
    let Some(connections) = definition.get("connections").and_then(Value::as_object) else {
        return targets;
    };
    for outputs in connections.values() {
        let Some(outputs) = outputs.as_object() else {
            continue;
        };
        for branches in outputs.values().filter_map(Value::as_array) {
            for branch in branches.iter().filter_map(Value::as_array) {
                targets.extend(
                    branch
                        .iter()
                        .filter_map(|link| link.get("node").and_then(Value::as_str)),
                );
            }
        }
    }
    targets
}

pub fn required_credentials(definition: &Value, catalog: &Catalog) -> Vec<RequiredCredential> {
    let targets = connection_targets(definition);
    nodes(definition)
        .iter()
        .filter_map(|node| {
            let name = node.get("name").and_then(Value::as_str)?;
            if !targets.contains(name) {
                return None;
            }
            let node_type = node.get("type").and_then(Value::as_str)?;
            let connector = catalog.connector_for_node(node_type)?;
            connector.requires_credentials().then(|| RequiredCredential {
                node: name.to_string(),
                connector: connector.name.clone(),
                auth_type: connector.auth_type.clone(),
            })
        })
        .collect()
}
