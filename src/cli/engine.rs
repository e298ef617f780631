use anyhow::{Result, anyhow};
use console::style;
use std::path::Path;

use crate::core::analytics;
use crate::core::catalog::Catalog;
use crate::core::catalog::deploy::{DeployError, deploy_template};
use crate::core::config::{ConfigStore, mask_secret};
use crate::core::engine::{EngineApi, EngineClient};
use crate::core::settings::HubSettings;
use crate::core::terminal::{GuideSection, print_link, print_success, print_warn};

pub async fn run_status(settings: &HubSettings, data_dir: &Path) -> Result<()> {
    let store = ConfigStore::new(data_dir);
    let client = EngineClient::new(settings, store.clone())?;
    let health = client.probe_health().await;
    let cfg = store.read();

    let engine_line = match health.label() {
        "running" => format!("{}", style("running").green()),
        "offline" => format!("{}", style("offline").red()),
        other => format!("{} ({})", style(other).yellow(), health.status_code),
    };
    let key_line = match cfg.api_key() {
        Some(key) => mask_secret(key),
        None => format!("{}", style("not set").yellow()),
    };

    let mut section = GuideSection::new("Engine")
        .status("URL", client.base())
        .status("Status", &engine_line)
        .status("API key", &key_line)
        .status("Setup complete", if cfg.setup_complete { "yes" } else { "no" });

    if health.online {
        match analytics::fetch_summary(&client).await {
            Ok(summary) => {
                section = section
                    .status(
                        "Workflows",
                        &format!(
                            "{} ({} active)",
                            summary.total_workflows, summary.active_workflows
                        ),
                    )
                    .status(
                        "Recent executions",
                        &format!(
                            "{} ({}% successful)",
                            summary.total_executions, summary.success_rate
                        ),
                    );
            }
            Err(e) => section = section.warn(&e.human_message()),
        }
    } else {
        section = section.warn("The workflow engine is unreachable. It may still be starting up.");
    }
    section.print();
    println!();
    Ok(())
}

pub async fn run_deploy(settings: &HubSettings, data_dir: &Path, template_id: &str) -> Result<()> {
    let catalog = Catalog::builtin()?;
    let client = EngineClient::new(settings, ConfigStore::new(data_dir))?;

    let outcome =
        match deploy_template(&client, &catalog, template_id, &settings.engine_public_base()).await
        {
            Ok(outcome) => outcome,
            Err(DeployError::Upstream(e)) => return Err(anyhow!(e.human_message())),
            Err(e) => return Err(e.into()),
        };

    let workflow_id = outcome
        .workflow
        .get("id")
        .map(|id| id.as_str().map(str::to_string).unwrap_or_else(|| id.to_string()))
        .unwrap_or_default();
    print_success(&format!("Deployed '{}' as workflow {}", template_id, workflow_id));

    if let Some(urls) = &outcome.webhook_url {
        print_link("Test webhook", &urls.test);
        print_link("Production webhook", &urls.production);
    }
    for cred in &outcome.required_credentials {
        print_warn(&format!(
            "Node '{}' needs a {} credential ({})",
            cred.node, cred.connector, cred.auth_type
        ));
    }
    Ok(())
}

pub fn run_config_show(data_dir: &Path) -> Result<()> {
    let store = ConfigStore::new(data_dir);
    let cfg = store.read().redacted();

    let services = if cfg.connected_services.is_empty() {
        "none".to_string()
    } else {
        cfg.connected_services.join(", ")
    };
    let mut section = GuideSection::new("Configuration")
        .status("File", &store.path().display().to_string())
        .status(
            "API key",
            if cfg.api_key.is_empty() {
                "not set"
            } else {
                cfg.api_key.as_str()
            },
        )
        .status("Connected services", &services)
        .status("Setup complete", if cfg.setup_complete { "yes" } else { "no" });
    if let Some(email) = &cfg.owner_email {
        section = section.status("Engine owner", email);
    }
    for (key, value) in &cfg.preferences {
        section = section.status(&format!("Preference {}", key), &value.to_string());
    }
    section.print();
    println!();
    Ok(())
}

pub fn run_config_set_key(data_dir: &Path, key: &str) -> Result<()> {
    let store = ConfigStore::new(data_dir);
    store.set_api_key(key)?;
    print_success(&format!("API key saved ({})", mask_secret(key.trim())));
    Ok(())
}
