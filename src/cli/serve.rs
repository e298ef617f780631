use anyhow::{Context, Result};
use console::style;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::core::catalog::Catalog;
use crate::core::config::ConfigStore;
use crate::core::engine::watcher::EngineWatcher;
use crate::core::engine::{EngineApi, EngineClient};
use crate::core::lifecycle::LifecycleManager;
use crate::core::settings::HubSettings;
use crate::core::terminal::{self, GuideSection};
use crate::interfaces::web::{AppState, WebServer};
use crate::logging;
use crate::platform::{NativePlatform, Platform};

pub async fn run_serve(settings: HubSettings, data_dir: PathBuf) -> Result<()> {
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("creating {}", data_dir.display()))?;
    NativePlatform::restrict_dir_permissions(&data_dir);
    logging::init(
        settings.tracing_level(),
        settings.log_file(&data_dir).as_deref(),
    )?;

    let store = ConfigStore::new(&data_dir);
    let engine: Arc<dyn EngineApi> = Arc::new(EngineClient::new(&settings, store.clone())?);
    let state = AppState {
        engine: engine.clone(),
        config: store.clone(),
        catalog: Arc::new(Catalog::builtin()?),
        webhook_base: settings.engine_public_base(),
        port: settings.port,
    };

    let mut lifecycle = LifecycleManager::new();
    lifecycle.attach(Arc::new(Mutex::new(WebServer::new(
        state,
        settings.listen_addr(),
    ))));
    lifecycle.attach(Arc::new(Mutex::new(EngineWatcher::new(
        engine,
        settings.clone(),
        store.clone(),
    ))));
    lifecycle.start().await?;

    terminal::print_banner();
    let dashboard = format!("http://{}", settings.listen_addr());
    let mut guide = GuideSection::new("Workflow Hub")
        .status(
            "Dashboard",
            &format!("{}", style(&dashboard).underlined().cyan()),
        )
        .status("Engine", &settings.engine_base())
        .status("Data", &data_dir.display().to_string());
    if !store.read().is_configured() {
        guide = guide.info(if settings.auto_configure {
            "No API key stored yet; one will be created once the engine is up."
        } else {
            "No API key stored. Add one in Settings or run 'workflow-hub config set-key'."
        });
    }
    guide
        .blank()
        .status(
            "Press Ctrl+C to stop the dashboard.",
            &format!("{}", style("Ctrl+C").bold().yellow()),
        )
        .print();
    println!();

    if settings.open_browser
        && let Err(e) = open::that(&dashboard)
    {
        tracing::warn!("Could not open a browser: {}", e);
    }

    tokio::signal::ctrl_c().await?;
    lifecycle.shutdown().await
}
