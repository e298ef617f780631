use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::EngineApi;
use super::bootstrap::{BootstrapOutcome, CredentialBootstrapper, bootstrap_credentials};
use crate::core::config::ConfigStore;
use crate::core::lifecycle::LifecycleComponent;
use crate::core::settings::HubSettings;

#[derive(Debug, PartialEq, Eq)]
pub enum WatchOutcome {
    AlreadyConfigured,
    AutoConfigureDisabled,
    EngineNeverCameUp,
    Bootstrapped(BootstrapOutcome),
}

/// Probe until the engine answers healthy, waiting `interval` between
/// attempts. Returns false after `attempts` failed probes.
pub async fn wait_for_engine(engine: &dyn EngineApi, interval: Duration, attempts: u32) -> bool {
    for attempt in 1..=attempts {
        let health = engine.probe_health().await;
        if health.online {
            debug!("Engine healthy after {} probe(s)", attempt);
            return true;
        }
        if attempt < attempts {
            tokio::time::sleep(interval).await;
        }
    }
    false
}

/// One pass of the startup watch: wait for the engine and, when no key is
/// stored yet, try to obtain one. Never retried after it returns.
pub async fn watch(
    engine: &dyn EngineApi,
    settings: &HubSettings,
    store: &ConfigStore,
    bootstrapper: &CredentialBootstrapper,
) -> Result<WatchOutcome> {
    if store.read().is_configured() {
        return Ok(WatchOutcome::AlreadyConfigured);
    }
    if !settings.auto_configure {
        info!("No engine API key stored; automatic setup is disabled");
        return Ok(WatchOutcome::AutoConfigureDisabled);
    }

    if !wait_for_engine(engine, settings.probe_interval(), settings.probe_attempts).await {
        warn!(
            "Engine at {} did not become healthy after {} probes; configure the API key manually",
            settings.engine_base(),
            settings.probe_attempts
        );
        return Ok(WatchOutcome::EngineNeverCameUp);
    }

    // A key may have been entered through the UI while we were waiting.
    if store.read().is_configured() {
        return Ok(WatchOutcome::AlreadyConfigured);
    }

    let outcome = bootstrap_credentials(settings, store, bootstrapper).await?;
    Ok(WatchOutcome::Bootstrapped(outcome))
}

/// Runs [`watch`] in the background once the server is listening.
pub struct EngineWatcher {
    engine: Arc<dyn EngineApi>,
    settings: HubSettings,
    store: ConfigStore,
    handle: Option<JoinHandle<()>>,
}

impl EngineWatcher {
    pub fn new(engine: Arc<dyn EngineApi>, settings: HubSettings, store: ConfigStore) -> Self {
        Self {
            engine,
            settings,
            store,
            handle: None,
        }
    }
}

#[async_trait::async_trait]
impl LifecycleComponent for EngineWatcher {
    async fn on_start(&mut self) -> Result<()> {
        let engine = self.engine.clone();
        let settings = self.settings.clone();
        let store = self.store.clone();
        self.handle = Some(tokio::spawn(async move {
            let bootstrapper = CredentialBootstrapper::with_default_strategies();
            match watch(engine.as_ref(), &settings, &store, &bootstrapper).await {
                Ok(outcome) => debug!("Engine watch finished: {:?}", outcome),
                Err(e) => warn!("Engine watch failed: {:#}", e),
            }
        }));
        Ok(())
    }

    async fn on_shutdown(&mut self) -> Result<()> {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
        Ok(())
    }
}
