//! Runtime settings for the hub process.
//!
//! Resolution order: built-in defaults, then `<data_dir>/settings.toml`, then
//! environment variables, then command-line flags.

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const SETTINGS_FILE: &str = "settings.toml";
pub const DEFAULT_ENGINE_URL: &str = "http://localhost:5678";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HubSettings {
    pub host: String,
    pub port: u16,
    /// Where the hub reaches the engine.
    pub engine_url: String,
    /// Where browsers reach the engine; used for webhook URLs. Falls back to
    /// `engine_url` when unset.
    pub engine_public_url: Option<String>,
    pub request_timeout_secs: u64,
    pub health_timeout_secs: u64,
    pub probe_interval_secs: u64,
    pub probe_attempts: u32,
    pub auto_configure: bool,
    pub owner_email: String,
    pub log_level: String,
    pub log_to_file: bool,
    /// Launch the dashboard in a browser once it is listening.
    pub open_browser: bool,
}

impl Default for HubSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            engine_url: DEFAULT_ENGINE_URL.to_string(),
            engine_public_url: None,
            request_timeout_secs: 10,
            health_timeout_secs: 3,
            probe_interval_secs: 3,
            probe_attempts: 40,
            auto_configure: true,
            owner_email: "owner@workflow-hub.local".to_string(),
            log_level: "info".to_string(),
            log_to_file: true,
            open_browser: false,
        }
    }
}

impl HubSettings {
    /// Defaults overlaid with `settings.toml` (if present) and the process
    /// environment.
    pub fn load(data_dir: &Path) -> Result<Self> {
        let path = data_dir.join(SETTINGS_FILE);
        let mut settings = if path.exists() {
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("reading {}", path.display()))?;
            Self::from_toml_str(&raw).with_context(|| format!("parsing {}", path.display()))?
        } else {
            Self::default()
        };
        settings.apply_env(|key| std::env::var(key).ok());
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    /// Overlay values from an environment lookup. `PORT` is honoured for
    /// container platforms; the prefixed variable wins when both are set.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup("PORT").and_then(|p| p.parse().ok()) {
            self.port = port;
        }
        if let Some(port) = lookup("WORKFLOW_HUB_PORT").and_then(|p| p.parse().ok()) {
            self.port = port;
        }
        if let Some(host) = lookup("WORKFLOW_HUB_HOST") {
            self.host = host;
        }
        if let Some(url) = lookup("WORKFLOW_HUB_ENGINE_URL") {
            self.engine_url = url;
        }
        if let Some(url) = lookup("WORKFLOW_HUB_ENGINE_PUBLIC_URL") {
            self.engine_public_url = Some(url);
        }
        if let Some(level) = lookup("WORKFLOW_HUB_LOG_LEVEL") {
            self.log_level = level;
        }
    }

    /// Overlay `--host`, `--port`, `--engine-url` and `--open` flags found at or after
    /// `start`. Unparseable values keep the current setting.
    pub fn apply_flags(&mut self, args: &[String], start: usize) {
        let mut i = start;
        while i < args.len() {
            match args[i].as_str() {
                "--host" => {
                    if i + 1 < args.len() {
                        self.host = args[i + 1].clone();
                        i += 2;
                    } else {
                        i += 1;
                    }
                }
                "--port" => {
                    if i + 1 < args.len() {
                        self.port = args[i + 1].parse().unwrap_or(self.port);
                        i += 2;
                    } else {
                        i += 1;
                    }
                }
                "--engine-url" => {
                    if i + 1 < args.len() {
                        self.engine_url = args[i + 1].clone();
                        i += 2;
                    } else {
                        i += 1;
                    }
                }
                "--open" => {
                    self.open_browser = true;
                    i += 1;
                }
                _ => i += 1,
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("engine_url", Some(&self.engine_url)),
            ("engine_public_url", self.engine_public_url.as_ref()),
        ] {
            if let Some(value) = value {
                let parsed = url::Url::parse(value)
                    .with_context(|| format!("{} is not a valid URL: {}", name, value))?;
                if !matches!(parsed.scheme(), "http" | "https") {
                    return Err(anyhow!("{} must use http or https: {}", name, value));
                }
            }
        }
        if self.request_timeout_secs == 0 || self.health_timeout_secs == 0 {
            return Err(anyhow!("timeouts must be at least one second"));
        }
        Ok(())
    }

    pub fn engine_base(&self) -> String {
        self.engine_url.trim_end_matches('/').to_string()
    }

    pub fn engine_public_base(&self) -> String {
        self.engine_public_url
            .as_deref()
            .unwrap_or(&self.engine_url)
            .trim_end_matches('/')
            .to_string()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn health_timeout(&self) -> Duration {
        Duration::from_secs(self.health_timeout_secs)
    }

    pub fn probe_interval(&self) -> Duration {
        Duration::from_secs(self.probe_interval_secs)
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn tracing_level(&self) -> tracing::Level {
        self.log_level
            .parse()
            .unwrap_or(tracing::Level::INFO)
    }

    pub fn log_file(&self, data_dir: &Path) -> Option<PathBuf> {
        self.log_to_file
            .then(|| data_dir.join("run").join("workflow-hub.log"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let settings = HubSettings::from_toml_str(
            "port = 8080\nengine_url = \"http://n8n:5678/\"\n",
        )
        .unwrap();
        assert_eq!(settings.port, 8080);
        assert_eq!(settings.engine_base(), "http://n8n:5678");
        assert_eq!(settings.request_timeout_secs, 10);
        assert_eq!(settings.health_timeout_secs, 3);
        assert!(settings.auto_configure);
    }

    #[test]
    fn env_overrides_prefer_prefixed_port() {
        let env: HashMap<&str, &str> = [
            ("PORT", "4000"),
            ("WORKFLOW_HUB_PORT", "4100"),
            ("WORKFLOW_HUB_ENGINE_PUBLIC_URL", "https://flows.example.com"),
        ]
        .into_iter()
        .collect();
        let mut settings = HubSettings::default();
        settings.apply_env(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(settings.port, 4100);
        assert_eq!(settings.engine_public_base(), "https://flows.example.com");
    }

    #[test]
    fn flags_override_and_ignore_garbage() {
        let mut settings = HubSettings::default();
        settings.apply_flags(
            &args(&["workflow-hub", "serve", "--port", "nope", "--host", "0.0.0.0", "--engine-url"]),
            2,
        );
        assert_eq!(settings.port, 3000);
        assert_eq!(settings.host, "0.0.0.0");
        assert_eq!(settings.engine_url, DEFAULT_ENGINE_URL);
        assert!(!settings.open_browser);

        settings.apply_flags(&args(&["workflow-hub", "--open", "--port", "4000"]), 1);
        assert!(settings.open_browser);
        assert_eq!(settings.port, 4000);
    }

    #[test]
    fn public_base_falls_back_to_engine_url() {
        let settings = HubSettings::default();
        assert_eq!(settings.engine_public_base(), "http://localhost:5678");
    }

    #[test]
    fn rejects_non_http_engine_url() {
        let settings = HubSettings {
            engine_url: "ftp://engine".to_string(),
            ..HubSettings::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn load_reads_settings_file() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join(SETTINGS_FILE), "probe_attempts = 5\n").unwrap();
        let settings = HubSettings::load(tmp.path()).unwrap();
        assert_eq!(settings.probe_attempts, 5);
    }
}
