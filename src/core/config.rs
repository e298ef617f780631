//! The persisted dashboard configuration: one JSON document holding the
//! engine API key, UI preferences and setup state.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::platform::{NativePlatform, Platform};

pub const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HubConfig {
    #[serde(default)]
    pub api_key: String,
    /// Key stored under the older field name; folded into `api_key` on read.
    #[serde(default, rename = "n8nApiKey", skip_serializing)]
    legacy_api_key: Option<String>,
    #[serde(default = "default_preferences")]
    pub preferences: Map<String, Value>,
    #[serde(default)]
    pub connected_services: Vec<String>,
    #[serde(default)]
    pub setup_complete: bool,
    /// Owner account the credential bootstrapper created or will log in as.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_email: Option<String>,
    /// Remembered so a later boot can log in and mint a key. Never leaves the
    /// process through `redacted()`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub setup_password: Option<String>,
}

fn default_preferences() -> Map<String, Value> {
    let mut prefs = Map::new();
    prefs.insert("theme".to_string(), Value::String("dark".to_string()));
    prefs
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            legacy_api_key: None,
            preferences: default_preferences(),
            connected_services: Vec::new(),
            setup_complete: false,
            owner_email: None,
            setup_password: None,
        }
    }
}

impl HubConfig {
    /// Move a legacy key into `api_key` unless a current key is already set.
    fn fold_legacy_key(mut self) -> Self {
        if let Some(legacy) = self.legacy_api_key.take()
            && self.api_key.trim().is_empty()
        {
            self.api_key = legacy.trim().to_string();
        }
        self
    }

    pub fn api_key(&self) -> Option<&str> {
        let key = self.api_key.trim();
        (!key.is_empty()).then_some(key)
    }

    pub fn is_configured(&self) -> bool {
        self.api_key().is_some()
    }

    /// Copy safe to hand to a client: the key is masked to its last four
    /// characters and transient credentials are dropped.
    pub fn redacted(&self) -> Self {
        let mut out = self.clone();
        out.api_key = mask_secret(&self.api_key);
        out.setup_password = None;
        out
    }

    pub fn apply(&mut self, patch: ConfigPatch) {
        if let Some(key) = patch.api_key {
            self.api_key = key;
        }
        if let Some(prefs) = patch.preferences {
            for (k, v) in prefs {
                self.preferences.insert(k, v);
            }
        }
        if let Some(services) = patch.connected_services {
            self.connected_services = services;
        }
        if let Some(done) = patch.setup_complete {
            self.setup_complete = done;
        }
    }
}

/// `****` followed by the last four characters; empty stays empty.
pub fn mask_secret(secret: &str) -> String {
    if secret.is_empty() {
        return String::new();
    }
    let chars: Vec<char> = secret.chars().collect();
    let tail: String = chars[chars.len().saturating_sub(4)..].iter().collect();
    format!("****{}", tail)
}

/// The client-writable subset of [`HubConfig`].
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ConfigPatch {
    pub api_key: Option<String>,
    pub preferences: Option<Map<String, Value>>,
    pub connected_services: Option<Vec<String>>,
    pub setup_complete: Option<bool>,
}

impl ConfigPatch {
    /// Keep recognised fields with the right JSON type; everything else is
    /// dropped. Returns the names of fields that were present but rejected.
    pub fn from_json(body: &Map<String, Value>) -> (Self, Vec<String>) {
        let mut patch = Self::default();
        let mut rejected = Vec::new();

        for (field, value) in body {
            match field.as_str() {
                "apiKey" | "n8nApiKey" => match value {
                    Value::String(_) if field == "n8nApiKey" && body.contains_key("apiKey") => {}
                    Value::String(key) => patch.api_key = Some(key.trim().to_string()),
                    _ => rejected.push(field.clone()),
                },
                "preferences" => match value {
                    Value::Object(prefs) => patch.preferences = Some(prefs.clone()),
                    _ => rejected.push(field.clone()),
                },
                "connectedServices" => match value {
                    Value::Array(items) => {
                        let services: Option<Vec<String>> = items
                            .iter()
                            .map(|v| v.as_str().map(str::to_string))
                            .collect();
                        match services {
                            Some(list) => patch.connected_services = Some(list),
                            None => rejected.push(field.clone()),
                        }
                    }
                    _ => rejected.push(field.clone()),
                },
                "setupComplete" => match value {
                    Value::Bool(done) => patch.setup_complete = Some(*done),
                    _ => rejected.push(field.clone()),
                },
                _ => {}
            }
        }

        (patch, rejected)
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Reads and writes `config.json`. Every mutation is a full
/// read-modify-write; concurrent writers race and the last one wins.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join(CONFIG_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The stored document, or defaults when the file is missing or invalid.
    pub fn read(&self) -> HubConfig {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(_) => return HubConfig::default(),
        };
        match serde_json::from_str::<HubConfig>(&raw) {
            Ok(cfg) => cfg.fold_legacy_key(),
            Err(e) => {
                warn!(
                    "Ignoring unreadable config at {}: {}",
                    self.path.display(),
                    e
                );
                HubConfig::default()
            }
        }
    }

    pub fn write(&self, patch: ConfigPatch) -> Result<HubConfig> {
        let mut cfg = self.read();
        cfg.apply(patch);
        self.save(&cfg)?;
        Ok(cfg)
    }

    /// Validate a raw client body and merge whatever survives.
    pub fn write_json(&self, body: &Map<String, Value>) -> Result<HubConfig> {
        let (patch, rejected) = ConfigPatch::from_json(body);
        if !rejected.is_empty() {
            debug!("Ignored config fields with wrong types: {}", rejected.join(", "));
        }
        self.write(patch)
    }

    pub fn set_api_key(&self, key: &str) -> Result<()> {
        self.write(ConfigPatch {
            api_key: Some(key.trim().to_string()),
            ..ConfigPatch::default()
        })?;
        Ok(())
    }

    pub fn remember_owner(&self, email: &str, password: &str) -> Result<()> {
        let mut cfg = self.read();
        cfg.owner_email = Some(email.to_string());
        cfg.setup_password = Some(password.to_string());
        self.save(&cfg)
    }

    fn save(&self, cfg: &HubConfig) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("creating {}", dir.display()))?;
        }
        let body = serde_json::to_string_pretty(cfg)?;
        std::fs::write(&self.path, body)
            .with_context(|| format!("writing {}", self.path.display()))?;
        NativePlatform::restrict_file_permissions(&self.path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn store() -> (tempfile::TempDir, ConfigStore) {
        let tmp = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(tmp.path());
        (tmp, store)
    }

    fn body(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    fn raw_on_disk(store: &ConfigStore) -> Value {
        serde_json::from_str(&std::fs::read_to_string(store.path()).unwrap()).unwrap()
    }

    #[test]
    fn missing_file_reads_as_defaults() {
        let (_tmp, store) = store();
        let cfg = store.read();
        assert_eq!(cfg.api_key, "");
        assert_eq!(cfg.preferences.get("theme"), Some(&json!("dark")));
        assert!(cfg.connected_services.is_empty());
        assert!(!cfg.setup_complete);
    }

    #[test]
    fn garbage_file_reads_as_defaults() {
        let (_tmp, store) = store();
        std::fs::write(store.path(), "{not json").unwrap();
        assert_eq!(store.read(), HubConfig::default());
    }

    #[test]
    fn api_key_is_stored_raw_and_redacted_on_read() {
        let (_tmp, store) = store();
        store.write_json(&body(json!({ "apiKey": "secret123" }))).unwrap();

        assert_eq!(raw_on_disk(&store)["apiKey"], json!("secret123"));
        let shown = store.read().redacted();
        assert!(shown.api_key.starts_with("****"));
        assert!(shown.api_key.ends_with('3'));
        assert_eq!(shown.api_key, "****t123");
    }

    #[test]
    fn unknown_fields_are_not_stored() {
        let (_tmp, store) = store();
        store
            .write_json(&body(json!({ "admin": true, "setupComplete": true })))
            .unwrap();

        let raw = raw_on_disk(&store);
        assert!(raw.get("admin").is_none());
        assert_eq!(raw["setupComplete"], json!(true));
        assert_eq!(raw["apiKey"], json!(""));
    }

    #[test]
    fn wrong_types_are_ignored() {
        let (_tmp, store) = store();
        store.write_json(&body(json!({ "apiKey": "abcd1234" }))).unwrap();

        let (patch, rejected) = ConfigPatch::from_json(&body(json!({
            "apiKey": 42,
            "preferences": "light",
            "connectedServices": ["slack", 7],
            "setupComplete": "yes"
        })));
        assert!(patch.is_empty());
        assert_eq!(rejected.len(), 4);

        store.write(patch).unwrap();
        let cfg = store.read();
        assert_eq!(cfg.api_key, "abcd1234");
        assert_eq!(cfg.preferences.get("theme"), Some(&json!("dark")));
    }

    #[test]
    fn preferences_merge_shallowly() {
        let (_tmp, store) = store();
        store
            .write_json(&body(json!({ "preferences": { "density": "compact" } })))
            .unwrap();
        store
            .write_json(&body(json!({ "preferences": { "theme": "light" } })))
            .unwrap();

        let cfg = store.read();
        assert_eq!(cfg.preferences.get("theme"), Some(&json!("light")));
        assert_eq!(cfg.preferences.get("density"), Some(&json!("compact")));
    }

    #[test]
    fn connected_services_replace_previous_list() {
        let (_tmp, store) = store();
        store
            .write_json(&body(json!({ "connectedServices": ["slack", "hubspot"] })))
            .unwrap();
        store
            .write_json(&body(json!({ "connectedServices": ["notion"] })))
            .unwrap();
        assert_eq!(store.read().connected_services, vec!["notion".to_string()]);
    }

    #[test]
    fn legacy_key_name_is_accepted() {
        let (_tmp, store) = store();
        std::fs::write(store.path(), r#"{"n8nApiKey":"legacy-key"}"#).unwrap();
        assert_eq!(store.read().api_key, "legacy-key");

        store.write_json(&body(json!({ "n8nApiKey": "new-key" }))).unwrap();
        assert_eq!(store.read().api_key, "new-key");

        store
            .write_json(&body(json!({ "n8nApiKey": "old-name", "apiKey": "new-name" })))
            .unwrap();
        assert_eq!(store.read().api_key, "new-name");
    }

    #[test]
    fn file_with_both_key_names_keeps_everything() {
        let (_tmp, store) = store();
        std::fs::write(
            store.path(),
            r#"{"n8nApiKey":"old","apiKey":"new-key","connectedServices":["slack"],
                "setupComplete":true,"preferences":{"theme":"light"},
                "ownerEmail":"owner@example.com"}"#,
        )
        .unwrap();

        let cfg = store.read();
        assert_eq!(cfg.api_key, "new-key");
        assert_eq!(cfg.connected_services, vec!["slack".to_string()]);
        assert!(cfg.setup_complete);
        assert_eq!(cfg.owner_email.as_deref(), Some("owner@example.com"));

        store
            .write_json(&body(json!({ "preferences": { "density": "compact" } })))
            .unwrap();
        let on_disk = raw_on_disk(&store);
        assert_eq!(on_disk["apiKey"], json!("new-key"));
        assert_eq!(on_disk["connectedServices"], json!(["slack"]));
        assert_eq!(on_disk["preferences"]["theme"], json!("light"));
        assert_eq!(on_disk["preferences"]["density"], json!("compact"));
        assert!(on_disk.get("n8nApiKey").is_none());
    }

    #[test]
    fn legacy_key_fills_an_empty_current_key() {
        let (_tmp, store) = store();
        std::fs::write(store.path(), r#"{"apiKey":"","n8nApiKey":"legacy"}"#).unwrap();
        assert_eq!(store.read().api_key, "legacy");
    }

    #[test]
    fn setup_password_never_leaves_through_redaction() {
        let (_tmp, store) = store();
        store.remember_owner("owner@example.com", "Hunter2Hunter2").unwrap();

        assert_eq!(raw_on_disk(&store)["setupPassword"], json!("Hunter2Hunter2"));
        let shown = serde_json::to_value(store.read().redacted()).unwrap();
        assert!(shown.get("setupPassword").is_none());
        assert_eq!(shown["ownerEmail"], json!("owner@example.com"));
    }

    #[test]
    fn short_keys_are_fully_masked_behind_prefix() {
        assert_eq!(mask_secret(""), "");
        assert_eq!(mask_secret("ab"), "****ab");
        assert_eq!(mask_secret("ключ-секрет"), "****крет");
    }
}
