use std::{fs, path::Path, path::PathBuf};

use anyhow::{Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};

pub const DEFAULT_QUIET_PERIOD_MS: u64 = 1000;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_ENTRIES_KEY: &str = "moodEntries";

const ENV_CLASSIFIER_URL: &str = "MOODJOURNAL_CLASSIFIER_URL";
const ENV_CLASSIFIER_KEY: &str = "MOODJOURNAL_CLASSIFIER_KEY";
const ENV_DEBUG: &str = "MOODJOURNAL_DEBUG";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ClassifierSettings {
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub request_timeout_secs: u64,
}

impl Default for ClassifierSettings {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_key: None,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebounceSettings {
    pub quiet_period_ms: u64,
}

impl Default for DebounceSettings {
    fn default() -> Self {
        Self {
            quiet_period_ms: DEFAULT_QUIET_PERIOD_MS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StorageSettings {
    pub database_path: PathBuf,
    /// Blob key the entry list lives under; one per user or session scope.
    pub entries_key: String,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("moodjournal.sqlite3"),
            entries_key: DEFAULT_ENTRIES_KEY.into(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct JournalConfig {
    pub classifier: ClassifierSettings,
    pub debounce: DebounceSettings,
    pub storage: StorageSettings,
    #[serde(skip)]
    pub debug: bool,
}

impl JournalConfig {
    /// Reads the config file if present. A malformed file falls back to
    /// defaults rather than refusing to start. Environment overrides are
    /// applied afterwards.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_else(|err| {
                warn!("Ignoring malformed config at {}: {err}", path.display());
                JournalConfig::default()
            })
        } else {
            JournalConfig::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory {}", parent.display()))?;
        }
        let serialized = serde_json::to_string_pretty(self)?;
        fs::write(path, serialized)
            .with_context(|| format!("Failed to write config to {}", path.display()))
    }

    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(ENV_CLASSIFIER_URL) {
            self.classifier.endpoint = Some(url);
        }
        if let Some(key) = lookup(ENV_CLASSIFIER_KEY) {
            self.classifier.api_key = Some(key);
        }
        self.debug = lookup(ENV_DEBUG)
            .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
            .unwrap_or(self.debug);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let loaded = JournalConfig::load(&dir.path().join("absent.json")).unwrap();

        assert_eq!(loaded.debounce.quiet_period_ms, 1000);
        assert_eq!(loaded.storage.entries_key, "moodEntries");
        assert_eq!(loaded.classifier.request_timeout_secs, 30);
    }

    #[test]
    fn save_then_load_round_trips_partial_files() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let mut config = JournalConfig::default();
        config.classifier.endpoint = Some("http://localhost:9000/detect-mood".into());
        config.debounce.quiet_period_ms = 250;
        config.save(&path).unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["debounce"]["quiet_period_ms"], 250);

        fs::write(&path, r#"{ "debounce": { "quiet_period_ms": 400 } }"#).unwrap();
        let partial: JournalConfig = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(partial.debounce.quiet_period_ms, 400);
        assert_eq!(partial.storage, StorageSettings::default());
    }

    #[test]
    fn malformed_file_falls_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();

        let loaded = JournalConfig::load(&path).unwrap();
        assert_eq!(loaded.debounce, DebounceSettings::default());
    }

    #[test]
    fn env_overrides_win_over_file_values() {
        let env: HashMap<&str, &str> = HashMap::from([
            (ENV_CLASSIFIER_URL, "https://example.test/detect-mood"),
            (ENV_CLASSIFIER_KEY, "k-123"),
            (ENV_DEBUG, "TRUE"),
        ]);
        let mut config = JournalConfig::default();
        config.classifier.endpoint = Some("http://file-value".into());
        config.apply_overrides(|name| env.get(name).map(|v| v.to_string()));

        assert_eq!(
            config.classifier.endpoint.as_deref(),
            Some("https://example.test/detect-mood")
        );
        assert_eq!(config.classifier.api_key.as_deref(), Some("k-123"));
        assert!(config.debug);
    }
}
