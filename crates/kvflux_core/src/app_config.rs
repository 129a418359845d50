use crate::{ConfigError, DEFAULT_KEY_PATTERN};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Pattern used when a connection is expanded and when none was remembered.
    #[serde(default = "default_key_pattern")]
    pub default_key_pattern: String,

    /// Emit success toasts. Error toasts are always emitted.
    #[serde(default = "default_true")]
    pub notify_on_success: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            default_key_pattern: default_key_pattern(),
            notify_on_success: true,
        }
    }
}

fn default_key_pattern() -> String {
    DEFAULT_KEY_PATTERN.to_string()
}

fn default_true() -> bool {
    true
}

pub struct AppConfigStore {
    path: PathBuf,
}

impl AppConfigStore {
    pub fn new() -> Result<Self, ConfigError> {
        let config_dir = dirs::config_dir().ok_or_else(|| {
            ConfigError::IoError(std::io::Error::other("Could not find config directory"))
        })?;

        let app_dir = config_dir.join("kvflux");
        fs::create_dir_all(&app_dir)?;

        Ok(Self {
            path: app_dir.join("config.json"),
        })
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn load(&self) -> Result<AppConfig, ConfigError> {
        if !self.path.exists() {
            return Ok(AppConfig::default());
        }

        let content = fs::read_to_string(&self.path)?;
        let mut config: AppConfig =
            serde_json::from_str(&content).map_err(|e| ConfigError::Invalid(e.to_string()))?;

        if config.default_key_pattern.trim().is_empty() {
            log::warn!(
                "Empty default_key_pattern in {}, using \"{}\"",
                self.path.display(),
                DEFAULT_KEY_PATTERN
            );
            config.default_key_pattern = default_key_pattern();
        }

        Ok(config)
    }

    pub fn save(&self, config: &AppConfig) -> Result<(), ConfigError> {
        let content = serde_json::to_string_pretty(config)
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        fs::write(&self.path, content)?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store() -> (tempfile::TempDir, AppConfigStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = AppConfigStore::at(dir.path().join("config.json"));
        (dir, store)
    }

    #[test]
    fn missing_file_yields_defaults() {
        let (_dir, store) = temp_store();
        let config = store.load().unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.default_key_pattern, "*");
        assert!(config.notify_on_success);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let (_dir, store) = temp_store();
        fs::write(store.path(), r#"{"notify_on_success": false}"#).unwrap();

        let config = store.load().unwrap();
        assert!(!config.notify_on_success);
        assert_eq!(config.default_key_pattern, "*");
    }

    #[test]
    fn blank_pattern_falls_back() {
        let (_dir, store) = temp_store();
        fs::write(store.path(), r#"{"default_key_pattern": "  "}"#).unwrap();

        assert_eq!(store.load().unwrap().default_key_pattern, "*");
    }

    #[test]
    fn save_then_load() {
        let (_dir, store) = temp_store();
        let config = AppConfig {
            default_key_pattern: "user:*".into(),
            notify_on_success: false,
        };

        store.save(&config).unwrap();
        assert_eq!(store.load().unwrap(), config);
    }

    #[test]
    fn malformed_file_is_invalid() {
        let (_dir, store) = temp_store();
        fs::write(store.path(), "{not json").unwrap();

        assert!(matches!(store.load(), Err(ConfigError::Invalid(_))));
    }
}
