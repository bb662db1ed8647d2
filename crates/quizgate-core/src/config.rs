//! Application configuration management.
//!
//! This module handles loading and saving the application configuration:
//! the API base address, request timeout, where the session is kept and the
//! last used username.
//!
//! Configuration is stored at `~/.config/quizgate/config.json`. The
//! `QUIZGATE_BASE_URL` and `QUIZGATE_TIMEOUT_SECS` environment variables
//! override the file.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::api::DEFAULT_TIMEOUT_SECS;
use crate::auth::{FileStorage, KeyValueStorage, KeyringStorage, MemoryStorage};

/// Application name used for config/cache directory paths
const APP_NAME: &str = "quizgate";

/// Config file name
const CONFIG_FILE: &str = "config.json";

pub const DEFAULT_BASE_URL: &str = "http://localhost:5000/api";

const ENV_BASE_URL: &str = "QUIZGATE_BASE_URL";
const ENV_TIMEOUT_SECS: &str = "QUIZGATE_TIMEOUT_SECS";

/// Where the session is persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// `session.json` in the cache directory
    #[default]
    File,
    /// OS keychain
    Keyring,
    /// Not persisted; gone when the process exits
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub base_url: String,
    pub timeout_secs: u64,
    pub storage: StorageBackend,
    pub last_username: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            storage: StorageBackend::default(),
            last_username: None,
        }
    }
}

impl Config {
    /// Load from the config file, then apply environment overrides.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            serde_json::from_str(&contents).context("Failed to parse config file")?
        } else {
            Self::default()
        };
        config.normalize();
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Replace values that would make every request fail.
    fn normalize(&mut self) {
        if self.timeout_secs == 0 {
            warn!("Ignoring timeout_secs = 0 in config file");
            self.timeout_secs = DEFAULT_TIMEOUT_SECS;
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Apply overrides from `lookup`, normally the process environment.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(ENV_BASE_URL).filter(|u| !u.is_empty()) {
            self.base_url = url;
        }
        if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
            match raw.parse::<u64>() {
                Ok(secs) if secs > 0 => self.timeout_secs = secs,
                _ => warn!(value = %raw, "Ignoring invalid {}", ENV_TIMEOUT_SECS),
            }
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    /// Persistence medium selected by `storage`
    pub fn open_storage(&self) -> Result<Arc<dyn KeyValueStorage>> {
        Ok(match self.storage {
            StorageBackend::File => Arc::new(FileStorage::in_dir(&self.cache_dir()?)),
            StorageBackend::Keyring => Arc::new(KeyringStorage::new()),
            StorageBackend::Memory => Arc::new(MemoryStorage::new()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.base_url, "http://localhost:5000/api");
        assert_eq!(config.timeout(), Duration::from_secs(10));
        assert_eq!(config.storage, StorageBackend::File);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: Config = serde_json::from_str(r#"{"base_url": "https://quiz.example.com/api"}"#).unwrap();
        assert_eq!(config.base_url, "https://quiz.example.com/api");
        assert_eq!(config.timeout_secs, 10);

        let config: Config = serde_json::from_str(r#"{"storage": "keyring"}"#).unwrap();
        assert_eq!(config.storage, StorageBackend::Keyring);
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config.apply_env(env(&[
            ("QUIZGATE_BASE_URL", "https://quiz.example.com/api/"),
            ("QUIZGATE_TIMEOUT_SECS", "25"),
        ]));
        assert_eq!(config.base_url, "https://quiz.example.com/api/");
        assert_eq!(config.timeout_secs, 25);
    }

    #[test]
    fn test_invalid_env_timeout_ignored() {
        let mut config = Config::default();
        config.apply_env(env(&[("QUIZGATE_TIMEOUT_SECS", "soon"), ("QUIZGATE_BASE_URL", "")]));
        assert_eq!(config.timeout_secs, 10);
        assert_eq!(config.base_url, DEFAULT_BASE_URL);

        config.apply_env(env(&[("QUIZGATE_TIMEOUT_SECS", "0")]));
        assert_eq!(config.timeout_secs, 10);
    }

    #[test]
    fn test_zero_timeout_in_file_falls_back_to_default() {
        let mut config: Config = serde_json::from_str(r#"{"timeout_secs": 0}"#).unwrap();
        config.normalize();
        assert_eq!(config.timeout(), Duration::from_secs(10));

        let mut config: Config = serde_json::from_str(r#"{"timeout_secs": 30}"#).unwrap();
        config.normalize();
        assert_eq!(config.timeout_secs, 30);
    }
}
