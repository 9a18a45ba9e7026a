//! Application configuration management.
//!
//! Configuration is stored at `~/.config/learnpath/config.json` and covers
//! where the knowledge-map service lives, where local data is kept, and how
//! long cached knowledge points stay fresh. `LEARNPATH_API_URL` overrides
//! the service URL.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::api::client::DEFAULT_REQUEST_TIMEOUT_SECS;

/// Application name used for config/data directory paths
const APP_NAME: &str = "learnpath";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Environment variable overriding `api_base_url`
pub const API_URL_ENV: &str = "LEARNPATH_API_URL";

const DEFAULT_API_BASE_URL: &str = "http://localhost:8080/api";

const DEFAULT_CACHE_TTL_HOURS: i64 = 24;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_base_url: String,
    /// Overrides the platform data directory.
    pub data_dir: Option<PathBuf>,
    pub request_timeout_secs: u64,
    pub cache_ttl_hours: i64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            data_dir: None,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            cache_ttl_hours: DEFAULT_CACHE_TTL_HOURS,
        }
    }
}

impl Config {
    /// Load from the default location, then apply environment overrides.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&Self::config_path()?)?;
        config.apply_api_url_override(std::env::var(API_URL_ENV).ok());
        Ok(config)
    }

    /// Load from `path`, falling back to defaults when the file is missing.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Directory holding the knowledge cache and progress store.
    pub fn data_dir(&self) -> Result<PathBuf> {
        if let Some(ref dir) = self.data_dir {
            return Ok(dir.clone());
        }
        let data_dir = dirs::data_local_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?;
        Ok(data_dir.join(APP_NAME))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Knowledge cache TTL. Values that are not positive or do not fit a
    /// `chrono::Duration` fall back to the default.
    pub fn cache_ttl(&self) -> chrono::Duration {
        chrono::Duration::try_hours(self.cache_ttl_hours)
            .filter(|ttl| *ttl > chrono::Duration::zero())
            .unwrap_or_else(|| {
                warn!(
                    cache_ttl_hours = self.cache_ttl_hours,
                    default = DEFAULT_CACHE_TTL_HOURS,
                    "Invalid cache TTL in config, using default"
                );
                chrono::Duration::hours(DEFAULT_CACHE_TTL_HOURS)
            })
    }

    fn apply_api_url_override(&mut self, value: Option<String>) {
        if let Some(url) = value.filter(|v| !v.trim().is_empty()) {
            self.api_base_url = url.trim().to_string();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = Config::load_from(&dir.path().join("config.json")).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.cache_ttl(), chrono::Duration::hours(24));
        assert_eq!(config.request_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("learnpath").join("config.json");

        let config = Config {
            api_base_url: "https://learn.example.com/api".to_string(),
            data_dir: Some(dir.path().join("data")),
            request_timeout_secs: 3,
            cache_ttl_hours: 6,
        };
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.data_dir().unwrap(), dir.path().join("data"));
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"cache_ttl_hours": 1}"#).unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.cache_ttl_hours, 1);
        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
    }

    #[test]
    fn test_invalid_cache_ttl_uses_default() {
        for hours in [0, -3, i64::MAX, i64::MIN] {
            let config = Config {
                cache_ttl_hours: hours,
                ..Config::default()
            };
            assert_eq!(config.cache_ttl(), chrono::Duration::hours(24), "hours = {}", hours);
        }

        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"cache_ttl_hours": 9223372036854775807}"#).unwrap();
        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.cache_ttl(), chrono::Duration::hours(24));
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{").unwrap();
        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn test_api_url_override() {
        let mut config = Config::default();
        config.apply_api_url_override(Some("  ".to_string()));
        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);

        config.apply_api_url_override(Some("https://other.example.com ".to_string()));
        assert_eq!(config.api_base_url, "https://other.example.com");

        config.apply_api_url_override(None);
        assert_eq!(config.api_base_url, "https://other.example.com");
    }
}
