// Runtime configuration.
// Loaded from config.json in the platform config directory, then overridden by environment.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const ENV_BASE_URL: &str = "FETCHCACHE_BASE_URL";
pub const ENV_TIMEOUT_SECS: &str = "FETCHCACHE_TIMEOUT_SECS";
pub const ENV_DISABLED: &str = "FETCHCACHE_DISABLED";

/// Default request timeout: 30 seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL that relative request paths are resolved against.
    pub base_url: Option<String>,
    /// Per-request timeout for the network backend.
    pub timeout_secs: u64,
    /// User-Agent sent by the network backend.
    pub user_agent: String,
    /// When false, the cache forwards every request and stores nothing.
    pub cache_enabled: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            user_agent: concat!("fetchcache/", env!("CARGO_PKG_VERSION")).to_string(),
            cache_enabled: true,
        }
    }
}

/// Path to the config file (~/.config/fetchcache/config.json on Linux).
pub fn config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "fetchcache").map(|dirs| dirs.config_dir().join("config.json"))
}

impl Config {
    /// Load config from the default location and the process environment.
    pub fn load() -> Result<Self> {
        let mut config = match config_path() {
            Some(path) if path.exists() => Self::from_file(&path)?,
            _ => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Read a JSON config file. Missing fields take their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&contents)?;
        Ok(config)
    }

    /// Apply overrides from an environment lookup.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(base_url) = lookup(ENV_BASE_URL).filter(|v| !v.is_empty()) {
            self.base_url = Some(base_url);
        }

        if let Some(timeout) = lookup(ENV_TIMEOUT_SECS) {
            self.timeout_secs = timeout.trim().parse().map_err(|_| {
                Error::Config(format!(
                    "{} must be an integer, got {:?}",
                    ENV_TIMEOUT_SECS, timeout
                ))
            })?;
        }

        if let Some(disabled) = lookup(ENV_DISABLED) {
            self.cache_enabled = !matches!(
                disabled.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            );
        }

        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
