//! Configuration management for the CLI

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const DEFAULT_SERVER_URL: &str = "http://localhost:8080";

/// CLI configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Server URL
    pub server_url: Option<String>,
}

impl Config {
    /// Load configuration from file
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content =
            std::fs::read_to_string(&config_path).context("Failed to read config file")?;

        serde_json::from_str(&content).context("Failed to parse config file")
    }

    /// Save configuration to file
    #[allow(dead_code)]
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let content = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(&config_path, content).context("Failed to write config file")?;

        Ok(())
    }

    /// Get the configuration file path
    fn config_path() -> Result<PathBuf> {
        let home = dirs_next::home_dir().context("Could not determine home directory")?;
        Ok(home.join(".config").join("oms").join("config.json"))
    }
}

/// Resolve the server URL: explicit flag or env first, then the config
/// file, then the default.
pub fn resolve_server_url(flag: Option<String>) -> String {
    if let Some(url) = flag {
        return url;
    }
    if let Ok(config) = Config::load() {
        if let Some(url) = config.server_url {
            return url;
        }
    }
    DEFAULT_SERVER_URL.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_wins_over_everything() {
        let url = resolve_server_url(Some("http://example:9999".to_string()));
        assert_eq!(url, "http://example:9999");
    }

    #[test]
    fn falls_back_to_default_without_flag_or_config() {
        // The config file may or may not exist on the test machine; either
        // way the result must be a usable URL.
        let url = resolve_server_url(None);
        assert!(url.starts_with("http"));
    }
}
