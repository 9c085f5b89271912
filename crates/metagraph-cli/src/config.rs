//! CLI configuration

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::output::OutputFormat;

/// Environment variable overriding the config file location
pub const CONFIG_ENV: &str = "METAGRAPH_CONFIG";

/// Get the config file path
pub fn config_file_path() -> PathBuf {
    match std::env::var_os(CONFIG_ENV) {
        Some(path) if !path.is_empty() => PathBuf::from(path),
        _ => dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("metagraph")
            .join("config.toml"),
    }
}

/// Configuration for the CLI
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Default output format: json, pretty, table
    pub output_format: String,

    /// Log filter used when no -v flag or RUST_LOG is given
    pub log_level: String,

    /// Stop a replay at the first failing event
    pub fail_fast: bool,

    /// Events derived concurrently during a replay
    pub concurrency: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_format: "pretty".to_string(),
            log_level: "warn".to_string(),
            fail_fast: false,
            concurrency: 4,
        }
    }
}

impl Config {
    /// Load from `path`; a missing file yields defaults
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            tracing::debug!("No config file at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Self = toml::from_str(&contents)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)
            .with_context(|| format!("Failed to write config file {}", path.display()))?;
        Ok(())
    }

    /// All settable keys
    pub fn keys() -> &'static [&'static str] {
        &["output_format", "log_level", "fail_fast", "concurrency"]
    }

    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "output_format" => Some(self.output_format.clone()),
            "log_level" => Some(self.log_level.clone()),
            "fail_fast" => Some(self.fail_fast.to_string()),
            "concurrency" => Some(self.concurrency.to_string()),
            _ => None,
        }
    }

    pub fn set(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        match key {
            "output_format" => {
                value.parse::<OutputFormat>()?;
                self.output_format = value.to_lowercase();
            }
            "log_level" => self.log_level = value.to_string(),
            "fail_fast" => {
                self.fail_fast = value
                    .parse()
                    .with_context(|| format!("fail_fast must be true or false, got '{}'", value))?
            }
            "concurrency" => {
                self.concurrency = value
                    .parse()
                    .with_context(|| format!("concurrency must be a number, got '{}'", value))?;
            }
            _ => anyhow::bail!(
                "Unknown config key: {}. Available keys: {}",
                key,
                Self::keys().join(", ")
            ),
        }
        self.validate()
    }

    fn validate(&self) -> anyhow::Result<()> {
        self.output_format.parse::<OutputFormat>()?;
        if self.concurrency == 0 {
            anyhow::bail!("concurrency must be at least 1");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let config = Config::load_from(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_round_trip_through_toml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.set("output_format", "JSON").unwrap();
        config.set("fail_fast", "true").unwrap();
        config.set("concurrency", "8").unwrap();
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.get("output_format").as_deref(), Some("json"));
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "concurrency = 2\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.concurrency, 2);
        assert_eq!(config.log_level, "warn");
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut config = Config::default();
        assert!(config.set("concurrency", "0").is_err());
        assert!(config.set("concurrency", "many").is_err());
        assert!(config.set("output_format", "xml").is_err());
        assert!(config.set("colour", "red").is_err());
        assert!(config.get("colour").is_none());
    }
}
