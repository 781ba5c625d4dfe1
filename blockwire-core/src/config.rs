// Configuration for blockwire tools and embedders

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

const LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

/// Block construction defaults
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlockConfig {
    /// Validate row kinds and cell types while normalizing rows
    pub types_check: bool,
}

impl Default for BlockConfig {
    fn default() -> Self {
        Self { types_check: false }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlockwireConfig {
    pub block: BlockConfig,
    pub logging: LoggingConfig,
}

impl BlockwireConfig {
    /// Load configuration from file
    pub fn from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Parse configuration, trying TOML first and YAML second
    pub fn from_str(content: &str) -> Result<Self> {
        if let Ok(config) = toml::from_str::<BlockwireConfig>(content) {
            return Ok(config);
        }

        serde_yaml::from_str::<BlockwireConfig>(content)
            .map_err(|e| Error::Configuration(format!("Unrecognized config format: {}", e)))
    }

    /// Defaults overridden by `BLOCKWIRE_*` environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env(|key| std::env::var(key).ok());
        config
    }

    fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(flag) = lookup("BLOCKWIRE_TYPES_CHECK").and_then(|v| parse_bool(&v)) {
            self.block.types_check = flag;
        }

        if let Some(level) = lookup("BLOCKWIRE_LOG_LEVEL") {
            self.logging.level = level.to_lowercase();
        }

        if let Some(flag) = lookup("BLOCKWIRE_LOG_JSON").and_then(|v| parse_bool(&v)) {
            self.logging.json = flag;
        }
    }

    /// Merge with another configuration (other takes precedence)
    pub fn merge(&mut self, other: BlockwireConfig) {
        self.block = other.block;
        self.logging = other.logging;
    }

    pub fn validate(&self) -> Result<()> {
        if !LOG_LEVELS.contains(&self.logging.level.as_str()) {
            return Err(Error::Configuration(format!(
                "logging.level must be one of {}, got '{}'",
                LOG_LEVELS.join(", "),
                self.logging.level
            )));
        }
        Ok(())
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = BlockwireConfig::default();
        assert!(!config.block.types_check);
        assert_eq!(config.logging.level, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_toml() {
        let config = BlockwireConfig::from_str(
            r#"
            [block]
            types_check = true

            [logging]
            level = "debug"
            "#,
        )
        .unwrap();
        assert!(config.block.types_check);
        assert_eq!(config.logging.level, "debug");
        assert!(!config.logging.json);
    }

    #[test]
    fn test_from_yaml() {
        let config = BlockwireConfig::from_str("logging:\n  level: warn\n  json: true\n").unwrap();
        assert_eq!(config.logging.level, "warn");
        assert!(config.logging.json);
        assert!(!config.block.types_check);
    }

    #[test]
    fn test_unparseable() {
        let result = BlockwireConfig::from_str("block: [unclosed");
        assert!(matches!(result, Err(Error::Configuration(_))));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("BLOCKWIRE_TYPES_CHECK", "yes"),
            ("BLOCKWIRE_LOG_LEVEL", "TRACE"),
            ("BLOCKWIRE_LOG_JSON", "maybe"),
        ]
        .into_iter()
        .collect();

        let mut config = BlockwireConfig::default();
        config.apply_env(|key| env.get(key).map(|v| v.to_string()));
        assert!(config.block.types_check);
        assert_eq!(config.logging.level, "trace");
        assert!(!config.logging.json);
    }

    #[test]
    fn test_validate_log_level() {
        let mut config = BlockwireConfig::default();
        config.logging.level = "loud".to_string();
        assert!(matches!(config.validate(), Err(Error::Configuration(_))));
    }

    #[test]
    fn test_merge() {
        let mut base = BlockwireConfig::default();
        let mut other = BlockwireConfig::default();
        other.block.types_check = true;
        base.merge(other.clone());
        assert_eq!(base, other);
    }
}
