//! Handler configuration.

use cfn_resource_observability::{LogFormat, LogLevel, ParseLevelError};
use serde::{Deserialize, Serialize};

/// Environment variable holding the deployment region.
pub const REGION_ENV: &str = "AWS_REGION";

/// Environment variable overriding the log threshold.
pub const LOG_LEVEL_ENV: &str = "CFN_RESOURCE_LOG_LEVEL";

/// Error loading handler configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid CFN_RESOURCE_LOG_LEVEL: {0}")]
    InvalidLogLevel(#[from] ParseLevelError),
}

/// Configuration injected into the lifecycle controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandlerConfig {
    /// Diagnostics threshold.
    #[serde(default)]
    pub log_level: LogLevel,
    /// Diagnostics line format.
    #[serde(default)]
    pub log_format: LogFormat,
    /// Region used to build the log viewer link in failure reasons.
    #[serde(default = "default_region")]
    pub region: String,
}

fn default_region() -> String {
    "us-east-1".to_string()
}

impl Default for HandlerConfig {
    fn default() -> Self {
        Self {
            log_level: LogLevel::default(),
            log_format: LogFormat::default(),
            region: default_region(),
        }
    }
}

impl HandlerConfig {
    /// Create a configuration with the given log level.
    pub fn new(log_level: LogLevel) -> Self {
        Self {
            log_level,
            ..Default::default()
        }
    }

    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(region) = lookup(REGION_ENV).filter(|r| !r.is_empty()) {
            config.region = region;
        }
        if let Some(level) = lookup(LOG_LEVEL_ENV) {
            config.log_level = level.parse()?;
        }

        Ok(config)
    }

    /// Set the log level.
    pub fn with_log_level(mut self, level: LogLevel) -> Self {
        self.log_level = level;
        self
    }

    /// Set the log format.
    pub fn with_log_format(mut self, format: LogFormat) -> Self {
        self.log_format = format;
        self
    }

    /// Set the region.
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = HandlerConfig::default();

        assert_eq!(config.log_level, LogLevel::Warn);
        assert_eq!(config.log_format, LogFormat::Human);
        assert_eq!(config.region, "us-east-1");
    }

    #[test]
    fn test_from_lookup_reads_region_and_level() {
        let config = HandlerConfig::from_lookup(lookup(&[
            ("AWS_REGION", "eu-west-1"),
            ("CFN_RESOURCE_LOG_LEVEL", "debug"),
        ]))
        .unwrap();

        assert_eq!(config.region, "eu-west-1");
        assert_eq!(config.log_level, LogLevel::Debug);
    }

    #[test]
    fn test_from_lookup_empty_environment() {
        let config = HandlerConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, HandlerConfig::default());
    }

    #[test]
    fn test_from_lookup_ignores_empty_region() {
        let config = HandlerConfig::from_lookup(lookup(&[("AWS_REGION", "")])).unwrap();
        assert_eq!(config.region, "us-east-1");
    }

    #[test]
    fn test_from_lookup_invalid_level() {
        let err = HandlerConfig::from_lookup(lookup(&[("CFN_RESOURCE_LOG_LEVEL", "loud")]))
            .unwrap_err();
        assert!(err.to_string().contains("CFN_RESOURCE_LOG_LEVEL"));
    }

    #[test]
    fn test_builder_chain() {
        let config = HandlerConfig::new(LogLevel::Info)
            .with_log_format(LogFormat::Json)
            .with_region("ap-southeast-2");

        assert_eq!(config.log_level, LogLevel::Info);
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.region, "ap-southeast-2");
        assert_eq!(config.with_log_level(LogLevel::Error).log_level, LogLevel::Error);
    }

    #[test]
    fn test_deserialize_partial() {
        let config: HandlerConfig = serde_json::from_str(r#"{"log_level":"info"}"#).unwrap();

        assert_eq!(config.log_level, LogLevel::Info);
        assert_eq!(config.region, "us-east-1");
    }
}
