//! CLI configuration.

use anyhow::{Context, Result};
use cfn_resource_sdk::cfn_resource_lifecycle::HandlerConfig;
use serde::{Deserialize, Serialize};

/// File names searched for, in order, in each directory.
pub const CONFIG_FILE_NAMES: [&str; 3] =
    ["cfn-resource.toml", ".cfn-resource.toml", "cfn-resource.json"];

/// CLI configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CliConfig {
    /// Settings handed to the lifecycle controller.
    #[serde(default)]
    pub handler: HandlerConfig,

    /// Defaults for locally simulated invocations.
    #[serde(default)]
    pub invocation: InvocationDefaults,
}

impl CliConfig {
    /// Load config from a file.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path))?;

        Self::parse(path, &content)
    }

    /// Parse config content, choosing the format by file extension.
    pub fn parse(path: &str, content: &str) -> Result<Self> {
        if path.ends_with(".json") {
            serde_json::from_str(content)
                .with_context(|| format!("Failed to parse JSON config: {}", path))
        } else {
            toml::from_str(content)
                .with_context(|| format!("Failed to parse TOML config: {}", path))
        }
    }
}

/// Invocation context values used when replaying events locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvocationDefaults {
    /// Log group reported in the context.
    #[serde(default = "default_log_group")]
    pub log_group: String,

    /// Log stream reported in the context.
    #[serde(default = "default_log_stream")]
    pub log_stream: String,

    /// Time left before the simulated platform deadline.
    #[serde(default = "default_remaining_ms")]
    pub remaining_ms: u64,

    /// Connect timeout of the callback client.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

fn default_log_group() -> String {
    "/aws/lambda/cfn-resource-local".to_string()
}

fn default_log_stream() -> String {
    "local/[$LATEST]cfn-resource".to_string()
}

fn default_remaining_ms() -> u64 {
    // Lambda's maximum timeout.
    900_000
}

fn default_connect_timeout_secs() -> u64 {
    10
}

impl Default for InvocationDefaults {
    fn default() -> Self {
        Self {
            log_group: default_log_group(),
            log_stream: default_log_stream(),
            remaining_ms: default_remaining_ms(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

/// Generate a default cfn-resource.toml config file.
pub fn generate_default_config() -> String {
    format!(
        r#"# cfn-resource configuration

[handler]
# disabled, error, warn, info or debug
log_level = "info"
# human or json
log_format = "human"
# Region used for the log link in failure reasons
region = "us-east-1"

[invocation]
log_group = "{log_group}"
log_stream = "{log_stream}"
remaining_ms = {remaining_ms}
connect_timeout_secs = {connect_timeout_secs}
"#,
        log_group = default_log_group(),
        log_stream = default_log_stream(),
        remaining_ms = default_remaining_ms(),
        connect_timeout_secs = default_connect_timeout_secs(),
    )
}
