//! Leveled logging with request context.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Prefix on every emitted line.
pub const LOG_PREFIX: &str = "[cfn-resource]";

/// Verbosity threshold.
///
/// Ordered from quietest to noisiest; a logger emits every level at or
/// below its threshold.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Disabled,
    Error,
    #[default]
    Warn,
    Info,
    Debug,
}

impl LogLevel {
    /// Check whether a message at `level` passes this threshold.
    pub fn allows(self, level: LogLevel) -> bool {
        level != LogLevel::Disabled && level <= self
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disabled => write!(f, "DISABLED"),
            Self::Error => write!(f, "ERROR"),
            Self::Warn => write!(f, "WARN"),
            Self::Info => write!(f, "INFO"),
            Self::Debug => write!(f, "DEBUG"),
        }
    }
}

/// Error parsing a log level name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown log level '{0}' (expected disabled, error, warn, info or debug)")]
pub struct ParseLevelError(pub String);

impl FromStr for LogLevel {
    type Err = ParseLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "disabled" | "off" | "none" => Ok(Self::Disabled),
            "error" => Ok(Self::Error),
            "warn" | "warning" => Ok(Self::Warn),
            "info" => Ok(Self::Info),
            "debug" => Ok(Self::Debug),
            _ => Err(ParseLevelError(s.to_string())),
        }
    }
}

/// Output format for log lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable, the way the log viewer shows it best.
    #[default]
    Human,
    /// One JSON object per line (for log aggregation).
    Json,
}

/// A single log entry.
#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logical_resource_id: Option<String>,
    /// Additional structured fields.
    #[serde(flatten)]
    pub fields: HashMap<String, serde_json::Value>,
}

impl LogEntry {
    /// Format as JSON string.
    pub fn to_json(&self) -> String {
        let line = serde_json::to_string(self).unwrap_or_else(|_| self.message.clone());
        format!("{} {}", LOG_PREFIX, line)
    }

    /// Format as human-readable string.
    pub fn to_human(&self) -> String {
        let mut s = format!("{} [{}] {}", LOG_PREFIX, self.level, self.message);

        if let Some(ref id) = self.request_id {
            s.push_str(&format!(" (request {})", id));
        }

        if !self.fields.is_empty() {
            let mut fields: Vec<String> = self
                .fields
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect();
            fields.sort();
            s.push_str(" | ");
            s.push_str(&fields.join(" "));
        }

        s
    }
}

/// Leveled logger bound to one invocation.
///
/// The threshold is injected by the embedding application; there is no
/// global level. Lines are handed to `tracing` so the host decides where
/// they end up.
#[derive(Debug, Clone, Default)]
pub struct ResourceLogger {
    threshold: LogLevel,
    format: LogFormat,
    request_id: Option<String>,
    logical_resource_id: Option<String>,
}

impl ResourceLogger {
    /// Create a logger with the given threshold.
    pub fn new(threshold: LogLevel) -> Self {
        Self {
            threshold,
            ..Default::default()
        }
    }

    /// Set output format.
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Attach request correlation ids to every entry.
    pub fn with_request(
        mut self,
        request_id: impl Into<String>,
        logical_resource_id: impl Into<String>,
    ) -> Self {
        self.request_id = Some(request_id.into());
        self.logical_resource_id = Some(logical_resource_id.into());
        self
    }

    /// The configured threshold.
    pub fn threshold(&self) -> LogLevel {
        self.threshold
    }

    /// Check whether `level` would be emitted.
    pub fn enabled(&self, level: LogLevel) -> bool {
        self.threshold.allows(level)
    }

    /// Log at error level.
    pub fn error(&self, message: &str) {
        self.log(LogLevel::Error, message, HashMap::new());
    }

    /// Log at warn level.
    pub fn warn(&self, message: &str) {
        self.log(LogLevel::Warn, message, HashMap::new());
    }

    /// Log at info level.
    pub fn info(&self, message: &str) {
        self.log(LogLevel::Info, message, HashMap::new());
    }

    /// Log at debug level.
    pub fn debug(&self, message: &str) {
        self.log(LogLevel::Debug, message, HashMap::new());
    }

    /// Render a line, or `None` when the level is gated off.
    pub fn render(
        &self,
        level: LogLevel,
        message: &str,
        fields: HashMap<String, serde_json::Value>,
    ) -> Option<String> {
        if !self.enabled(level) {
            return None;
        }

        let entry = LogEntry {
            level,
            message: message.to_string(),
            request_id: self.request_id.clone(),
            logical_resource_id: self.logical_resource_id.clone(),
            fields,
        };

        Some(match self.format {
            LogFormat::Json => entry.to_json(),
            LogFormat::Human => entry.to_human(),
        })
    }

    fn log(&self, level: LogLevel, message: &str, fields: HashMap<String, serde_json::Value>) {
        let Some(line) = self.render(level, message, fields) else {
            return;
        };

        match level {
            LogLevel::Error => tracing::error!(target: "cfn_resource", "{}", line),
            LogLevel::Warn => tracing::warn!(target: "cfn_resource", "{}", line),
            LogLevel::Info => tracing::info!(target: "cfn_resource", "{}", line),
            LogLevel::Debug => tracing::debug!(target: "cfn_resource", "{}", line),
            LogLevel::Disabled => {}
        }
    }
}

/// Builder for log entries with fluent API.
pub struct LogBuilder<'a> {
    logger: &'a ResourceLogger,
    level: LogLevel,
    message: String,
    fields: HashMap<String, serde_json::Value>,
}

impl<'a> LogBuilder<'a> {
    /// Create a new log builder.
    pub fn new(logger: &'a ResourceLogger, level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            logger,
            level,
            message: message.into(),
            fields: HashMap::new(),
        }
    }

    /// Add a string field.
    pub fn field(mut self, key: &str, value: impl Into<String>) -> Self {
        self.fields
            .insert(key.to_string(), serde_json::json!(value.into()));
        self
    }

    /// Add an integer field.
    pub fn field_u64(mut self, key: &str, value: u64) -> Self {
        self.fields.insert(key.to_string(), serde_json::json!(value));
        self
    }

    /// Add any serializable value as a field.
    ///
    /// Skipped entirely when the level is gated off, so callers can pass
    /// large payloads without paying for serialization.
    pub fn field_json<T: Serialize + ?Sized>(mut self, key: &str, value: &T) -> Self {
        if !self.logger.enabled(self.level) {
            return self;
        }
        let value = serde_json::to_value(value)
            .unwrap_or_else(|e| serde_json::json!(format!("<unserializable: {}>", e)));
        self.fields.insert(key.to_string(), value);
        self
    }

    /// Add a duration field (in milliseconds).
    pub fn duration_ms(mut self, key: &str, duration: std::time::Duration) -> Self {
        self.fields
            .insert(key.to_string(), serde_json::json!(duration.as_millis() as u64));
        self
    }

    /// Render without emitting.
    pub fn render(self) -> Option<String> {
        self.logger.render(self.level, &self.message, self.fields)
    }

    /// Emit the log entry.
    pub fn emit(self) {
        self.logger.log(self.level, &self.message, self.fields);
    }
}

impl ResourceLogger {
    /// Start building an error log entry.
    pub fn error_builder(&self, message: impl Into<String>) -> LogBuilder<'_> {
        LogBuilder::new(self, LogLevel::Error, message)
    }

    /// Start building a warn log entry.
    pub fn warn_builder(&self, message: impl Into<String>) -> LogBuilder<'_> {
        LogBuilder::new(self, LogLevel::Warn, message)
    }

    /// Start building an info log entry.
    pub fn info_builder(&self, message: impl Into<String>) -> LogBuilder<'_> {
        LogBuilder::new(self, LogLevel::Info, message)
    }

    /// Start building a debug log entry.
    pub fn debug_builder(&self, message: impl Into<String>) -> LogBuilder<'_> {
        LogBuilder::new(self, LogLevel::Debug, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_ordering() {
        assert!(LogLevel::Disabled < LogLevel::Error);
        assert!(LogLevel::Error < LogLevel::Warn);
        assert!(LogLevel::Warn < LogLevel::Info);
        assert!(LogLevel::Info < LogLevel::Debug);
        assert_eq!(LogLevel::default(), LogLevel::Warn);
    }

    #[test]
    fn test_threshold_gating() {
        let warn = LogLevel::Warn;
        assert!(warn.allows(LogLevel::Error));
        assert!(warn.allows(LogLevel::Warn));
        assert!(!warn.allows(LogLevel::Info));
        assert!(!warn.allows(LogLevel::Debug));

        let disabled = LogLevel::Disabled;
        assert!(!disabled.allows(LogLevel::Error));
        assert!(!disabled.allows(LogLevel::Disabled));

        assert!(LogLevel::Debug.allows(LogLevel::Debug));
    }

    #[test]
    fn test_parse_level() {
        assert_eq!("debug".parse::<LogLevel>().unwrap(), LogLevel::Debug);
        assert_eq!("WARN".parse::<LogLevel>().unwrap(), LogLevel::Warn);
        assert_eq!(" info ".parse::<LogLevel>().unwrap(), LogLevel::Info);
        assert_eq!("off".parse::<LogLevel>().unwrap(), LogLevel::Disabled);
        assert!("verbose".parse::<LogLevel>().is_err());
    }

    #[test]
    fn test_render_is_prefixed() {
        let logger = ResourceLogger::new(LogLevel::Info);
        let line = logger
            .render(LogLevel::Info, "Sending response", HashMap::new())
            .unwrap();

        assert_eq!(line, "[cfn-resource] [INFO] Sending response");
    }

    #[test]
    fn test_render_gated_returns_none() {
        let logger = ResourceLogger::new(LogLevel::Warn);
        assert!(logger.render(LogLevel::Debug, "EVENT", HashMap::new()).is_none());
        assert!(logger.render(LogLevel::Error, "ERROR", HashMap::new()).is_some());

        let silent = ResourceLogger::new(LogLevel::Disabled);
        assert!(silent.render(LogLevel::Error, "ERROR", HashMap::new()).is_none());
    }

    #[test]
    fn test_render_human_with_request_and_fields() {
        let logger = ResourceLogger::new(LogLevel::Debug).with_request("req-1", "MyResource");
        let line = logger
            .debug_builder("HTTP response")
            .field_u64("status", 200)
            .field("url", "https://example.com")
            .render()
            .unwrap();

        assert_eq!(
            line,
            r#"[cfn-resource] [DEBUG] HTTP response (request req-1) | status=200 url="https://example.com""#
        );
    }

    #[test]
    fn test_render_json() {
        let logger = ResourceLogger::new(LogLevel::Error)
            .with_format(LogFormat::Json)
            .with_request("req-1", "MyResource");
        let line = logger
            .error_builder("ERROR")
            .field("reason", "boom")
            .render()
            .unwrap();

        let json = line.strip_prefix("[cfn-resource] ").unwrap();
        let value: serde_json::Value = serde_json::from_str(json).unwrap();
        assert_eq!(value["level"], "error");
        assert_eq!(value["message"], "ERROR");
        assert_eq!(value["request_id"], "req-1");
        assert_eq!(value["logical_resource_id"], "MyResource");
        assert_eq!(value["reason"], "boom");
    }

    #[test]
    fn test_field_json_skipped_when_gated() {
        let logger = ResourceLogger::new(LogLevel::Warn);
        let builder = logger
            .debug_builder("EVENT")
            .field_json("event", &serde_json::json!({"big": "payload"}));

        assert!(builder.fields.is_empty());
        assert!(builder.render().is_none());
    }

    #[test]
    fn test_duration_field() {
        let logger = ResourceLogger::new(LogLevel::Info);
        let line = logger
            .info_builder("Timer armed")
            .duration_ms("budget_ms", std::time::Duration::from_millis(1500))
            .render()
            .unwrap();

        assert!(line.ends_with("| budget_ms=1500"));
    }
}
