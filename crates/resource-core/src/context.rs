//! Execution context of a single invocation.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tokio::time::Instant;

/// Read-only facts about the running invocation.
///
/// The deadline is fixed at construction; [`remaining_time`] decreases
/// monotonically from there.
///
/// [`remaining_time`]: InvocationContext::remaining_time
#[derive(Debug, Clone)]
pub struct InvocationContext {
    deadline: Instant,
    /// Log group the invocation writes to.
    pub log_group_name: String,
    /// Log stream the invocation writes to.
    pub log_stream_name: String,
    /// Request id assigned by the compute platform.
    pub aws_request_id: Option<String>,
    /// Name of the function being invoked.
    pub function_name: Option<String>,
}

impl InvocationContext {
    /// Create a context with `remaining` time left from now.
    pub fn new(
        log_group_name: impl Into<String>,
        log_stream_name: impl Into<String>,
        remaining: Duration,
    ) -> Self {
        Self {
            deadline: Instant::now() + remaining,
            log_group_name: log_group_name.into(),
            log_stream_name: log_stream_name.into(),
            aws_request_id: None,
            function_name: None,
        }
    }

    /// Create a context from an absolute deadline in milliseconds since the
    /// Unix epoch, as reported by the runtime API.
    pub fn from_deadline_ms(
        log_group_name: impl Into<String>,
        log_stream_name: impl Into<String>,
        deadline_ms: u64,
    ) -> Self {
        let now_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;
        let remaining = Duration::from_millis(deadline_ms.saturating_sub(now_ms));
        Self::new(log_group_name, log_stream_name, remaining)
    }

    /// Set the platform request id.
    pub fn with_request_id(mut self, id: impl Into<String>) -> Self {
        self.aws_request_id = Some(id.into());
        self
    }

    /// Set the function name.
    pub fn with_function_name(mut self, name: impl Into<String>) -> Self {
        self.function_name = Some(name.into());
        self
    }

    /// Time left before the platform kills the invocation.
    pub fn remaining_time(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    /// The absolute deadline.
    pub fn deadline(&self) -> Instant {
        self.deadline
    }
}
