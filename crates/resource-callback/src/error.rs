//! Callback delivery errors.

use thiserror::Error;

/// Errors that prevent the callback from being delivered.
///
/// These are the only failures that propagate out of the lifecycle
/// controller: without a delivered callback there is no fallback channel.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CallbackError {
    /// The response URL cannot be used.
    #[error("Invalid response URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// The response body could not be serialized.
    #[error("Failed to serialize response: {0}")]
    Serialization(String),

    /// The request could not be sent or the connection was reset before
    /// a response began.
    #[error("Transport error: {0}")]
    Transport(String),
}

impl CallbackError {
    /// Check whether this is a transport-level failure.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

impl From<serde_json::Error> for CallbackError {
    fn from(e: serde_json::Error) -> Self {
        CallbackError::Serialization(e.to_string())
    }
}
