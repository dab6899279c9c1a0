//! Built-in handlers for local invocations.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use cfn_resource_sdk::prelude::*;
use serde_json::Value;

use super::HandlerKind;

/// Handler logic selectable from the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuiltinHandler {
    /// Succeed, returning scalar resource properties as Data.
    Echo,
    /// Fail with the given message.
    Fail(String),
    /// Sleep for the given time, then succeed. Used to probe the deadline.
    Sleep(Duration),
}

impl BuiltinHandler {
    /// Build the handler selected on the command line.
    pub fn from_kind(kind: HandlerKind, message: &str, sleep: Duration) -> Self {
        match kind {
            HandlerKind::Echo => Self::Echo,
            HandlerKind::Fail => Self::Fail(message.to_string()),
            HandlerKind::Sleep => Self::Sleep(sleep),
        }
    }
}

#[async_trait]
impl ResourceHandler for BuiltinHandler {
    async fn handle(
        &self,
        request: ResourceRequest,
        _context: InvocationContext,
    ) -> Result<ResourceResponse> {
        match self {
            Self::Echo => Ok(echo(&request)),
            Self::Fail(message) => anyhow::bail!("{}", message),
            Self::Sleep(duration) => {
                tokio::time::sleep(*duration).await;
                Ok(ResourceResponse::new())
            }
        }
    }
}

/// Data values must be strings; nested values are sent as JSON text.
fn echo(request: &ResourceRequest) -> ResourceResponse {
    request
        .resource_properties
        .iter()
        .filter(|(key, _)| key.as_str() != "ServiceToken")
        .fold(ResourceResponse::new(), |response, (key, value)| {
            let value = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            response.with_data(key.as_str(), value)
        })
}
