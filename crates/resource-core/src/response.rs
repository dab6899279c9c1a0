//! Handler results and the callback wire format.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Output attributes exposed to `Fn::GetAtt`.
pub type ResponseData = HashMap<String, String>;

/// What the author's handler returns on success.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ResourceResponse {
    /// Physical identity of the resource. Derived when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub physical_resource_id: Option<String>,
    /// Output attributes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<ResponseData>,
    /// Mask the output when it is displayed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub no_echo: Option<bool>,
}

impl ResourceResponse {
    /// Create an empty response.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the physical resource id.
    pub fn with_physical_id(mut self, id: impl Into<String>) -> Self {
        self.physical_resource_id = Some(id.into());
        self
    }

    /// Add one output attribute.
    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.data
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
        self
    }

    /// Set the no-echo flag.
    pub fn with_no_echo(mut self, no_echo: bool) -> Self {
        self.no_echo = Some(no_echo);
        self
    }
}

/// Status reported to the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ResponseStatus {
    Success,
    Failed,
}

impl std::fmt::Display for ResponseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Success => write!(f, "SUCCESS"),
            Self::Failed => write!(f, "FAILED"),
        }
    }
}

/// The body PUT to the callback URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CallbackResponse {
    pub status: ResponseStatus,
    /// Failure explanation (FAILED only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub physical_resource_id: String,
    pub stack_id: String,
    pub request_id: String,
    pub logical_resource_id: String,
    /// Output attributes (SUCCESS only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<ResponseData>,
    /// Output masking flag (SUCCESS only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub no_echo: Option<bool>,
}

impl CallbackResponse {
    /// Check whether this reports success.
    pub fn is_success(&self) -> bool {
        self.status == ResponseStatus::Success
    }

    /// Serialize to the JSON body.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Settled result of one invocation, before it is shaped for the wire.
///
/// Produced exactly once and consumed by value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Success {
        physical_resource_id: Option<String>,
        data: Option<ResponseData>,
        no_echo: Option<bool>,
    },
    Failure {
        reason: String,
        physical_resource_id: Option<String>,
    },
}

impl Outcome {
    /// Success with nothing to report.
    pub fn empty_success() -> Self {
        Self::Success {
            physical_resource_id: None,
            data: None,
            no_echo: None,
        }
    }

    /// Failure with an optional physical id hint.
    pub fn failure(reason: impl Into<String>, physical_resource_id: Option<String>) -> Self {
        Self::Failure {
            reason: reason.into(),
            physical_resource_id,
        }
    }

    /// Check whether this is a success.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

impl From<ResourceResponse> for Outcome {
    fn from(response: ResourceResponse) -> Self {
        Self::Success {
            physical_resource_id: response.physical_resource_id,
            data: response.data,
            no_echo: response.no_echo,
        }
    }
}
