//! Invocation payload sent by the orchestrator.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Free-form resource property bag.
pub type Properties = Map<String, Value>;

/// Kind of lifecycle operation requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequestType {
    Create,
    Update,
    Delete,
}

impl std::fmt::Display for RequestType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Create => write!(f, "Create"),
            Self::Update => write!(f, "Update"),
            Self::Delete => write!(f, "Delete"),
        }
    }
}

/// Operation-specific part of a request.
///
/// Update and Delete always refer to a resource that already has a physical
/// identity, so they carry it structurally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "RequestType")]
pub enum Operation {
    Create,
    Update {
        #[serde(rename = "PhysicalResourceId")]
        physical_resource_id: String,
        #[serde(rename = "OldResourceProperties", default)]
        old_resource_properties: Properties,
    },
    Delete {
        #[serde(rename = "PhysicalResourceId")]
        physical_resource_id: String,
    },
}

impl Operation {
    /// Get the request type of this operation.
    pub fn request_type(&self) -> RequestType {
        match self {
            Self::Create => RequestType::Create,
            Self::Update { .. } => RequestType::Update,
            Self::Delete { .. } => RequestType::Delete,
        }
    }

    /// Physical identity of the existing resource, if any.
    pub fn physical_resource_id(&self) -> Option<&str> {
        match self {
            Self::Create => None,
            Self::Update {
                physical_resource_id,
                ..
            }
            | Self::Delete {
                physical_resource_id,
            } => Some(physical_resource_id),
        }
    }
}

/// The resource request as forwarded to the author's handler.
///
/// The callback URL is deliberately absent; it only lives on
/// [`InvocationEvent`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ResourceRequest {
    /// Create, Update or Delete plus their operation-specific fields.
    #[serde(flatten)]
    pub operation: Operation,
    /// ARN of the function that received the request.
    #[serde(default)]
    pub service_token: String,
    /// Stack that owns the resource.
    pub stack_id: String,
    /// Correlation id for this request.
    pub request_id: String,
    /// Template name of the resource.
    pub logical_resource_id: String,
    /// Custom resource type, e.g. `Custom::Bucket`.
    #[serde(default)]
    pub resource_type: String,
    /// Properties from the template.
    #[serde(default)]
    pub resource_properties: Properties,
}

impl ResourceRequest {
    /// Create a request for the given operation with empty properties.
    pub fn new(
        operation: Operation,
        stack_id: impl Into<String>,
        request_id: impl Into<String>,
        logical_resource_id: impl Into<String>,
    ) -> Self {
        Self {
            operation,
            service_token: String::new(),
            stack_id: stack_id.into(),
            request_id: request_id.into(),
            logical_resource_id: logical_resource_id.into(),
            resource_type: String::new(),
            resource_properties: Properties::new(),
        }
    }

    /// Set the resource type.
    pub fn with_resource_type(mut self, resource_type: impl Into<String>) -> Self {
        self.resource_type = resource_type.into();
        self
    }

    /// Set a single resource property.
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.resource_properties.insert(key.into(), value.into());
        self
    }

    /// Get the request type.
    pub fn request_type(&self) -> RequestType {
        self.operation.request_type()
    }

    /// Physical identity of the existing resource (Update and Delete only).
    pub fn physical_resource_id(&self) -> Option<&str> {
        self.operation.physical_resource_id()
    }

    /// Properties before the update (Update only).
    pub fn old_resource_properties(&self) -> Option<&Properties> {
        match &self.operation {
            Operation::Update {
                old_resource_properties,
                ..
            } => Some(old_resource_properties),
            _ => None,
        }
    }

    /// Get a string-valued resource property.
    pub fn property_str(&self, name: &str) -> Option<&str> {
        self.resource_properties.get(name).and_then(Value::as_str)
    }
}

/// Complete payload of one invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvocationEvent {
    /// Pre-signed URL that receives the single callback.
    #[serde(rename = "ResponseURL")]
    pub response_url: String,
    /// Everything else, forwarded to the handler.
    #[serde(flatten)]
    pub request: ResourceRequest,
}

impl InvocationEvent {
    /// Create an event from a callback URL and a request.
    pub fn new(response_url: impl Into<String>, request: ResourceRequest) -> Self {
        Self {
            response_url: response_url.into(),
            request,
        }
    }

    /// Parse an event from its JSON representation.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Split into the callback URL and the request forwarded to the handler.
    pub fn into_parts(self) -> (String, ResourceRequest) {
        (self.response_url, self.request)
    }
}
