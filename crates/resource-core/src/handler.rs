//! Author handler contract and failure taxonomy.

use std::future::Future;

use async_trait::async_trait;

use crate::context::InvocationContext;
use crate::request::ResourceRequest;
use crate::response::ResourceResponse;

/// Business logic for one custom resource type.
///
/// Implementations must not send the callback themselves. Any error is
/// reported to the orchestrator as a FAILED response.
///
/// Implemented for plain async functions and closures:
///
/// ```ignore
/// async fn provision(
///     request: ResourceRequest,
///     _ctx: InvocationContext,
/// ) -> anyhow::Result<ResourceResponse> {
///     let name = request.property_str("BucketName").unwrap_or("default");
///     Ok(ResourceResponse::new().with_physical_id(name))
/// }
/// ```
#[async_trait]
pub trait ResourceHandler: Send + Sync + 'static {
    /// Handle one lifecycle request.
    async fn handle(
        &self,
        request: ResourceRequest,
        context: InvocationContext,
    ) -> anyhow::Result<ResourceResponse>;
}

#[async_trait]
impl<F, Fut> ResourceHandler for F
where
    F: Fn(ResourceRequest, InvocationContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<ResourceResponse>> + Send + 'static,
{
    async fn handle(
        &self,
        request: ResourceRequest,
        context: InvocationContext,
    ) -> anyhow::Result<ResourceResponse> {
        (self)(request, context).await
    }
}

/// Why the handler did not produce a result.
///
/// All of these are absorbed into a FAILED callback; none propagate.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HandlerFailure {
    /// The handler returned an error.
    #[error("{0}")]
    Error(String),

    /// The handler panicked.
    #[error("Handler panicked: {0}")]
    Panicked(String),

    /// The deadline elapsed before the handler settled.
    #[error("Custom Resource timeout")]
    Timeout,
}

impl HandlerFailure {
    /// Build from an author error, keeping its context chain.
    pub fn from_error(error: &anyhow::Error) -> Self {
        Self::Error(format!("{:#}", error))
    }
}
