//! Public SDK for CloudFormation custom resource handlers.
//!
//! This crate re-exports everything a handler author needs:
//!
//! ```ignore
//! use cfn_resource_sdk::prelude::*;
//!
//! async fn bucket(request: ResourceRequest, _ctx: InvocationContext) -> anyhow::Result<ResourceResponse> {
//!     let name = request.property_str("BucketName").unwrap_or("default");
//!     Ok(ResourceResponse::new()
//!         .with_physical_id(name)
//!         .with_data("Arn", format!("arn:aws:s3:::{name}")))
//! }
//!
//! let function = wrap_handler(bucket, LogLevel::Info)?;
//! let delivery = function.handle(event, context).await?;
//! ```

use std::time::Duration;

use cfn_resource_callback::{CallbackError, ReqwestTransport};
use cfn_resource_core::ResourceHandler;
use cfn_resource_lifecycle::{ConfigError, HandlerConfig, LifecycleController, LOG_LEVEL_ENV};
use cfn_resource_observability::LogLevel;

pub use cfn_resource_callback;
pub use cfn_resource_core;
pub use cfn_resource_lifecycle;
pub use cfn_resource_observability;

/// Connect timeout of the production callback client.
pub const CALLBACK_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// A handler wrapped for deployment, delivering callbacks over HTTPS.
pub type CustomResourceFunction<H> = LifecycleController<H, ReqwestTransport>;

/// Error wrapping a handler.
#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to build callback client: {0}")]
    Transport(#[from] CallbackError),
}

/// Wrap an author handler into a deployable function.
///
/// The region comes from `AWS_REGION`. `CFN_RESOURCE_LOG_LEVEL`, when set,
/// overrides `log_level`.
pub fn wrap_handler<H: ResourceHandler>(
    handler: H,
    log_level: LogLevel,
) -> Result<CustomResourceFunction<H>, SetupError> {
    let config = resolve_config(log_level, |key| std::env::var(key).ok())?;
    wrap_handler_with_config(handler, config)
}

/// Wrap an author handler with an explicit configuration.
pub fn wrap_handler_with_config<H: ResourceHandler>(
    handler: H,
    config: HandlerConfig,
) -> Result<CustomResourceFunction<H>, SetupError> {
    let transport = ReqwestTransport::new(CALLBACK_CONNECT_TIMEOUT)?;
    Ok(LifecycleController::new(handler, transport, config))
}

fn resolve_config<F>(log_level: LogLevel, lookup: F) -> Result<HandlerConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let config = HandlerConfig::from_lookup(&lookup)?;
    if lookup(LOG_LEVEL_ENV).is_some() {
        Ok(config)
    } else {
        Ok(config.with_log_level(log_level))
    }
}

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{wrap_handler, wrap_handler_with_config, CustomResourceFunction, SetupError};
    pub use cfn_resource_callback::*;
    pub use cfn_resource_core::*;
    pub use cfn_resource_lifecycle::*;
    pub use cfn_resource_observability::*;
}
