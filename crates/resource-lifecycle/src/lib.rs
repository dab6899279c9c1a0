//! Request lifecycle for CloudFormation custom resources.
//!
//! This crate drives one invocation end to end:
//! - `LifecycleController` - Races the handler against the deadline and
//!   sends exactly one callback
//! - `ResponseNormalizer` - Shapes outcomes into the wire format
//! - `resolve_physical_id` - Physical identity policy
//! - `HandlerConfig` - Injected log level, format and region

mod config;
mod controller;
mod identity;
mod normalize;

pub use config::*;
pub use controller::*;
pub use identity::*;
pub use normalize::*;
