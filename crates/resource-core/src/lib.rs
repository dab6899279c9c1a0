//! Core data model for CloudFormation custom resource handlers.
//!
//! This crate provides the fundamental types and traits:
//! - `InvocationEvent` / `ResourceRequest` - What the orchestrator asked for
//! - `InvocationContext` - Remaining time and log identities of the invocation
//! - `ResourceResponse` - What the author's handler returns
//! - `Outcome` / `CallbackResponse` - What gets reported back
//! - `ResourceHandler` trait - Author handler interface

mod context;
mod handler;
mod request;
mod response;

pub use context::*;
pub use handler::*;
pub use request::*;
pub use response::*;
