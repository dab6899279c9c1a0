//! Diagnostics for custom resource handlers.
//!
//! This crate provides:
//! - `LogLevel` - Verbosity threshold, from `Disabled` to `Debug`
//! - `ResourceLogger` - Prefixed, leveled logging with request context
//! - `LogBuilder` - Fluent structured fields

mod logging;

pub use logging::*;
