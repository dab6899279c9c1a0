//! Callback delivery to the orchestrator.
//!
//! This crate provides:
//! - `CallbackSender` - Serializes a response and issues exactly one PUT
//! - `CallbackTransport` - The HTTP seam
//! - `ReqwestTransport` - Production transport
//! - `RecordingTransport` - In-memory transport for tests and dry runs

mod error;
mod sender;
mod transport;

pub use error::*;
pub use sender::*;
pub use transport::*;
