//! Token server library: configuration, lifecycle, signer seam and HTTP API.
//!
//! The binary in `main.rs` wires these together; they are exposed as a library
//! so the lifecycle and router can be driven directly from tests.

pub mod config;
pub mod lifecycle;
pub mod server;
pub mod signer;
pub mod telemetry;
