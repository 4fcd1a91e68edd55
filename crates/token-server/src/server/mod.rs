//! Token issuance HTTP API.
//!
//! # Responsibilities
//! - Define the Axum router with the three token routes and shared middleware.
//! - Validate and normalise path/query parameters into signer grants.
//! - Inject shared application state (`AppState`) into handlers.
//!
//! The router never touches the listening socket; [`crate::lifecycle`] serves it.

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod params;
pub mod router;
pub mod state;
