//! Common types, protocol definitions, and errors shared across `token-server` crates.

pub mod error;
pub mod protocol;

pub use error::ServiceError;
