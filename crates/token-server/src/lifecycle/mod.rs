//! Process start/stop discipline, independent of the token API.
//!
//! # Lifecycle
//!
//! ```text
//! Created ──bind──▶ Listening ──signal──▶ ShuttingDown ──drained / deadline──▶ Stopped
//! ```
//!
//! 1. [`Lifecycle::run`] spawns the signal watcher first, then binds the
//!    listener and serves.
//! 2. On the first signal the accept loop stops and every open connection is
//!    asked to finish its in-flight request.
//! 3. Connections still busy after [`SHUTDOWN_TIMEOUT`] are aborted and the
//!    condition is logged as a warning.
//!
//! There is exactly one shutdown attempt and no way back to `Listening`.

pub mod manager;
pub mod signal;

pub use manager::{Lifecycle, LifecycleState, StartupError, SHUTDOWN_TIMEOUT};
