//! `token-server` — binary entry point.
//!
//! Startup sequence:
//! 1. Load and validate [`Config`] from environment variables.
//! 2. Initialise the telemetry pipeline.
//! 3. Build the Axum router around the access-token signer.
//! 4. Serve until SIGINT/SIGTERM, then drain for at most two seconds.

use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use token_server::{
    config::Config,
    lifecycle::{self, Lifecycle, StartupError},
    server::{self, state::AppState},
    signer::AccessTokenSigner,
    telemetry,
};

#[tokio::main]
async fn main() -> Result<()> {
    // -----------------------------------------------------------------------
    // 1. Configuration
    // -----------------------------------------------------------------------
    let cfg = Config::from_env().map_err(|e| {
        // Telemetry is not yet up; write to stderr directly.
        eprintln!("FATAL: configuration invalid: {e}");
        StartupError::from(e)
    })?;

    // -----------------------------------------------------------------------
    // 2. Telemetry
    // -----------------------------------------------------------------------
    telemetry::init_telemetry(cfg.otel_exporter_otlp_endpoint.as_deref(), &cfg.log_level)?;
    info!(
        version = env!("CARGO_PKG_VERSION"),
        port = cfg.server_port,
        token_expiry_secs = cfg.token_expiry_secs,
        "token-server starting"
    );

    // -----------------------------------------------------------------------
    // 3. Router
    // -----------------------------------------------------------------------
    let state = AppState::new(
        cfg.identity.clone(),
        Arc::new(AccessTokenSigner),
        cfg.token_expiry_secs,
    );
    let router = server::router::build(state);

    // -----------------------------------------------------------------------
    // 4. Serve until interrupted
    // -----------------------------------------------------------------------
    let result = Lifecycle::new(router)
        .run(cfg.listen_addr(), lifecycle::signal::shutdown_signal())
        .await;

    telemetry::shutdown_telemetry();
    result?;

    info!("shutdown complete");
    Ok(())
}
