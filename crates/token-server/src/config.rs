//! Configuration loading and validation for the token server.
//!
//! All values are read from environment variables at startup. A missing
//! `APP_ID` or `APP_CERTIFICATE` is a fatal error: the process exits before any
//! socket is opened.

use std::net::SocketAddr;

use config::{builder::DefaultState, ConfigBuilder};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The environment could not be read or a value has the wrong type.
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    /// A required variable is absent or blank.
    #[error("{0} is required and must not be empty")]
    Missing(&'static str),

    /// A variable is present but out of range.
    #[error("{key} is invalid: {reason}")]
    Invalid {
        key: &'static str,
        reason: &'static str,
    },
}

/// Application id and certificate used to sign every token.
///
/// Immutable after startup and shared read-only by all request handlers.
/// The certificate is redacted from `Debug` output.
#[derive(Debug, Clone)]
pub struct ServiceIdentity {
    app_id: String,
    app_certificate: SecretString,
}

impl ServiceIdentity {
    pub fn new(app_id: impl Into<String>, app_certificate: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            app_certificate: SecretString::from(app_certificate.into()),
        }
    }

    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    /// The shared signing secret. Never log the returned value.
    pub fn app_certificate(&self) -> &str {
        self.app_certificate.expose_secret()
    }
}

/// Environment variables as read by the `config` crate (keys lower-cased).
#[derive(Deserialize)]
struct RawConfig {
    #[serde(default)]
    app_id: String,

    #[serde(default)]
    app_certificate: String,

    #[serde(default = "default_server_port")]
    server_port: u16,

    #[serde(default = "default_token_expiry")]
    token_expiry_secs: u32,

    #[serde(default = "default_log_level")]
    log_level: String,

    #[serde(default)]
    otel_exporter_otlp_endpoint: Option<String>,
}

fn default_server_port() -> u16 {
    8080
}
fn default_token_expiry() -> u32 {
    3600
}
fn default_log_level() -> String {
    "info".into()
}

/// Validated token server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// `APP_ID` / `APP_CERTIFICATE`. **Required.**
    pub identity: ServiceIdentity,

    /// Port the HTTP listener binds to on all interfaces.
    pub server_port: u16,

    /// Default token validity window when a request carries no `expiry`.
    pub token_expiry_secs: u32,

    /// Tracing log level (e.g. `"info"`, `"debug"`).
    pub log_level: String,

    /// OTLP collector endpoint. Span export is disabled when unset.
    pub otel_exporter_otlp_endpoint: Option<String>,
}

impl Config {
    /// Load and validate configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if any required variable is absent or cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_builder(config::Config::builder().add_source(config::Environment::default()))
    }

    fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        let raw: RawConfig = builder.build()?.try_deserialize()?;
        Self::validate(raw)
    }

    fn validate(raw: RawConfig) -> Result<Self, ConfigError> {
        if raw.app_id.trim().is_empty() {
            return Err(ConfigError::Missing("APP_ID"));
        }
        if raw.app_certificate.trim().is_empty() {
            return Err(ConfigError::Missing("APP_CERTIFICATE"));
        }
        if raw.token_expiry_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "TOKEN_EXPIRY_SECS",
                reason: "must be > 0",
            });
        }

        Ok(Self {
            identity: ServiceIdentity::new(raw.app_id, raw.app_certificate),
            server_port: raw.server_port,
            token_expiry_secs: raw.token_expiry_secs,
            log_level: raw.log_level,
            otel_exporter_otlp_endpoint: raw
                .otel_exporter_otlp_endpoint
                .filter(|e| !e.trim().is_empty()),
        })
    }

    /// Socket address the listener binds to.
    pub fn listen_addr(&self) -> SocketAddr {
        ([0, 0, 0, 0], self.server_port).into()
    }
}
