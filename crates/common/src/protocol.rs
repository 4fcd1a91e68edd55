//! Response types returned by the public HTTP API.
//!
//! Field names follow the camelCase JSON keys that existing clients expect
//! (`rtcToken`, `rtmToken`).

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Token endpoints
// ---------------------------------------------------------------------------

/// Successful response body for `GET /rtc/...`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RtcTokenResponse {
    /// Signed credential for joining a real-time channel.
    #[serde(rename = "rtcToken")]
    pub rtc_token: String,
}

/// Successful response body for `GET /rtm/...`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RtmTokenResponse {
    /// Signed credential for logging in to the messaging service.
    #[serde(rename = "rtmToken")]
    pub rtm_token: String,
}

/// Successful response body for `GET /rte/...`.
///
/// Both fields are always present; a failure on either side yields an
/// [`ErrorResponse`] instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RteTokenResponse {
    /// Signed credential for joining a real-time channel.
    #[serde(rename = "rtcToken")]
    pub rtc_token: String,
    /// Signed credential for logging in to the messaging service.
    #[serde(rename = "rtmToken")]
    pub rtm_token: String,
}

// ---------------------------------------------------------------------------
// Error response
// ---------------------------------------------------------------------------

/// Standard error response body returned on any non-2xx status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Short machine-readable error code (e.g. `"bad_request"`).
    pub code: String,
    /// Human-readable description safe to expose to callers.
    pub message: String,
    /// Offending request parameter, present on validation errors only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl ErrorResponse {
    /// Construct an [`ErrorResponse`] from a code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            field: None,
        }
    }

    /// Attach the name of the parameter that failed validation.
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }
}

// ---------------------------------------------------------------------------
// Liveness
// ---------------------------------------------------------------------------

/// Response body for `GET /ping`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PingResponse {
    /// Always `"pong"`.
    pub message: String,
}

impl Default for PingResponse {
    fn default() -> Self {
        Self {
            message: "pong".into(),
        }
    }
}
