//! Common error types shared across crates.

use thiserror::Error;

use crate::protocol::ErrorResponse;

/// Top-level service error type.
///
/// Variants map to HTTP status codes returned to callers:
/// - [`ServiceError::InvalidParameter`] → 400
/// - [`ServiceError::NotFound`] → 404
/// - [`ServiceError::SigningFailure`] → 500
/// - [`ServiceError::Internal`] → 500
#[derive(Debug, Error)]
pub enum ServiceError {
    /// A path or query parameter is missing, malformed, or outside its allowed set.
    #[error("invalid {field}: {reason}")]
    InvalidParameter {
        /// Name of the offending parameter as it appears in the route.
        field: String,
        /// Human-readable reason, safe to expose to callers.
        reason: String,
    },

    /// No route matches the request.
    #[error("not found")]
    NotFound,

    /// The token signer rejected the request.
    ///
    /// The detail is for server-side logs only and is never sent to callers.
    #[error("signing failure: {0}")]
    SigningFailure(String),

    /// An unexpected internal error occurred.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    /// Shorthand for [`ServiceError::InvalidParameter`].
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ServiceError::InvalidParameter {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Returns the HTTP status code that should be sent for this error.
    pub fn http_status(&self) -> u16 {
        match self {
            ServiceError::InvalidParameter { .. } => 400,
            ServiceError::NotFound => 404,
            ServiceError::SigningFailure(_) => 500,
            ServiceError::Internal(_) => 500,
        }
    }

    /// Build the body sent to the caller.
    ///
    /// Server-side failures collapse into a generic message so that signer
    /// details (which may mention identity configuration) never leave the process.
    pub fn to_response(&self) -> ErrorResponse {
        match self {
            ServiceError::InvalidParameter { field, reason } => {
                ErrorResponse::new("bad_request", format!("invalid {field}: {reason}"))
                    .with_field(field.clone())
            }
            ServiceError::NotFound => {
                ErrorResponse::new("not_found", "the requested resource does not exist")
            }
            ServiceError::SigningFailure(_) => {
                ErrorResponse::new("internal_error", "failed to generate token")
            }
            ServiceError::Internal(_) => {
                ErrorResponse::new("internal_error", "internal server error")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_status_codes() {
        assert_eq!(ServiceError::invalid("role", "x").http_status(), 400);
        assert_eq!(ServiceError::NotFound.http_status(), 404);
        assert_eq!(ServiceError::SigningFailure("x".into()).http_status(), 500);
        assert_eq!(ServiceError::Internal("x".into()).http_status(), 500);
    }

    #[test]
    fn display_includes_field_and_reason() {
        let e = ServiceError::invalid("uid", "must be a non-negative integer");
        let s = e.to_string();
        assert!(s.contains("uid"));
        assert!(s.contains("non-negative integer"));
    }

    #[test]
    fn invalid_parameter_response_names_field() {
        let body = ServiceError::invalid("tokentype", "unknown token type").to_response();
        assert_eq!(body.code, "bad_request");
        assert_eq!(body.field.as_deref(), Some("tokentype"));
    }

    #[test]
    fn signing_failure_response_hides_detail() {
        let body = ServiceError::SigningFailure("app certificate is empty".into()).to_response();
        assert_eq!(body.code, "internal_error");
        assert!(!body.message.contains("certificate"));
        assert!(body.field.is_none());
    }
}
