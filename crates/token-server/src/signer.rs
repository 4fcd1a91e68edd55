//! Token signing seam between the HTTP layer and the `access-token` crate.
//!
//! Handlers depend only on [`TokenSigner`], so tests can substitute a mock and
//! the signing scheme can change without touching routing.

use access_token::{RtcRole, RtcUser, TokenError};
use thiserror::Error;

use crate::config::ServiceIdentity;

/// What a token should authorise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Grant {
    /// Join `channel_name` as `user` with `role`.
    Rtc {
        channel_name: String,
        user: RtcUser,
        role: RtcRole,
    },
    /// Log in to the messaging service as `user_id`.
    Rtm { user_id: String },
}

/// Opaque signer failure. The message may mention identity configuration and
/// must stay server-side.
#[derive(Debug, Error)]
#[error("token signing failed: {0}")]
pub struct SignError(#[from] pub TokenError);

/// Produces signed credentials.
#[cfg_attr(test, mockall::automock)]
pub trait TokenSigner: Send + Sync {
    /// Sign `grant` for `identity`, valid until `expire_at` (unix seconds).
    fn sign(
        &self,
        identity: &ServiceIdentity,
        grant: &Grant,
        expire_at: u32,
    ) -> Result<String, SignError>;
}

/// [`TokenSigner`] backed by version 006 access tokens.
#[derive(Debug, Clone, Copy, Default)]
pub struct AccessTokenSigner;

impl TokenSigner for AccessTokenSigner {
    fn sign(
        &self,
        identity: &ServiceIdentity,
        grant: &Grant,
        expire_at: u32,
    ) -> Result<String, SignError> {
        let token = match grant {
            Grant::Rtc {
                channel_name,
                user,
                role,
            } => access_token::build_rtc_token(
                identity.app_id(),
                identity.app_certificate(),
                channel_name,
                user,
                *role,
                expire_at,
            )?,
            Grant::Rtm { user_id } => access_token::build_rtm_token(
                identity.app_id(),
                identity.app_certificate(),
                user_id,
                expire_at,
            )?,
        };
        Ok(token)
    }
}
