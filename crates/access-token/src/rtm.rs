//! Tokens for logging in to the messaging service.

use crate::token::{AccessToken, Privilege, TokenError};

/// Build a messaging login token for `user_id`.
///
/// The user id takes the channel position in the signed payload and the uid
/// position is left empty.
///
/// # Errors
///
/// Propagates [`TokenError`] from [`AccessToken::build`].
pub fn build_rtm_token(
    app_id: &str,
    app_certificate: &str,
    user_id: &str,
    privilege_expire_ts: u32,
) -> Result<String, TokenError> {
    let mut token = AccessToken::new(app_id, user_id, "");
    token.add_privilege(Privilege::RtmLogin, privilege_expire_ts);
    token.build(app_certificate)
}
