//! Tokens for joining a real-time channel.

use crate::token::{AccessToken, Privilege, TokenError};

/// Permission level within a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RtcRole {
    /// May join and publish audio, video and data streams.
    Publisher,
    /// May join only.
    Subscriber,
}

/// Identity the token is bound to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RtcUser {
    /// Numeric user id. `0` leaves the token unbound to a specific uid.
    Uid(u32),
    /// Opaque user account string.
    Account(String),
}

impl RtcUser {
    /// The uid string covered by the signature.
    pub fn as_signed_str(&self) -> String {
        match self {
            RtcUser::Uid(0) => String::new(),
            RtcUser::Uid(uid) => uid.to_string(),
            RtcUser::Account(account) => account.clone(),
        }
    }
}

/// Build a channel token for `user` with `role`, whose privileges expire at
/// `privilege_expire_ts` (unix seconds).
///
/// # Errors
///
/// Propagates [`TokenError`] from [`AccessToken::build`].
pub fn build_rtc_token(
    app_id: &str,
    app_certificate: &str,
    channel_name: &str,
    user: &RtcUser,
    role: RtcRole,
    privilege_expire_ts: u32,
) -> Result<String, TokenError> {
    let mut token = AccessToken::new(app_id, channel_name, user.as_signed_str());
    token.add_privilege(Privilege::JoinChannel, privilege_expire_ts);
    if role == RtcRole::Publisher {
        token
            .add_privilege(Privilege::PublishAudioStream, privilege_expire_ts)
            .add_privilege(Privilege::PublishVideoStream, privilege_expire_ts)
            .add_privilege(Privilege::PublishDataStream, privilege_expire_ts);
    }
    token.build(app_certificate)
}
