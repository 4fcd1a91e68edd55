//! Path and query parameters, and their validation into signer grants.
//!
//! Every check reports the offending field by its route name (`channelName`,
//! `role`, `tokentype`, `uid`, `expiry`). Unknown values are rejected, never
//! defaulted.

use std::str::FromStr;

use access_token::{RtcRole, RtcUser};
use common::ServiceError;
use serde::Deserialize;

use crate::signer::Grant;

/// `/rtc/{channelName}/{role}/{tokentype}/{uid}/` and `/rte/...`.
#[derive(Debug, Deserialize)]
pub struct ChannelPath {
    #[serde(rename = "channelName")]
    pub channel_name: String,
    pub role: String,
    pub tokentype: String,
    pub uid: String,
}

/// `/rtm/{uid}/`.
#[derive(Debug, Deserialize)]
pub struct UserPath {
    pub uid: String,
}

/// Optional query string accepted by every token route.
#[derive(Debug, Default, Deserialize)]
pub struct TokenQuery {
    /// Validity window in seconds, overriding the configured default.
    pub expiry: Option<String>,
}

impl TokenQuery {
    /// Resolve the validity window, falling back to `default_secs`.
    pub fn expiry_secs(&self, default_secs: u32) -> Result<u32, ServiceError> {
        match self.expiry.as_deref() {
            None => Ok(default_secs),
            Some(raw) => match raw.parse::<u32>() {
                Ok(secs) if secs > 0 => Ok(secs),
                _ => Err(ServiceError::invalid(
                    "expiry",
                    "must be a positive number of seconds",
                )),
            },
        }
    }
}

/// Whether `uid` is a numeric user id or an opaque account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenType {
    Uid,
    Account,
}

impl FromStr for TokenType {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "uid" => Ok(TokenType::Uid),
            "account" => Ok(TokenType::Account),
            _ => Err(ServiceError::invalid(
                "tokentype",
                "must be one of: uid, account",
            )),
        }
    }
}

fn parse_role(s: &str) -> Result<RtcRole, ServiceError> {
    match s {
        "publisher" => Ok(RtcRole::Publisher),
        "subscriber" => Ok(RtcRole::Subscriber),
        _ => Err(ServiceError::invalid(
            "role",
            "must be one of: publisher, subscriber",
        )),
    }
}

fn parse_user(token_type: TokenType, uid: &str) -> Result<RtcUser, ServiceError> {
    match token_type {
        TokenType::Uid => uid.parse::<u32>().map(RtcUser::Uid).map_err(|_| {
            ServiceError::invalid("uid", "must be a non-negative 32-bit integer")
        }),
        TokenType::Account if uid.is_empty() => {
            Err(ServiceError::invalid("uid", "must not be empty"))
        }
        TokenType::Account => Ok(RtcUser::Account(uid.to_owned())),
    }
}

/// A validated channel token request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenRequest {
    pub channel_name: String,
    pub role: RtcRole,
    pub user: RtcUser,
    /// `uid` exactly as it appeared in the path.
    pub uid: String,
}

impl TryFrom<ChannelPath> for TokenRequest {
    type Error = ServiceError;

    fn try_from(path: ChannelPath) -> Result<Self, Self::Error> {
        if path.channel_name.is_empty() {
            return Err(ServiceError::invalid("channelName", "must not be empty"));
        }
        let role = parse_role(&path.role)?;
        let token_type: TokenType = path.tokentype.parse()?;
        let user = parse_user(token_type, &path.uid)?;
        Ok(Self {
            channel_name: path.channel_name,
            role,
            user,
            uid: path.uid,
        })
    }
}

impl TokenRequest {
    pub fn rtc_grant(&self) -> Grant {
        Grant::Rtc {
            channel_name: self.channel_name.clone(),
            user: self.user.clone(),
            role: self.role,
        }
    }

    /// Messaging grant for the same caller, keyed by the raw `uid`.
    pub fn rtm_grant(&self) -> Grant {
        Grant::Rtm {
            user_id: self.uid.clone(),
        }
    }
}

/// Validate `/rtm/{uid}/`.
pub fn rtm_grant(path: UserPath) -> Result<Grant, ServiceError> {
    if path.uid.is_empty() {
        return Err(ServiceError::invalid("uid", "must not be empty"));
    }
    Ok(Grant::Rtm { user_id: path.uid })
}
