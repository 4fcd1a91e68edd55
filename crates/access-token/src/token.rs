//! [`AccessToken`]: the signed, versioned credential shared by RTC and RTM.

use std::collections::BTreeMap;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use hmac::{Hmac, Mac};
use rand::Rng;
use sha2::Sha256;
use thiserror::Error;

use crate::pack::{Packer, Unpacker};

type HmacSha256 = Hmac<Sha256>;

/// Version prefix that appears at the start of every token.
pub const VERSION: &str = "006";

/// How long the message timestamp stays valid after the token is built.
pub const MESSAGE_TTL_SECS: u32 = 24 * 3600;

/// Errors produced while building or parsing a token.
#[derive(Debug, Error)]
pub enum TokenError {
    /// The application id is empty.
    #[error("app id is empty")]
    MissingAppId,

    /// The application certificate is empty.
    #[error("app certificate is empty")]
    MissingAppCertificate,

    /// A length-prefixed field does not fit in a `u16`.
    #[error("field too long: {0} bytes")]
    FieldTooLong(usize),

    /// The token string is not a well-formed 006 token for this app id.
    #[error("invalid token format")]
    InvalidFormat,

    /// The channel name or uid does not match the token's checksums.
    #[error("token was not issued for this channel and uid")]
    Mismatch,

    /// HMAC verification failed.
    #[error("invalid token signature")]
    BadSignature,
}

/// Privileges that can be granted by a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u16)]
pub enum Privilege {
    JoinChannel = 1,
    PublishAudioStream = 2,
    PublishVideoStream = 3,
    PublishDataStream = 4,
    RtmLogin = 1000,
}

/// Signed portion of a token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Random value that makes otherwise identical tokens distinct.
    pub salt: u32,
    /// Unix seconds after which the message itself is stale.
    pub ts: u32,
    /// Privilege id → unix-seconds expiry (`0` means no expiry).
    pub privileges: BTreeMap<u16, u32>,
}

impl Message {
    fn pack(&self) -> Result<Vec<u8>, TokenError> {
        let mut p = Packer::new();
        p.put_u32(self.salt).put_u32(self.ts).put_privileges(&self.privileges)?;
        Ok(p.into_inner())
    }

    fn unpack(bytes: &[u8]) -> Result<Self, TokenError> {
        let mut u = Unpacker::new(bytes);
        let salt = u.get_u32()?;
        let ts = u.get_u32()?;
        let privileges = u.get_privileges()?;
        Ok(Self {
            salt,
            ts,
            privileges,
        })
    }

    /// Expiry of `privilege`, if granted.
    pub fn privilege_expiry(&self, privilege: Privilege) -> Option<u32> {
        self.privileges.get(&(privilege as u16)).copied()
    }
}

/// A token under construction.
#[derive(Debug, Clone)]
pub struct AccessToken {
    app_id: String,
    channel_name: String,
    uid: String,
    message: Message,
}

impl AccessToken {
    /// Start a token for `channel_name` / `uid` with a fresh random salt and
    /// a message timestamp [`MESSAGE_TTL_SECS`] in the future.
    pub fn new(
        app_id: impl Into<String>,
        channel_name: impl Into<String>,
        uid: impl Into<String>,
    ) -> Self {
        let salt = rand::thread_rng().gen_range(1..=99_999_999);
        let ts = crate::unix_now().saturating_add(MESSAGE_TTL_SECS);
        Self {
            app_id: app_id.into(),
            channel_name: channel_name.into(),
            uid: uid.into(),
            message: Message {
                salt,
                ts,
                privileges: BTreeMap::new(),
            },
        }
    }

    /// Override the salt and message timestamp.
    pub fn with_salt_and_ts(mut self, salt: u32, ts: u32) -> Self {
        self.message.salt = salt;
        self.message.ts = ts;
        self
    }

    /// Grant `privilege` until `expire_ts` (unix seconds).
    pub fn add_privilege(&mut self, privilege: Privilege, expire_ts: u32) -> &mut Self {
        self.message.privileges.insert(privilege as u16, expire_ts);
        self
    }

    pub fn message(&self) -> &Message {
        &self.message
    }

    /// Sign with `app_certificate` and encode.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::MissingAppId`] / [`TokenError::MissingAppCertificate`]
    /// when the identity is empty, and [`TokenError::FieldTooLong`] when the
    /// channel name or message cannot be length-prefixed.
    pub fn build(&self, app_certificate: &str) -> Result<String, TokenError> {
        if self.app_id.is_empty() {
            return Err(TokenError::MissingAppId);
        }
        if app_certificate.is_empty() {
            return Err(TokenError::MissingAppCertificate);
        }

        let msg = self.message.pack()?;
        let signature = sign(
            app_certificate,
            &self.app_id,
            &self.channel_name,
            &self.uid,
            &msg,
        )?;

        let mut content = Packer::new();
        content
            .put_bytes(&signature)?
            .put_u32(crc32fast::hash(self.channel_name.as_bytes()))
            .put_u32(crc32fast::hash(self.uid.as_bytes()))
            .put_bytes(&msg)?;

        Ok(format!(
            "{VERSION}{}{}",
            self.app_id,
            STANDARD.encode(content.into_inner())
        ))
    }

    /// Decode a token previously issued for `app_id`.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::InvalidFormat`] if the version, app id, base64 or
    /// packed layout does not match.
    pub fn parse(token: &str, app_id: &str) -> Result<ParsedToken, TokenError> {
        let body = token
            .strip_prefix(VERSION)
            .and_then(|rest| rest.strip_prefix(app_id))
            .ok_or(TokenError::InvalidFormat)?;
        let content = STANDARD
            .decode(body)
            .map_err(|_| TokenError::InvalidFormat)?;

        let mut u = Unpacker::new(&content);
        let signature = u.get_bytes()?.to_vec();
        let crc_channel_name = u.get_u32()?;
        let crc_uid = u.get_u32()?;
        let raw_message = u.get_bytes()?.to_vec();
        if !u.is_empty() {
            return Err(TokenError::InvalidFormat);
        }
        let message = Message::unpack(&raw_message)?;

        Ok(ParsedToken {
            app_id: app_id.to_owned(),
            signature,
            crc_channel_name,
            crc_uid,
            raw_message,
            message,
        })
    }
}

/// A decoded token, ready to be verified.
#[derive(Debug, Clone)]
pub struct ParsedToken {
    app_id: String,
    signature: Vec<u8>,
    crc_channel_name: u32,
    crc_uid: u32,
    raw_message: Vec<u8>,
    message: Message,
}

impl ParsedToken {
    pub fn message(&self) -> &Message {
        &self.message
    }

    /// Check that this token was issued for `channel_name` / `uid` and signed
    /// with `app_certificate`.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::Mismatch`] if the checksums differ and
    /// [`TokenError::BadSignature`] if the HMAC does not verify.
    pub fn verify(
        &self,
        app_certificate: &str,
        channel_name: &str,
        uid: &str,
    ) -> Result<(), TokenError> {
        if crc32fast::hash(channel_name.as_bytes()) != self.crc_channel_name
            || crc32fast::hash(uid.as_bytes()) != self.crc_uid
        {
            return Err(TokenError::Mismatch);
        }
        let mut mac = HmacSha256::new_from_slice(app_certificate.as_bytes())
            .map_err(|_| TokenError::MissingAppCertificate)?;
        mac.update(self.app_id.as_bytes());
        mac.update(channel_name.as_bytes());
        mac.update(uid.as_bytes());
        mac.update(&self.raw_message);
        mac.verify_slice(&self.signature)
            .map_err(|_| TokenError::BadSignature)
    }
}

fn sign(
    app_certificate: &str,
    app_id: &str,
    channel_name: &str,
    uid: &str,
    msg: &[u8],
) -> Result<Vec<u8>, TokenError> {
    let mut mac = HmacSha256::new_from_slice(app_certificate.as_bytes())
        .map_err(|_| TokenError::MissingAppCertificate)?;
    mac.update(app_id.as_bytes());
    mac.update(channel_name.as_bytes());
    mac.update(uid.as_bytes());
    mac.update(msg);
    Ok(mac.finalize().into_bytes().to_vec())
}
