//! Version 006 access tokens for real-time channels (RTC) and messaging (RTM).
//!
//! This crate is intentionally free of HTTP and runtime dependencies. It
//! provides the signing primitives used by the token server.
//!
//! # Token format
//!
//! ```text
//! "006" <app id> base64(
//!     u16 len | HMAC-SHA256(cert, app_id ‖ channel ‖ uid ‖ message)
//!     u32     | crc32(channel)
//!     u32     | crc32(uid)
//!     u16 len | message = salt:u32 ts:u32 count:u16 (privilege:u16 expire:u32)*
//! )
//! ```
//!
//! All integers are little endian. The salt is random per token, so two tokens
//! built from identical inputs are different strings that both verify.

mod pack;
pub mod rtc;
pub mod rtm;
pub mod token;

pub use rtc::{build_rtc_token, RtcRole, RtcUser};
pub use rtm::build_rtm_token;
pub use token::{AccessToken, Message, ParsedToken, Privilege, TokenError, VERSION};

use std::time::{SystemTime, UNIX_EPOCH};

/// Current wall-clock time as unix seconds, saturated to `u32`.
pub fn unix_now() -> u32 {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    u32::try_from(secs).unwrap_or(u32::MAX)
}
