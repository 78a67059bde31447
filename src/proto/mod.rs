//! Line-level protocol types.
//!
//! [`Request`] is what the transport hands to a session after framing a raw
//! line; [`Reply`] is what the core asks a connection to emit. Neither type
//! knows anything about sessions or channels.

mod reply;
mod request;
mod response;

pub use reply::{Reply, Verb};
pub use request::Request;
pub use response::Response;

/// The only channel sigil this server understands.
pub const CHANNEL_SIGIL: char = '#';

/// Whether `target` names a channel rather than a nickname.
#[inline]
pub fn is_channel_name(target: &str) -> bool {
    target.starts_with(CHANNEL_SIGIL)
}
