//! State management module.
//!
//! Contains the Matrix (shared server state) and related entities.

mod channel;
mod managers;
mod matrix;
mod routing;
mod session;
mod uid;

#[cfg(test)]
pub(crate) mod testing;

pub use channel::{Channel, Topic};
pub use managers::channel::ChannelManager;
pub use managers::user::{UserManager, normalize};
pub use matrix::{Matrix, ServerInfo};
pub use routing::Target;
pub use session::{Connection, DEFAULT_QUIT_REASON, Identity, Session};
pub use uid::{Uid, UidGenerator};
