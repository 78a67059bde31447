//! Domain managers for server state.
//!
//! Each manager owns one slice of the Matrix: `user` is the nickname
//! registry, `channel` the channel directory.

pub mod channel;
pub mod user;
