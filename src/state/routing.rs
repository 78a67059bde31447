//! Destination resolution and peer sets.

use crate::proto::is_channel_name;
use crate::state::{Matrix, Uid};
use std::collections::BTreeSet;

/// Where a message-like command is addressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target<'a> {
    Channel(&'a str),
    Nick(&'a str),
}

impl<'a> Target<'a> {
    /// A token starting with the channel sigil is a channel; anything else
    /// is a bare nickname.
    pub fn parse(token: &'a str) -> Self {
        if is_channel_name(token) {
            Target::Channel(token)
        } else {
            Target::Nick(token)
        }
    }
}

impl Matrix {
    /// The session itself plus everyone sharing at least one channel with
    /// it, each exactly once.
    ///
    /// This is the delivery set for presence changes (NICK, QUIT).
    pub fn peers_of(&self, uid: Uid) -> BTreeSet<Uid> {
        let mut peers = BTreeSet::from([uid]);
        for channel in self.channels.find_all_for_session(uid) {
            peers.extend(channel.members());
        }
        peers
    }
}
