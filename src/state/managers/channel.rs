//! Channel directory.
//!
//! Channel names are kept exactly as first joined and looked up
//! case-sensitively. Channels persist once created, even when empty.

use crate::error::HandlerError;
use crate::proto::is_channel_name;
use crate::state::{Channel, Uid};
use std::collections::HashMap;

/// Owns every channel on the server.
#[derive(Debug, Default)]
pub struct ChannelManager {
    channels: HashMap<String, Channel>,
}

impl ChannelManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up an existing channel.
    pub fn find(&self, name: &str) -> Result<&Channel, HandlerError> {
        self.channels
            .get(name)
            .ok_or_else(|| HandlerError::NoSuchNickOrChannel(name.to_string()))
    }

    /// Look up an existing channel for modification.
    pub fn find_mut(&mut self, name: &str) -> Result<&mut Channel, HandlerError> {
        self.channels
            .get_mut(name)
            .ok_or_else(|| HandlerError::NoSuchNickOrChannel(name.to_string()))
    }

    /// Look up a channel, creating it if absent.
    ///
    /// Names without the channel sigil are rejected.
    pub fn find_or_create(&mut self, name: &str) -> Result<&mut Channel, HandlerError> {
        if !is_channel_name(name) || name.len() < 2 || name.contains([' ', ',', '\x07']) {
            return Err(HandlerError::NoSuchNickOrChannel(name.to_string()));
        }
        Ok(self
            .channels
            .entry(name.to_string())
            .or_insert_with(|| {
                tracing::debug!(channel = %name, "Channel created");
                Channel::new(name)
            }))
    }

    /// Every channel `uid` is currently a member of, sorted by name.
    ///
    /// This scan is the authoritative source of a session's channel list.
    pub fn find_all_for_session(&self, uid: Uid) -> Vec<&Channel> {
        let mut found: Vec<&Channel> = self
            .channels
            .values()
            .filter(|channel| channel.has_session(uid))
            .collect();
        found.sort_by(|a, b| a.name.cmp(&b.name));
        found
    }

    /// Drop `uid` from every channel without notifying anyone.
    pub fn remove_from_all(&mut self, uid: Uid) -> usize {
        self.channels
            .values_mut()
            .map(|channel| channel.remove(uid))
            .filter(|removed| *removed)
            .count()
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
}
