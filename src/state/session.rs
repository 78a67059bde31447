//! Per-connection session state.

use crate::proto::{Reply, Response};
use crate::state::Uid;
use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

/// Quit message used when a link goes away without a QUIT reason.
pub const DEFAULT_QUIT_REASON: &str = "Connection closed";

/// Back-channel to the client owned by the transport.
///
/// Implementations must not block: handlers call these while holding the
/// shared state lock.
pub trait Connection: Send + Sync {
    /// Queue one reply for the client.
    fn respond_with(&self, reply: Reply);

    /// Ask the transport to close the link once queued replies are flushed.
    fn close_connection(&self);
}

/// Who the client says it is, as supplied by the identity collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub username: String,
}

impl Identity {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
        }
    }
}

/// Server-side state for one registered client.
pub struct Session {
    pub uid: Uid,
    /// Display form of the nickname. The registry key is its normalized form.
    pub nick: String,
    pub identity: Identity,
    pub realname: String,
    pub connected_at: DateTime<Utc>,
    pub last_activity: Instant,
    /// Reason recorded by QUIT, consumed by teardown.
    pub quit_reason: Option<String>,
    /// Set when the server drops the link itself; shown to peers verbatim.
    pub disconnect_reason: Option<String>,
    connection: Arc<dyn Connection>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("uid", &self.uid)
            .field("nick", &self.nick)
            .field("identity", &self.identity)
            .finish_non_exhaustive()
    }
}

impl Session {
    pub fn new(
        uid: Uid,
        nick: String,
        connection: Arc<dyn Connection>,
        identity: Identity,
        realname: String,
    ) -> Self {
        Self {
            uid,
            nick,
            identity,
            realname,
            connected_at: Utc::now(),
            last_activity: Instant::now(),
            quit_reason: None,
            disconnect_reason: None,
            connection,
        }
    }

    /// `nick!username@host` source for messages this session originates.
    pub fn source(&self, host: &str) -> String {
        format!("{}!{}@{}", self.nick, self.identity.username, host)
    }

    /// Hand a reply to this session's connection.
    #[inline]
    pub fn respond_with(&self, reply: Reply) {
        self.connection.respond_with(reply);
    }

    /// Send a numeric reply from `server_name` addressed to this session.
    pub fn numeric(&self, server_name: &str, response: Response, args: Vec<String>, text: &str) {
        self.respond_with(Reply::numeric(server_name, &self.nick, response, args, text));
    }

    /// Ask the transport to drop the link.
    pub fn close(&self) {
        self.connection.close_connection();
    }

    /// Record message activity.
    pub fn touch(&mut self) {
        self.last_activity = Instant::now();
    }

    /// Whole seconds since the last message-send command.
    pub fn idle(&self) -> u64 {
        self.last_activity.elapsed().as_secs()
    }

    /// The text peers see in this session's QUIT notice.
    pub fn quit_message(&self) -> String {
        if let Some(reason) = &self.disconnect_reason {
            return reason.clone();
        }
        match &self.quit_reason {
            Some(reason) => format!("Quit: {reason}"),
            None => DEFAULT_QUIT_REASON.to_string(),
        }
    }
}
