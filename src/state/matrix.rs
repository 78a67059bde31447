//! The Matrix: all shared server state.
//!
//! One `Matrix` exists per server instance. The transport wraps it in a
//! single lock, so every command and every teardown sees a consistent
//! registry and channel directory.

use crate::config::Config;
use crate::error::HandlerError;
use crate::proto::{Reply, Response};
use crate::state::{ChannelManager, Connection, Identity, Uid, UserManager};
use std::sync::Arc;
use tracing::info;

/// Static server identity.
#[derive(Debug, Clone)]
pub struct ServerInfo {
    /// Server name; also the host part of user sources.
    pub name: String,
    pub network: String,
    /// RPL_WHOISSERVER text.
    pub description: String,
    pub motd: Vec<String>,
}

impl Default for ServerInfo {
    fn default() -> Self {
        Self {
            name: "hector".to_string(),
            network: "Hector".to_string(),
            description: "Hard Hecting".to_string(),
            motd: Vec::new(),
        }
    }
}

impl From<&Config> for ServerInfo {
    fn from(config: &Config) -> Self {
        Self {
            name: config.server.name.clone(),
            network: config.server.network.clone(),
            description: config.server.description.clone(),
            motd: config.motd.lines.clone(),
        }
    }
}

/// Shared server state: nickname registry plus channel directory.
#[derive(Debug, Default)]
pub struct Matrix {
    pub server_info: ServerInfo,
    pub users: UserManager,
    pub channels: ChannelManager,
}

impl Matrix {
    pub fn new(server_info: ServerInfo) -> Self {
        Self {
            server_info,
            users: UserManager::new(),
            channels: ChannelManager::new(),
        }
    }

    /// Create a session and send it the welcome burst.
    pub fn register(
        &mut self,
        nick: &str,
        connection: Arc<dyn Connection>,
        identity: Identity,
        realname: &str,
    ) -> Result<Uid, HandlerError> {
        let uid = self.users.create(nick, connection, identity, realname)?;
        self.send_welcome(uid);
        Ok(uid)
    }

    /// RPL_WELCOME followed by the MOTD (or ERR_NOMOTD).
    fn send_welcome(&self, uid: Uid) {
        let Some(session) = self.users.get(uid) else {
            return;
        };
        let server = &self.server_info;

        info!(uid = %uid, nick = %session.nick, user = %session.identity.username, "Client registered");

        session.numeric(
            &server.name,
            Response::RPL_WELCOME,
            Vec::new(),
            &format!(
                "Welcome to the {} IRC Network {}",
                server.network,
                session.source(&server.name)
            ),
        );

        if server.motd.is_empty() {
            session.numeric(
                &server.name,
                Response::ERR_NOMOTD,
                Vec::new(),
                "MOTD File is missing",
            );
            return;
        }

        session.numeric(
            &server.name,
            Response::RPL_MOTDSTART,
            Vec::new(),
            &format!("- {} Message of the day - ", server.name),
        );
        for line in &server.motd {
            session.numeric(&server.name, Response::RPL_MOTD, Vec::new(), &format!("- {line}"));
        }
        session.numeric(
            &server.name,
            Response::RPL_ENDOFMOTD,
            Vec::new(),
            "End of /MOTD command.",
        );
    }

    /// Tear a session down.
    ///
    /// In order: QUIT notice to every peer but the session itself, the
    /// closing-link ERROR to the session, removal from every channel,
    /// removal from the registry. Runs at most once per session: a second
    /// call finds nothing and returns `false`.
    pub fn destroy(&mut self, uid: Uid) -> bool {
        let Some(session) = self.users.get(uid) else {
            return false;
        };
        let server_name = &self.server_info.name;
        let quit_message = session.quit_message();
        let nick = session.nick.clone();

        let quit = Reply::command(
            session.source(server_name),
            "QUIT",
            Vec::new(),
            Some(quit_message.as_str()),
        );
        let notified = self.users.broadcast_to(self.peers_of(uid), &quit, Some(uid));
        session.respond_with(Reply::error(format!(
            "Closing Link: {server_name} ({quit_message})"
        )));

        let parted = self.channels.remove_from_all(uid);
        self.users.delete(&nick);

        info!(
            uid = %uid,
            nick = %nick,
            reason = %quit_message,
            peers = notified,
            channels = parted,
            "Session destroyed"
        );
        true
    }
}
