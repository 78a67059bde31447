//! Pre-registration phase: collect NICK and USER, then create the session.

use super::ReplySender;
use crate::handlers::{HandlerError, Registry, pong};
use crate::proto::{Reply, Request, Response};
use crate::state::{Connection as ReplySink, DEFAULT_QUIT_REASON, Identity, Matrix, Uid, normalize};
use std::sync::Arc;
use tracing::debug;

/// Registration data gathered so far.
#[derive(Debug, Default)]
pub struct Handshake {
    nick: Option<String>,
    username: Option<String>,
    realname: String,
}

impl Handshake {
    /// Nickname to address numerics to before registration.
    pub fn display_nick(&self) -> &str {
        self.nick.as_deref().unwrap_or("*")
    }

    /// Feed one request received before registration.
    ///
    /// Returns the new session id as soon as both NICK and USER have been
    /// accepted and the nickname could be claimed.
    pub fn step(
        &mut self,
        req: &Request,
        matrix: &mut Matrix,
        registry: &Registry,
        sender: &Arc<ReplySender>,
    ) -> Option<Uid> {
        let server_name = matrix.server_info.name.clone();
        let result = match req.event_name.as_str() {
            "nick" => self.handle_nick(req, matrix, sender),
            "user" => self.handle_user(req),
            "ping" => {
                sender.respond_with(pong(&server_name, req.text_or_arg(0).unwrap_or("")));
                Ok(())
            }
            "quit" => {
                let message = match req.text_or_arg(0) {
                    Some(reason) => format!("Quit: {reason}"),
                    None => DEFAULT_QUIT_REASON.to_string(),
                };
                sender.respond_with(Reply::error(format!(
                    "Closing Link: {server_name} ({message})"
                )));
                sender.close_connection();
                return None;
            }
            other if registry.handles(other) => Err(HandlerError::NotRegistered),
            _ => Ok(()),
        };

        if let Err(e) = result {
            debug!(command = %req.event_name, error = %e, "Handshake command rejected");
            sender.respond_with(e.to_reply(
                &server_name,
                self.display_nick(),
                &req.event_name.to_ascii_uppercase(),
            ));
            return None;
        }
        self.try_register(matrix, sender)
    }

    fn handle_nick(
        &mut self,
        req: &Request,
        matrix: &Matrix,
        sender: &ReplySender,
    ) -> Result<(), HandlerError> {
        let Some(nick) = req.arg(0).or(req.text()).filter(|n| !n.is_empty()) else {
            sender.respond_with(Reply::numeric(
                &matrix.server_info.name,
                self.display_nick(),
                Response::ERR_NONICKNAMEGIVEN,
                Vec::new(),
                "No nickname given",
            ));
            return Ok(());
        };

        normalize(nick)?;
        if matrix.users.find(nick).is_some() {
            return Err(HandlerError::NicknameInUse(nick.to_string()));
        }
        self.nick = Some(nick.to_string());
        Ok(())
    }

    fn handle_user(&mut self, req: &Request) -> Result<(), HandlerError> {
        // USER <username> <mode> <unused> :<realname>
        let username = req
            .arg(0)
            .filter(|u| !u.is_empty())
            .ok_or(HandlerError::NeedMoreParams)?;
        self.username = Some(username.to_string());
        self.realname = req.text_or_arg(3).unwrap_or_default().to_string();
        Ok(())
    }

    fn try_register(&mut self, matrix: &mut Matrix, sender: &Arc<ReplySender>) -> Option<Uid> {
        let (Some(nick), Some(username)) = (&self.nick, &self.username) else {
            return None;
        };

        let connection: Arc<dyn ReplySink> = sender.clone();
        match matrix.register(
            nick,
            connection,
            Identity::new(username.as_str()),
            &self.realname,
        ) {
            Ok(uid) => Some(uid),
            Err(e) => {
                // Lost a race for the nickname; the client may pick another.
                sender.respond_with(e.to_reply(&matrix.server_info.name, "*", "NICK"));
                self.nick = None;
                None
            }
        }
    }
}
