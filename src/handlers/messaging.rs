//! Messaging handlers.
//!
//! Handles PRIVMSG and NOTICE commands for both users and channels.

use super::{Context, Handler, HandlerError, HandlerResult};
use crate::proto::{Reply, Request};
use crate::state::Target;
use tracing::trace;

/// Handler for PRIVMSG command.
pub struct PrivmsgHandler;

impl Handler for PrivmsgHandler {
    fn handle(&self, ctx: &mut Context<'_>, req: &Request) -> HandlerResult {
        route_message(ctx, req, "PRIVMSG")
    }
}

/// Handler for NOTICE command.
///
/// Routed exactly like PRIVMSG; only the verb differs.
pub struct NoticeHandler;

impl Handler for NoticeHandler {
    fn handle(&self, ctx: &mut Context<'_>, req: &Request) -> HandlerResult {
        route_message(ctx, req, "NOTICE")
    }
}

/// Deliver `<verb> <target> :<text>` from the requesting session.
///
/// Channel messages reach every member except the sender, and only members
/// may send. Direct messages reach the named session alone.
fn route_message(ctx: &mut Context<'_>, req: &Request, verb: &'static str) -> HandlerResult {
    // PRIVMSG <target> :<text>
    let target = req.arg(0).ok_or(HandlerError::NeedMoreParams)?;
    let text = req
        .text_or_arg(1)
        .filter(|t| !t.is_empty())
        .ok_or(HandlerError::NoTextToSend)?;

    let uid = ctx.uid;
    let matrix = &mut *ctx.matrix;
    matrix
        .users
        .get_mut(uid)
        .ok_or(HandlerError::NotRegistered)?
        .touch();

    let users = &matrix.users;
    let sender = users.get(uid).ok_or(HandlerError::NotRegistered)?;
    let reply = Reply::command(
        sender.source(&matrix.server_info.name),
        verb,
        vec![target.to_string()],
        Some(text),
    );

    match Target::parse(target) {
        Target::Channel(name) => {
            let channel = matrix.channels.find(name)?;
            if !channel.has_session(uid) {
                return Err(HandlerError::CannotSendToChannel(name.to_string()));
            }
            let delivered = channel.broadcast(users, &reply, Some(uid));
            trace!(channel = %name, recipients = delivered, "Channel message delivered");
        }
        Target::Nick(nick) => {
            let recipient = users
                .find(nick)
                .ok_or_else(|| HandlerError::NoSuchNickOrChannel(nick.to_string()))?;
            recipient.respond_with(reply);
            trace!(to = %recipient.uid, "Direct message delivered");
        }
    }
    Ok(())
}
