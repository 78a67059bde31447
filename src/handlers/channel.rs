//! Channel handlers: JOIN, PART, NAMES, TOPIC.

use super::{Context, Handler, HandlerError, HandlerResult};
use crate::proto::Request;
use crate::state::Matrix;
use tracing::info;

/// Handler for JOIN command.
///
/// `JOIN <channel>{,<channel>}`. Every listed channel is attempted; the
/// first failure is reported after the rest have been joined.
pub struct JoinHandler;

impl Handler for JoinHandler {
    fn handle(&self, ctx: &mut Context<'_>, req: &Request) -> HandlerResult {
        let channels_str = req.arg(0).ok_or(HandlerError::NeedMoreParams)?;
        let uid = ctx.uid;
        let Matrix {
            server_info,
            users,
            channels,
        } = &mut *ctx.matrix;
        let session = users.get(uid).ok_or(HandlerError::NotRegistered)?;

        let mut first_error = None;
        for name in channels_str.split(',').filter(|n| !n.is_empty()) {
            match channels.find_or_create(name) {
                Ok(channel) => {
                    if channel.join(session, users, server_info) {
                        info!(nick = %session.nick, channel = %name, "User joined channel");
                    }
                }
                Err(e) => {
                    first_error.get_or_insert(e);
                }
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

/// Handler for PART command.
///
/// `PART <channel>{,<channel>} [:<reason>]`
pub struct PartHandler;

impl Handler for PartHandler {
    fn handle(&self, ctx: &mut Context<'_>, req: &Request) -> HandlerResult {
        let channels_str = req.arg(0).ok_or(HandlerError::NeedMoreParams)?;
        let uid = ctx.uid;
        let Matrix {
            server_info,
            users,
            channels,
        } = &mut *ctx.matrix;
        let session = users.get(uid).ok_or(HandlerError::NotRegistered)?;

        for name in channels_str.split(',').filter(|n| !n.is_empty()) {
            let channel = channels.find_mut(name)?;
            let was_member = channel.has_session(uid);
            channel.part(session, req.text_or_arg(1), users, server_info);
            if was_member {
                info!(nick = %session.nick, channel = %name, "User left channel");
            }
        }
        Ok(())
    }
}

/// Handler for NAMES command.
pub struct NamesHandler;

impl Handler for NamesHandler {
    fn handle(&self, ctx: &mut Context<'_>, req: &Request) -> HandlerResult {
        let name = req.arg(0).ok_or(HandlerError::NeedMoreParams)?;
        let matrix = &*ctx.matrix;
        let session = ctx.session()?;
        let channel = matrix.channels.find(name)?;
        channel.respond_to_names(session, &matrix.users, &matrix.server_info);
        Ok(())
    }
}

/// Handler for TOPIC command.
///
/// `TOPIC <channel> [:<text>]`: with text, set (empty text clears); without,
/// query.
pub struct TopicHandler;

impl Handler for TopicHandler {
    fn handle(&self, ctx: &mut Context<'_>, req: &Request) -> HandlerResult {
        let name = req.arg(0).ok_or(HandlerError::NeedMoreParams)?;
        let uid = ctx.uid;
        let Matrix {
            server_info,
            users,
            channels,
        } = &mut *ctx.matrix;
        let session = users.get(uid).ok_or(HandlerError::NotRegistered)?;
        let channel = channels.find_mut(name)?;

        match req.text_or_arg(1) {
            Some(text) => channel.change_topic(session, text, users, server_info),
            None => channel.respond_to_topic(session, server_info),
        }
        Ok(())
    }
}
