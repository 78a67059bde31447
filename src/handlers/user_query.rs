//! User query handlers: WHO, WHOIS.

use super::{Context, Handler, HandlerError, HandlerResult};
use crate::proto::{Request, Response};
use crate::state::{Matrix, Session, Target};

/// Handler for WHO command.
///
/// `WHO <channel|nick>`: one RPL_WHOREPLY per matching session, then
/// RPL_ENDOFWHO naming the query. An unknown channel or nick yields just
/// the terminator.
pub struct WhoHandler;

impl Handler for WhoHandler {
    fn handle(&self, ctx: &mut Context<'_>, req: &Request) -> HandlerResult {
        let matrix = &*ctx.matrix;
        let session = ctx.session()?;
        let server_name = &matrix.server_info.name;
        let dest = req.arg(0).unwrap_or("*");

        match Target::parse(dest) {
            Target::Channel(name) => {
                if let Ok(channel) = matrix.channels.find(name) {
                    for member in channel.members().filter_map(|uid| matrix.users.get(uid)) {
                        send_who_reply(session, member, name, server_name);
                    }
                }
            }
            Target::Nick(nick) => {
                if let Some(member) = matrix.users.find(nick) {
                    send_who_reply(session, member, "*", server_name);
                }
            }
        }

        session.numeric(
            server_name,
            Response::RPL_ENDOFWHO,
            vec![dest.to_string()],
            "End of /WHO list.",
        );
        Ok(())
    }
}

/// RPL_WHOREPLY: `<channel> <user> <host> <server> <nick> H :0 <realname>`.
fn send_who_reply(to: &Session, member: &Session, channel: &str, server_name: &str) {
    to.numeric(
        server_name,
        Response::RPL_WHOREPLY,
        vec![
            channel.to_string(),
            member.identity.username.clone(),
            server_name.to_string(),
            server_name.to_string(),
            member.nick.clone(),
            "H".to_string(),
        ],
        &format!("0 {}", member.realname),
    );
}

/// Handler for WHOIS command.
///
/// `WHOIS [server] <nick>`. The terminator is sent whether or not the
/// nick exists.
pub struct WhoisHandler;

impl Handler for WhoisHandler {
    fn handle(&self, ctx: &mut Context<'_>, req: &Request) -> HandlerResult {
        // The nick is the last parameter, trailing or not.
        let target = req
            .text()
            .or_else(|| req.args.last().map(String::as_str))
            .filter(|t| !t.is_empty())
            .ok_or(HandlerError::NeedMoreParams)?;
        let matrix = &*ctx.matrix;
        let session = ctx.session()?;
        let server_name = &matrix.server_info.name;

        match matrix.users.find(target) {
            Some(found) => send_whois_block(session, found, matrix),
            None => session.numeric(
                server_name,
                Response::ERR_NOSUCHNICK,
                vec![target.to_string()],
                "No such nick/channel",
            ),
        }

        session.numeric(
            server_name,
            Response::RPL_ENDOFWHOIS,
            vec![target.to_string()],
            "End of /WHOIS list.",
        );
        Ok(())
    }
}

fn send_whois_block(to: &Session, found: &Session, matrix: &Matrix) {
    let server = &matrix.server_info;
    let nick = found.nick.clone();

    // RPL_WHOISUSER
    to.numeric(
        &server.name,
        Response::RPL_WHOISUSER,
        vec![
            nick.clone(),
            found.identity.username.clone(),
            server.name.clone(),
            "*".to_string(),
        ],
        &found.realname,
    );

    // RPL_WHOISCHANNELS, only when there is something to list
    let channels = matrix
        .channels
        .find_all_for_session(found.uid)
        .iter()
        .map(|c| c.name.as_str())
        .collect::<Vec<_>>();
    if !channels.is_empty() {
        to.numeric(
            &server.name,
            Response::RPL_WHOISCHANNELS,
            vec![nick.clone()],
            &channels.join(" "),
        );
    }

    // RPL_WHOISSERVER
    to.numeric(
        &server.name,
        Response::RPL_WHOISSERVER,
        vec![nick.clone(), server.name.clone()],
        &server.description,
    );

    // RPL_WHOISIDLE
    to.numeric(
        &server.name,
        Response::RPL_WHOISIDLE,
        vec![
            nick,
            found.idle().to_string(),
            found.connected_at.timestamp().to_string(),
        ],
        "seconds idle, signon time",
    );
}
