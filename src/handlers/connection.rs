//! Connection-level handlers: PING, NICK, QUIT, USER.

use super::{Context, Handler, HandlerError, HandlerResult};
use crate::proto::{Reply, Request, Response};
use crate::state::{DEFAULT_QUIT_REASON, Matrix};
use tracing::info;

/// PONG for a PING carrying `token`, authored by the server.
pub fn pong(server_name: &str, token: &str) -> Reply {
    Reply::command(server_name, "PONG", vec![server_name.to_string()], Some(token))
}

/// Handler for PING command.
pub struct PingHandler;

impl Handler for PingHandler {
    fn handle(&self, ctx: &mut Context<'_>, req: &Request) -> HandlerResult {
        // PING :<token>
        let token = req.text_or_arg(0).unwrap_or("");
        let session = ctx.session()?;
        session.respond_with(pong(&ctx.matrix.server_info.name, token));
        Ok(())
    }
}

/// Handler for NICK command (post-registration rename).
///
/// Peers see the change under the old source before the session's own
/// nickname field is updated.
pub struct NickHandler;

impl Handler for NickHandler {
    fn handle(&self, ctx: &mut Context<'_>, req: &Request) -> HandlerResult {
        let uid = ctx.uid;
        let Some(new_nick) = req.arg(0).or(req.text()).filter(|n| !n.is_empty()) else {
            let session = ctx.session()?;
            session.numeric(
                &ctx.matrix.server_info.name,
                Response::ERR_NONICKNAMEGIVEN,
                Vec::new(),
                "No nickname given",
            );
            return Ok(());
        };

        let session = ctx.session()?;
        let old_nick = session.nick.clone();
        if old_nick == new_nick {
            return Ok(());
        }
        let source = session.source(&ctx.matrix.server_info.name);
        let peers = ctx.matrix.peers_of(uid);

        let Matrix { users, .. } = &mut *ctx.matrix;
        users.rename(&old_nick, new_nick)?;

        let notice = Reply::command(source, "NICK", Vec::new(), Some(new_nick));
        users.broadcast_to(peers, &notice, None);

        if let Some(session) = users.get_mut(uid) {
            session.nick = new_nick.to_string();
        }
        info!(uid = %uid, old = %old_nick, new = %new_nick, "Nick changed");
        Ok(())
    }
}

/// Handler for QUIT command.
///
/// Only records the reason and asks the transport to close; teardown runs
/// when the transport notices the link is gone.
pub struct QuitHandler;

impl Handler for QuitHandler {
    fn handle(&self, ctx: &mut Context<'_>, req: &Request) -> HandlerResult {
        let reason = req.text_or_arg(0).unwrap_or(DEFAULT_QUIT_REASON);
        let session = ctx
            .matrix
            .users
            .get_mut(ctx.uid)
            .ok_or(HandlerError::NotRegistered)?;

        info!(uid = %ctx.uid, nick = %session.nick, message = %reason, "Client quit");

        session.quit_reason = Some(reason.to_string());
        session.close();
        Ok(())
    }
}

/// Handler for USER after registration.
pub struct UserHandler;

impl Handler for UserHandler {
    fn handle(&self, ctx: &mut Context<'_>, _req: &Request) -> HandlerResult {
        let session = ctx.session()?;
        session.numeric(
            &ctx.matrix.server_info.name,
            Response::ERR_ALREADYREGISTERED,
            Vec::new(),
            "You may not reregister",
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::handlers::HandlerError;
    use crate::handlers::testing::Harness;

    #[test]
    fn test_ping_echoes_token() {
        let mut h = Harness::new();
        let alice = h.connect("alice");

        h.send(alice, "PING :LAG12345").unwrap();
        h.send(alice, "PING bare").unwrap();
        assert_eq!(
            h.take("alice"),
            vec![":hector PONG hector :LAG12345", ":hector PONG hector :bare"]
        );
    }

    #[test]
    fn test_nick_change_notifies_each_peer_once() {
        let mut h = Harness::new();
        let alice = h.connect("alice");
        let bob = h.connect("bob");
        h.connect("carol");
        h.send(alice, "JOIN #test").unwrap();
        h.send(alice, "JOIN #other").unwrap();
        h.send(bob, "JOIN #test").unwrap();
        h.send(bob, "JOIN #other").unwrap();
        h.clear();

        h.send(alice, "NICK Bob2").unwrap();

        let expected = vec![":alice!user@hector NICK :Bob2".to_string()];
        assert_eq!(h.take("alice"), expected);
        assert_eq!(h.take("bob"), expected);
        assert!(h.take("carol").is_empty());

        let users = &h.matrix.users;
        assert!(users.find("alice").is_none());
        assert_eq!(users.find("bob2").unwrap().uid, alice);
        assert_eq!(users.get(alice).unwrap().nick, "Bob2");
    }

    #[test]
    fn test_nick_change_to_taken_nick_changes_nothing() {
        let mut h = Harness::new();
        let alice = h.connect("alice");
        let bob = h.connect("bob");
        h.send(alice, "JOIN #test").unwrap();
        h.send(bob, "JOIN #test").unwrap();
        h.clear();

        assert_eq!(
            h.send(alice, "NICK BOB"),
            Err(HandlerError::NicknameInUse("BOB".to_string()))
        );
        assert!(h.take("alice").is_empty());
        assert!(h.take("bob").is_empty());
        assert_eq!(h.matrix.users.find("alice").unwrap().uid, alice);
        assert_eq!(h.matrix.users.get(alice).unwrap().nick, "alice");
    }

    #[test]
    fn test_nick_errors() {
        let mut h = Harness::new();
        let alice = h.connect("alice");

        assert!(matches!(
            h.send(alice, "NICK :bad nick"),
            Err(HandlerError::ErroneousNickname(_))
        ));
        h.send(alice, "NICK").unwrap();
        assert_eq!(h.take("alice"), vec![":hector 431 alice :No nickname given"]);

        // Same nick is a no-op.
        h.send(alice, "NICK alice").unwrap();
        assert!(h.take("alice").is_empty());
    }

    #[test]
    fn test_nick_case_change() {
        let mut h = Harness::new();
        let alice = h.connect("alice");

        h.send(alice, "NICK Alice").unwrap();
        assert_eq!(h.take("alice"), vec![":alice!user@hector NICK :Alice"]);
        assert_eq!(h.matrix.users.find("alice").unwrap().nick, "Alice");
    }

    #[test]
    fn test_quit_records_reason_and_closes() {
        let mut h = Harness::new();
        let alice = h.connect("alice");

        h.send(alice, "QUIT :bye").unwrap();
        assert!(h.conn("alice").is_closed());
        let session = h.matrix.users.get(alice).unwrap();
        assert_eq!(session.quit_reason.as_deref(), Some("bye"));
        // Teardown is the transport's job.
        assert!(h.take("alice").is_empty());
    }

    #[test]
    fn test_quit_without_reason_uses_default() {
        let mut h = Harness::new();
        let alice = h.connect("alice");

        h.send(alice, "QUIT").unwrap();
        let session = h.matrix.users.get(alice).unwrap();
        assert_eq!(session.quit_message(), "Quit: Connection closed");
    }

    #[test]
    fn test_quit_then_destroy_scenario() {
        let mut h = Harness::new();
        let alice = h.connect("alice");
        let bob = h.connect("bob");
        h.send(alice, "JOIN #test").unwrap();
        h.send(bob, "JOIN #test").unwrap();
        h.clear();

        h.send(alice, "QUIT :bye").unwrap();
        assert!(h.matrix.destroy(alice));

        assert_eq!(h.take("bob"), vec![":alice!user@hector QUIT :Quit: bye"]);
        assert_eq!(
            h.take("alice"),
            vec!["ERROR :Closing Link: hector (Quit: bye)"]
        );
        assert!(h.matrix.users.find("alice").is_none());
    }

    #[test]
    fn test_user_after_registration() {
        let mut h = Harness::new();
        let alice = h.connect("alice");

        h.send(alice, "USER again 0 * :Again").unwrap();
        assert_eq!(h.take("alice"), vec![":hector 462 alice :You may not reregister"]);
    }
}
