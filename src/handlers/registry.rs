//! Command handler registry and dispatch.

use super::{
    Context, Handler, HandlerResult, JoinHandler, NamesHandler, NickHandler, NoticeHandler,
    PartHandler, PingHandler, PrivmsgHandler, QuitHandler, TopicHandler, UserHandler, WhoHandler,
    WhoisHandler,
};
use crate::proto::Request;
use crate::telemetry::{CommandTimer, spans};
use std::collections::HashMap;
use tracing::debug;

/// Registry of command handlers, keyed by lowercase command name.
///
/// The table is closed: it is filled once in [`Registry::new`]. A command
/// with no entry is dropped silently.
pub struct Registry {
    handlers: HashMap<&'static str, Box<dyn Handler>>,
}

impl Registry {
    /// Create a new registry with all handlers registered.
    pub fn new() -> Self {
        let mut handlers: HashMap<&'static str, Box<dyn Handler>> = HashMap::new();

        // Connection handlers
        handlers.insert("nick", Box::new(NickHandler));
        handlers.insert("user", Box::new(UserHandler));
        handlers.insert("ping", Box::new(PingHandler));
        handlers.insert("quit", Box::new(QuitHandler));

        // Channel handlers
        handlers.insert("join", Box::new(JoinHandler));
        handlers.insert("part", Box::new(PartHandler));
        handlers.insert("names", Box::new(NamesHandler));
        handlers.insert("topic", Box::new(TopicHandler));

        // Messaging handlers
        handlers.insert("privmsg", Box::new(PrivmsgHandler));
        handlers.insert("notice", Box::new(NoticeHandler));

        // User query handlers
        handlers.insert("whois", Box::new(WhoisHandler));
        handlers.insert("who", Box::new(WhoHandler));

        Self { handlers }
    }

    /// Whether `event_name` has a handler.
    pub fn handles(&self, event_name: &str) -> bool {
        self.handlers.contains_key(event_name)
    }

    /// Dispatch a request to its handler.
    ///
    /// Unknown commands return `Ok(())` without side effects.
    pub fn dispatch(&self, ctx: &mut Context<'_>, req: &Request) -> HandlerResult {
        let Some(handler) = self.handlers.get(req.event_name.as_str()) else {
            return Ok(());
        };

        let span = spans::command(&req.event_name, ctx.uid, req.arg(0));
        let _enter = span.enter();
        let _timer = CommandTimer::new(&req.event_name);

        let result = handler.handle(ctx, req);
        if let Err(ref e) = result {
            debug!(command = %req.event_name, code = e.error_code(), error = %e, "Command error");
        }
        result
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}
