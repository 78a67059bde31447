//! IRC command handlers.
//!
//! This module contains the Handler trait and command registry for dispatching
//! parsed requests from registered sessions to the appropriate handler.
//!
//! Handlers run with exclusive access to the [`Matrix`] and never block or
//! await: every reply they produce is queued on a connection before they
//! return.

mod channel;
mod connection;
mod messaging;
mod registry;
mod user_query;

#[cfg(test)]
mod testing;

pub use channel::{JoinHandler, NamesHandler, PartHandler, TopicHandler};
pub use connection::{NickHandler, PingHandler, QuitHandler, UserHandler, pong};
pub use messaging::{NoticeHandler, PrivmsgHandler};
pub use registry::Registry;
pub use user_query::{WhoHandler, WhoisHandler};

pub use crate::error::{HandlerError, HandlerResult};

use crate::proto::Request;
use crate::state::{Matrix, Session, Uid};

/// Handler context passed to each command handler.
pub struct Context<'a> {
    /// The requesting session.
    pub uid: Uid,
    /// Shared server state, held exclusively for the duration of the call.
    pub matrix: &'a mut Matrix,
}

impl<'a> Context<'a> {
    pub fn new(uid: Uid, matrix: &'a mut Matrix) -> Self {
        Self { uid, matrix }
    }

    /// The requesting session.
    pub fn session(&self) -> Result<&Session, HandlerError> {
        self.matrix
            .users
            .get(self.uid)
            .ok_or(HandlerError::NotRegistered)
    }
}

/// A command handler.
pub trait Handler: Send + Sync {
    fn handle(&self, ctx: &mut Context<'_>, req: &Request) -> HandlerResult;
}
