//! In-process harness for handler tests.

use crate::handlers::{Context, HandlerResult, Registry};
use crate::proto::Request;
use crate::state::testing::RecordingConnection;
use crate::state::{Identity, Matrix, Uid};
use std::collections::HashMap;
use std::sync::Arc;

/// A Matrix plus dispatch table, with one recording connection per client.
///
/// Clients are addressed by the nickname they registered with, even after
/// a rename.
pub struct Harness {
    pub matrix: Matrix,
    registry: Registry,
    conns: HashMap<String, Arc<RecordingConnection>>,
}

impl Harness {
    pub fn new() -> Self {
        Self {
            matrix: Matrix::default(),
            registry: Registry::new(),
            conns: HashMap::new(),
        }
    }

    /// Register `nick` (username `user`) and discard the welcome burst.
    pub fn connect(&mut self, nick: &str) -> Uid {
        let conn = RecordingConnection::new();
        let uid = self
            .matrix
            .register(nick, conn.clone(), Identity::new("user"), &format!("{nick} Real"))
            .expect("nickname should be free");
        conn.take();
        self.conns.insert(nick.to_string(), conn);
        uid
    }

    /// Parse `line` and dispatch it as if `uid` had sent it.
    pub fn send(&mut self, uid: Uid, line: &str) -> HandlerResult {
        let req = Request::parse(line).expect("test line should parse");
        let mut ctx = Context::new(uid, &mut self.matrix);
        self.registry.dispatch(&mut ctx, &req)
    }

    pub fn conn(&self, nick: &str) -> &Arc<RecordingConnection> {
        &self.conns[nick]
    }

    /// Drain what `nick`'s connection received.
    pub fn take(&self, nick: &str) -> Vec<String> {
        self.conn(nick).take()
    }

    /// Drain every connection.
    pub fn clear(&self) {
        for conn in self.conns.values() {
            conn.take();
        }
    }
}
