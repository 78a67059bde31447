//! Outbound queue between the core and a connection's writer.

use crate::proto::Reply;
use crate::state::Connection as ReplySink;
use std::sync::Arc;
use tokio::sync::Notify;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{trace, warn};

/// Quit message for a client whose send queue filled up.
pub const SENDQ_EXCEEDED: &str = "SendQ exceeded";

/// Work item for a connection's writer.
#[derive(Debug)]
pub enum Outbound {
    Reply(Reply),
    /// Stop reading; the writer flushes whatever was queued first.
    Close,
}

/// Handle the core uses to reach one client.
///
/// Sends never block, so it is safe to call while holding the Matrix lock.
/// When the bounded queue is full the reply is dropped and the owning task
/// is told to disconnect the client.
#[derive(Debug, Clone)]
pub struct ReplySender {
    tx: mpsc::Sender<Outbound>,
    overflow: Arc<Notify>,
}

impl ReplySender {
    pub fn new(tx: mpsc::Sender<Outbound>) -> Self {
        Self {
            tx,
            overflow: Arc::new(Notify::new()),
        }
    }

    /// Signalled once the queue overflows.
    pub fn overflow(&self) -> Arc<Notify> {
        Arc::clone(&self.overflow)
    }

    fn push(&self, item: Outbound) {
        match self.tx.try_send(item) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                warn!("Send queue full, disconnecting client");
                self.overflow.notify_one();
            }
            Err(TrySendError::Closed(_)) => trace!("Reply dropped, writer already gone"),
        }
    }
}

impl ReplySink for ReplySender {
    fn respond_with(&self, reply: Reply) {
        self.push(Outbound::Reply(reply));
    }

    fn close_connection(&self) {
        self.push(Outbound::Close);
    }
}
