//! Test doubles for the connection collaborator.

use crate::proto::Reply;
use crate::state::Connection;
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Connection that records every reply instead of writing it anywhere.
#[derive(Default)]
pub struct RecordingConnection {
    replies: Mutex<Vec<Reply>>,
    closed: AtomicBool,
}

impl RecordingConnection {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Everything received so far, rendered as wire lines.
    pub fn lines(&self) -> Vec<String> {
        self.replies.lock().iter().map(ToString::to_string).collect()
    }

    /// Drain and render everything received so far.
    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.replies.lock())
            .iter()
            .map(ToString::to_string)
            .collect()
    }

    /// Number of received lines containing `needle`.
    pub fn count(&self, needle: &str) -> usize {
        self.lines().iter().filter(|l| l.contains(needle)).count()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl Connection for RecordingConnection {
    fn respond_with(&self, reply: Reply) {
        self.replies.lock().push(reply);
    }

    fn close_connection(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}
