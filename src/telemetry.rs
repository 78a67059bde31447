//! Telemetry utilities for command timing and log correlation.

use std::time::Instant;

/// Guard for timing command execution.
///
/// Emits a trace event with the elapsed time when dropped.
pub struct CommandTimer {
    command: String,
    start: Instant,
}

impl CommandTimer {
    /// Start timing a command.
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            start: Instant::now(),
        }
    }
}

impl Drop for CommandTimer {
    fn drop(&mut self) {
        let micros = self.start.elapsed().as_micros() as u64;
        tracing::trace!(command = %self.command, micros, "Command finished");
    }
}

/// Standardized span constructors.
pub mod spans {
    use crate::state::Uid;
    use std::net::SocketAddr;
    use tracing::{Span, info_span};

    /// Create a span for a client connection.
    pub fn connection(addr: SocketAddr) -> Span {
        info_span!("connection", addr = %addr)
    }

    /// Create a span for a command execution.
    pub fn command(name: &str, uid: Uid, target: Option<&str>) -> Span {
        if let Some(target) = target {
            info_span!("command", name = %name, uid = %uid, target = %target)
        } else {
            info_span!("command", name = %name, uid = %uid)
        }
    }
}
