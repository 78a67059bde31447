//! Connection - Handles an individual client connection.
//!
//! Each Connection runs in its own Tokio task:
//!
//! ```text
//!   FramedRead<IrcLineCodec> ──▶ tokio::select! ◀── mpsc queue (ReplySender)
//!                                  │                      ▲
//!                                  ▼                      │
//!                   Handshake / Registry (under Matrix lock)
//!                                  │
//!                                  ▼
//!                           BufWriter (CRLF lines)
//! ```
//!
//! Replies are never written by handlers directly. They are queued on the
//! session's [`ReplySender`] and written by the owning task in queue order.
//! The queue is bounded: a client that lets it fill up is disconnected with
//! "SendQ exceeded" and nothing more is written to it.

mod codec;
mod handshake;
mod outlet;

pub use outlet::{Outbound, ReplySender};

use codec::{Inbound, IrcLineCodec};
use outlet::SENDQ_EXCEEDED;
use handshake::Handshake;

use crate::handlers::{Context, Registry};
use crate::network::SharedMatrix;
use crate::proto::{Reply, Request, Response};
use crate::state::{Connection as _, Uid};
use crate::telemetry::spans;
use futures_util::StreamExt;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncWrite, AsyncWriteExt, BufWriter};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_util::codec::FramedRead;
use tracing::{Instrument, debug, info};

/// Why the serve loop stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Exit {
    Closed,
    SendQExceeded,
}

/// Where a connection is in its lifecycle.
enum Phase {
    Handshake(Handshake),
    Registered(Uid),
}

/// A client connection handler.
pub struct Connection {
    stream: TcpStream,
    addr: SocketAddr,
    matrix: SharedMatrix,
    registry: Arc<Registry>,
    max_line_length: usize,
    send_queue: usize,
}

impl Connection {
    pub fn new(
        stream: TcpStream,
        addr: SocketAddr,
        matrix: SharedMatrix,
        registry: Arc<Registry>,
        max_line_length: usize,
        send_queue: usize,
    ) -> Self {
        Self {
            stream,
            addr,
            matrix,
            registry,
            max_line_length,
            send_queue,
        }
    }

    /// Serve the client until either side closes the link.
    ///
    /// A registered session is always destroyed on the way out, whether the
    /// client sent QUIT or the socket simply went away.
    pub async fn run(self) -> anyhow::Result<()> {
        let span = spans::connection(self.addr);
        self.serve().instrument(span).await
    }

    async fn serve(self) -> anyhow::Result<()> {
        let Connection {
            stream,
            matrix,
            registry,
            max_line_length,
            send_queue,
            ..
        } = self;

        let (read_half, write_half) = stream.into_split();
        let mut lines = FramedRead::new(read_half, IrcLineCodec::new(max_line_length));
        let mut writer = BufWriter::new(write_half);
        let (tx, mut rx) = mpsc::channel(send_queue);
        let sender = Arc::new(ReplySender::new(tx));
        let overflow = sender.overflow();
        let server_name = matrix.lock().server_info.name.clone();

        let mut phase = Phase::Handshake(Handshake::default());

        let result: anyhow::Result<Exit> = loop {
            tokio::select! {
                // Drain queued output before reading more input, so a QUIT's
                // close request is honoured before any later line.
                biased;

                () = overflow.notified() => break Ok(Exit::SendQExceeded),

                Some(out) = rx.recv() => match out {
                    Outbound::Reply(reply) => tokio::select! {
                        written = write_reply(&mut writer, &reply) => {
                            if let Err(e) = written {
                                break Err(e.into());
                            }
                        }
                        // The peer stopped reading and the queue filled up
                        // behind this write.
                        () = overflow.notified() => break Ok(Exit::SendQExceeded),
                    },
                    Outbound::Close => break Ok(Exit::Closed),
                },

                line = lines.next() => match line {
                    Some(Ok(Inbound::Line(line))) => {
                        process_line(&line, &mut phase, &matrix, &registry, &sender);
                    }
                    Some(Ok(Inbound::TooLong)) => {
                        let nick = current_nick(&phase, &matrix);
                        sender.respond_with(Reply::numeric(
                            &server_name,
                            &nick,
                            Response::ERR_INPUTTOOLONG,
                            Vec::new(),
                            "Input line was too long",
                        ));
                    }
                    Some(Ok(Inbound::InvalidUtf8)) => {
                        debug!("Discarded line with invalid UTF-8");
                        sender.respond_with(Reply::command(
                            server_name.as_str(),
                            "FAIL",
                            vec!["*".to_string(), "INVALID_UTF8".to_string()],
                            Some("Message rejected, it is not valid UTF-8"),
                        ));
                    }
                    Some(Err(e)) => {
                        debug!(error = %e, "Read error");
                        break Ok(Exit::Closed);
                    }
                    None => {
                        debug!("Client closed the connection");
                        break Ok(Exit::Closed);
                    }
                },
            }
        };

        let exit = result.as_ref().map_or(Exit::Closed, |exit| *exit);

        if let Phase::Registered(uid) = phase {
            let mut state = matrix.lock();
            if exit == Exit::SendQExceeded
                && let Some(session) = state.users.get_mut(uid)
            {
                session.disconnect_reason = Some(SENDQ_EXCEEDED.to_string());
            }
            state.destroy(uid);
        }

        // A client that stopped reading would block these writes forever.
        if exit == Exit::SendQExceeded {
            info!(reason = SENDQ_EXCEEDED, "Disconnected slow client");
            return Ok(());
        }

        // Whatever is still queued, the closing-link ERROR included.
        while let Ok(out) = rx.try_recv() {
            if let Outbound::Reply(reply) = out
                && write_reply(&mut writer, &reply).await.is_err()
            {
                break;
            }
        }
        let _ = writer.shutdown().await;

        result.map(|_| ())
    }
}

/// Parse one input line and run it through the handshake or the registry.
fn process_line(
    line: &str,
    phase: &mut Phase,
    matrix: &SharedMatrix,
    registry: &Registry,
    sender: &Arc<ReplySender>,
) {
    let Some(req) = Request::parse(line) else {
        return;
    };
    let mut state = matrix.lock();

    match phase {
        Phase::Handshake(handshake) => {
            if let Some(uid) = handshake.step(&req, &mut state, registry, sender) {
                debug!(uid = %uid, "Handshake complete");
                *phase = Phase::Registered(uid);
            }
        }
        Phase::Registered(uid) => {
            let uid = *uid;
            let mut ctx = Context::new(uid, &mut state);
            if let Err(e) = registry.dispatch(&mut ctx, &req)
                && let Some(session) = state.users.get(uid)
            {
                session.respond_with(e.to_reply(
                    &state.server_info.name,
                    &session.nick,
                    &req.event_name.to_ascii_uppercase(),
                ));
            }
        }
    }
}

fn current_nick(phase: &Phase, matrix: &SharedMatrix) -> String {
    match phase {
        Phase::Handshake(handshake) => handshake.display_nick().to_string(),
        Phase::Registered(uid) => matrix
            .lock()
            .users
            .get(*uid)
            .map_or_else(|| "*".to_string(), |s| s.nick.clone()),
    }
}

/// Write one reply followed by CRLF and flush.
async fn write_reply<W>(writer: &mut W, reply: &Reply) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(format!("{reply}\r\n").as_bytes()).await?;
    writer.flush().await
}
