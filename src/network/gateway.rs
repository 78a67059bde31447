//! Gateway - TCP listener that accepts incoming connections.
//!
//! The Gateway binds a socket and spawns a Connection task for each
//! incoming client. All tasks share one Matrix behind one lock.

use crate::config::{Config, LimitsConfig};
use crate::handlers::Registry;
use crate::network::Connection;
use crate::state::{Matrix, ServerInfo};
use parking_lot::Mutex;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, instrument};

/// Server state as shared between connection tasks.
pub type SharedMatrix = Arc<Mutex<Matrix>>;

/// The Gateway accepts incoming TCP connections and spawns handlers.
pub struct Gateway {
    listener: TcpListener,
    matrix: SharedMatrix,
    registry: Arc<Registry>,
    limits: LimitsConfig,
}

impl Gateway {
    /// Bind the gateway to the configured listen address.
    pub async fn bind(config: &Config) -> anyhow::Result<Self> {
        let listener = TcpListener::bind(config.listen.address).await?;
        info!(addr = %listener.local_addr()?, "Listener bound");

        Ok(Self {
            listener,
            matrix: Arc::new(Mutex::new(Matrix::new(ServerInfo::from(config)))),
            registry: Arc::new(Registry::new()),
            limits: config.limits.clone(),
        })
    }

    /// The address actually bound, useful when the configured port was 0.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Handle to the shared server state.
    pub fn matrix(&self) -> SharedMatrix {
        Arc::clone(&self.matrix)
    }

    /// Run the gateway, accepting connections forever.
    #[instrument(skip(self), name = "gateway")]
    pub async fn run(self) -> anyhow::Result<()> {
        loop {
            match self.listener.accept().await {
                Ok((stream, addr)) => {
                    info!(%addr, "Connection accepted");

                    let connection = Connection::new(
                        stream,
                        addr,
                        Arc::clone(&self.matrix),
                        Arc::clone(&self.registry),
                        self.limits.max_line_length,
                        self.limits.send_queue,
                    );
                    tokio::spawn(async move {
                        if let Err(e) = connection.run().await {
                            error!(%addr, error = %e, "Connection error");
                        }
                        info!(%addr, "Connection closed");
                    });
                }
                Err(e) => {
                    error!(error = %e, "Failed to accept connection");
                }
            }
        }
    }
}
