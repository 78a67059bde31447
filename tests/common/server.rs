//! Test server management.
//!
//! Runs a Gateway inside the test's tokio runtime on an ephemeral port.

use hector::config::Config;
use hector::network::{Gateway, SharedMatrix};
use std::net::SocketAddr;
use tokio::task::JoinHandle;

/// A test server instance. The gateway task is aborted on drop.
pub struct TestServer {
    addr: SocketAddr,
    matrix: SharedMatrix,
    task: JoinHandle<anyhow::Result<()>>,
    _config_dir: tempfile::TempDir,
}

impl TestServer {
    /// Spawn a server with an empty MOTD.
    pub async fn spawn() -> anyhow::Result<Self> {
        Self::spawn_with_motd(&[]).await
    }

    /// Spawn a server, writing its config file to a temporary directory.
    pub async fn spawn_with_motd(motd: &[&str]) -> anyhow::Result<Self> {
        let config_dir = tempfile::tempdir()?;
        let config_path = config_dir.path().join("config.toml");
        let lines = motd
            .iter()
            .map(|l| format!("{l:?}"))
            .collect::<Vec<_>>()
            .join(", ");
        let config_content = format!(
            r#"
[server]
name = "hector"
network = "Hector"

[listen]
address = "127.0.0.1:0"

[motd]
lines = [{lines}]

[limits]
max_line_length = 512
"#
        );
        std::fs::write(&config_path, config_content)?;

        let config = Config::load(&config_path)?;
        let gateway = Gateway::bind(&config).await?;
        let addr = gateway.local_addr()?;
        let matrix = gateway.matrix();
        let task = tokio::spawn(gateway.run());

        Ok(Self {
            addr,
            matrix,
            task,
            _config_dir: config_dir,
        })
    }

    /// Get the server address.
    pub fn address(&self) -> String {
        self.addr.to_string()
    }

    /// Shared state, for asserting on the registry directly.
    #[allow(dead_code)]
    pub fn matrix(&self) -> &SharedMatrix {
        &self.matrix
    }

    /// Create a new test client connected to this server.
    pub async fn connect(&self, nick: &str) -> anyhow::Result<super::client::TestClient> {
        super::client::TestClient::connect(&self.address(), nick).await
    }

    /// Connect and register in one step, discarding the welcome burst.
    #[allow(dead_code)]
    pub async fn login(&self, nick: &str) -> anyhow::Result<super::client::TestClient> {
        let mut client = self.connect(nick).await?;
        client.register().await?;
        client.drain().await;
        Ok(client)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}
