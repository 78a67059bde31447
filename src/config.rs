//! Configuration loading and management.

use serde::Deserialize;
use std::net::SocketAddr;
use std::path::Path;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server information.
    #[serde(default)]
    pub server: ServerConfig,
    /// Network listen configuration.
    pub listen: ListenConfig,
    /// Message of the Day.
    #[serde(default)]
    pub motd: MotdConfig,
    /// Input limits applied by the transport.
    #[serde(default)]
    pub limits: LimitsConfig,
}

/// Server identity configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Server name, also used as the host part of every user source.
    #[serde(default = "default_server_name")]
    pub name: String,
    /// Network name shown in the welcome greeting.
    #[serde(default = "default_network")]
    pub network: String,
    /// Free-form server info line (RPL_WHOISSERVER).
    #[serde(default = "default_description")]
    pub description: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: default_server_name(),
            network: default_network(),
            description: default_description(),
        }
    }
}

fn default_server_name() -> String {
    "hector".to_string()
}

fn default_network() -> String {
    "Hector".to_string()
}

fn default_description() -> String {
    "Hard Hecting".to_string()
}

/// Network listener configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ListenConfig {
    /// Address to bind to (e.g., "0.0.0.0:6667").
    pub address: SocketAddr,
}

/// Message of the Day configuration.
///
/// With no lines configured the server answers ERR_NOMOTD.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MotdConfig {
    #[serde(default)]
    pub lines: Vec<String>,
}

/// Transport limits.
#[derive(Debug, Clone, Deserialize)]
pub struct LimitsConfig {
    /// Longest accepted input line in bytes, excluding the line terminator.
    #[serde(default = "default_max_line_length")]
    pub max_line_length: usize,
    /// Replies a client may have waiting before it is dropped for not
    /// reading.
    #[serde(default = "default_send_queue")]
    pub send_queue: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_line_length: default_max_line_length(),
            send_queue: default_send_queue(),
        }
    }
}

fn default_max_line_length() -> usize {
    512
}

fn default_send_queue() -> usize {
    1024
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}
