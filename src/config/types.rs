//! Core configuration types and loading.

use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

use super::auth::AuthConfig;
use super::defaults::{
    default_join_timeout, default_ping_interval, default_ping_timeout, default_server_name,
};
use super::limits::LimitsConfig;
use super::listen::{ListenConfig, TlsConfig};

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Relay configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server information.
    #[serde(default)]
    pub server: ServerConfig,
    /// Network listen configuration.
    pub listen: ListenConfig,
    /// Optional TLS for the listener (serves `wss://`).
    pub tls: Option<TlsConfig>,
    /// Identity verification for `join` and `sendMessage`.
    #[serde(default)]
    pub auth: AuthConfig,
    /// Per-session and per-user limits.
    #[serde(default)]
    pub limits: LimitsConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

/// Server identity configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Server name, reported in logs and `/health`.
    #[serde(default = "default_server_name")]
    pub name: String,
    /// Prometheus metrics HTTP port (default: 9090, 0 disables).
    pub metrics_port: Option<u16>,
    /// Log output format.
    #[serde(default)]
    pub log_format: LogFormat,
    /// Keepalive and join deadlines.
    #[serde(default)]
    pub idle_timeouts: IdleTimeoutsConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: default_server_name(),
            metrics_port: None,
            log_format: LogFormat::default(),
            idle_timeouts: IdleTimeoutsConfig::default(),
        }
    }
}

/// Idle timeout configuration for session keepalive.
///
/// - `ping`: Seconds of silence before the server sends a WebSocket ping (default: 30)
/// - `timeout`: Seconds to wait after that ping before closing (default: 60)
/// - `join`: Seconds a session may stay unbound before it is closed (default: 60, 0 disables)
#[derive(Debug, Clone, Deserialize)]
pub struct IdleTimeoutsConfig {
    #[serde(default = "default_ping_interval")]
    pub ping: u64,

    /// Total idle time before disconnect = ping + timeout.
    #[serde(default = "default_ping_timeout")]
    pub timeout: u64,

    #[serde(default = "default_join_timeout")]
    pub join: u64,
}

impl Default for IdleTimeoutsConfig {
    fn default() -> Self {
        Self {
            ping: default_ping_interval(),
            timeout: default_ping_timeout(),
            join: default_join_timeout(),
        }
    }
}
