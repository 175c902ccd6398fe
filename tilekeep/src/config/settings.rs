//! Configuration structures and their defaults.

use std::path::PathBuf;

use crate::operations::DEFAULT_BATCH_SIZE;
use crate::provider::{DEFAULT_TIMEOUT_SECS, DEFAULT_USER_AGENT};
use crate::server::{ServerConfig, DEFAULT_DERIVE_LEVELS, DEFAULT_HOST, DEFAULT_PORT};

/// `[server]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub derive_levels: u8,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            derive_levels: DEFAULT_DERIVE_LEVELS,
        }
    }
}

/// `[download]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadSettings {
    /// Request timeout in seconds
    pub timeout: u64,
    pub user_agent: String,
    /// Tiles downloaded in parallel per batch
    pub batch_size: usize,
}

impl Default for DownloadSettings {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT_SECS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

/// `[logging]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoggingSettings {
    /// Also write logs to this file
    pub file: Option<PathBuf>,
}

/// The whole configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigFile {
    pub server: ServerSettings,
    pub download: DownloadSettings,
    pub logging: LoggingSettings,
}

impl ConfigFile {
    /// Server settings snapshot.
    pub fn server_config(&self) -> ServerConfig {
        ServerConfig {
            host: self.server.host.clone(),
            port: self.server.port,
            derive_levels: self.server.derive_levels,
        }
    }
}
