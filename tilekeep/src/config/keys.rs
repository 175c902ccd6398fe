//! Configuration key access and validation.
//!
//! Gives the CLI `config get/set` commands typed access to single values by
//! their `section.key` name.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use super::parser::expand_tilde;
use super::settings::ConfigFile;
use crate::coord::MAX_ZOOM;

/// Errors that can occur when getting or setting configuration values.
#[derive(Debug, Error)]
pub enum ConfigKeyError {
    /// Unknown configuration key.
    #[error("Unknown configuration key '{0}'")]
    UnknownKey(String),

    /// Validation failed for the value.
    #[error("Invalid value for {key}: {reason}")]
    ValidationFailed { key: String, reason: String },
}

/// Supported configuration keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigKey {
    ServerHost,
    ServerPort,
    ServerDeriveLevels,

    DownloadTimeout,
    DownloadUserAgent,
    DownloadBatchSize,

    LoggingFile,
}

impl FromStr for ConfigKey {
    type Err = ConfigKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ConfigKey::all()
            .iter()
            .copied()
            .find(|key| key.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ConfigKeyError::UnknownKey(s.to_string()))
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn positive<T>(key: ConfigKey, value: &str) -> Result<T, ConfigKeyError>
where
    T: FromStr + PartialEq + Default,
{
    match value.trim().parse::<T>() {
        Ok(v) if v != T::default() => Ok(v),
        _ => Err(ConfigKeyError::ValidationFailed {
            key: key.name().to_string(),
            reason: format!("'{}' is not a positive integer", value),
        }),
    }
}

impl ConfigKey {
    /// Canonical `section.key` name.
    pub fn name(&self) -> &'static str {
        match self {
            ConfigKey::ServerHost => "server.host",
            ConfigKey::ServerPort => "server.port",
            ConfigKey::ServerDeriveLevels => "server.derive_levels",
            ConfigKey::DownloadTimeout => "download.timeout",
            ConfigKey::DownloadUserAgent => "download.user_agent",
            ConfigKey::DownloadBatchSize => "download.batch_size",
            ConfigKey::LoggingFile => "logging.file",
        }
    }

    /// INI section the key lives in.
    pub fn section(&self) -> &'static str {
        self.name().split_once('.').map_or("", |(section, _)| section)
    }

    /// Key name within its section.
    pub fn key_name(&self) -> &'static str {
        self.name().split_once('.').map_or("", |(_, key)| key)
    }

    /// All keys, in file order.
    pub fn all() -> &'static [ConfigKey] {
        &[
            ConfigKey::ServerHost,
            ConfigKey::ServerPort,
            ConfigKey::ServerDeriveLevels,
            ConfigKey::DownloadTimeout,
            ConfigKey::DownloadUserAgent,
            ConfigKey::DownloadBatchSize,
            ConfigKey::LoggingFile,
        ]
    }

    /// Current value as a string (empty when unset).
    pub fn get(&self, config: &ConfigFile) -> String {
        match self {
            ConfigKey::ServerHost => config.server.host.clone(),
            ConfigKey::ServerPort => config.server.port.to_string(),
            ConfigKey::ServerDeriveLevels => config.server.derive_levels.to_string(),
            ConfigKey::DownloadTimeout => config.download.timeout.to_string(),
            ConfigKey::DownloadUserAgent => config.download.user_agent.clone(),
            ConfigKey::DownloadBatchSize => config.download.batch_size.to_string(),
            ConfigKey::LoggingFile => config
                .logging
                .file
                .as_ref()
                .map(|p| p.to_string_lossy().into_owned())
                .unwrap_or_default(),
        }
    }

    /// Validates `value` and stores it in `config`.
    pub fn set(&self, config: &mut ConfigFile, value: &str) -> Result<(), ConfigKeyError> {
        let fail = |reason: String| ConfigKeyError::ValidationFailed {
            key: self.name().to_string(),
            reason,
        };

        match self {
            ConfigKey::ServerHost => {
                let host = value.trim();
                if host.is_empty() {
                    return Err(fail("host must not be empty".to_string()));
                }
                config.server.host = host.to_string();
            }
            ConfigKey::ServerPort => config.server.port = positive(*self, value)?,
            ConfigKey::ServerDeriveLevels => {
                let levels: u8 = value
                    .trim()
                    .parse()
                    .map_err(|_| fail(format!("'{}' is not a number of zoom levels", value)))?;
                if levels > MAX_ZOOM {
                    return Err(fail(format!("must not exceed {}", MAX_ZOOM)));
                }
                config.server.derive_levels = levels;
            }
            ConfigKey::DownloadTimeout => config.download.timeout = positive(*self, value)?,
            ConfigKey::DownloadUserAgent => {
                let agent = value.trim();
                if agent.is_empty() {
                    return Err(fail("user agent must not be empty".to_string()));
                }
                config.download.user_agent = agent.to_string();
            }
            ConfigKey::DownloadBatchSize => config.download.batch_size = positive(*self, value)?,
            ConfigKey::LoggingFile => {
                let path = value.trim();
                config.logging.file = if path.is_empty() {
                    None
                } else {
                    Some(expand_tilde(path))
                };
            }
        }
        Ok(())
    }
}
