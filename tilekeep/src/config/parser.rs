//! INI parsing logic for converting `Ini` → `ConfigFile`.
//!
//! This is the single place where INI key names are mapped to struct fields.

use std::path::PathBuf;
use std::str::FromStr;

use ini::{Ini, Properties};

use super::file::ConfigFileError;
use super::settings::ConfigFile;
use crate::coord::MAX_ZOOM;

fn invalid(section: &str, key: &str, value: &str, reason: &str) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Parses `section.key` when present.
fn parse_value<T: FromStr>(
    props: &Properties,
    section: &str,
    key: &str,
    reason: &str,
) -> Result<Option<T>, ConfigFileError> {
    match props.get(key) {
        Some(v) => v
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| invalid(section, key, v, reason)),
        None => Ok(None),
    }
}

/// Parse an `Ini` object into a `ConfigFile`.
///
/// Starts from `ConfigFile::default()` and overlays any values found in the INI.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [server] section
    if let Some(section) = ini.section(Some("server")) {
        if let Some(v) = section.get("host") {
            let v = v.trim();
            if v.is_empty() {
                return Err(invalid("server", "host", v, "must not be empty"));
            }
            config.server.host = v.to_string();
        }
        if let Some(port) = parse_value::<u16>(section, "server", "port", "must be a port number (1-65535)")? {
            if port == 0 {
                return Err(invalid("server", "port", "0", "must be a port number (1-65535)"));
            }
            config.server.port = port;
        }
        if let Some(levels) = parse_value::<u8>(
            section,
            "server",
            "derive_levels",
            "must be a non-negative integer",
        )? {
            if levels > MAX_ZOOM {
                return Err(invalid(
                    "server",
                    "derive_levels",
                    &levels.to_string(),
                    "must not exceed the maximum zoom (20)",
                ));
            }
            config.server.derive_levels = levels;
        }
    }

    // [download] section
    if let Some(section) = ini.section(Some("download")) {
        if let Some(timeout) = parse_value::<u64>(
            section,
            "download",
            "timeout",
            "must be a positive integer (seconds)",
        )? {
            if timeout == 0 {
                return Err(invalid("download", "timeout", "0", "must be a positive integer (seconds)"));
            }
            config.download.timeout = timeout;
        }
        if let Some(v) = section.get("user_agent") {
            let v = v.trim();
            if !v.is_empty() {
                config.download.user_agent = v.to_string();
            }
        }
        if let Some(size) = parse_value::<usize>(
            section,
            "download",
            "batch_size",
            "must be a positive integer",
        )? {
            if size == 0 {
                return Err(invalid("download", "batch_size", "0", "must be a positive integer"));
            }
            config.download.batch_size = size;
        }
    }

    // [logging] section
    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = section.get("file") {
            let v = v.trim();
            if !v.is_empty() {
                config.logging.file = Some(expand_tilde(v));
            }
        }
    }

    Ok(config)
}

/// Expands a leading `~` to the home directory.
pub(super) fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}
