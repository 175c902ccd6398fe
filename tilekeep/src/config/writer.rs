//! INI serialization logic for converting `ConfigFile` → INI string.

use super::settings::ConfigFile;

/// Convert a `ConfigFile` to a commented INI string for saving.
pub(super) fn to_config_string(config: &ConfigFile) -> String {
    let log_file = config
        .logging
        .file
        .as_ref()
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_default();

    format!(
        r#"[server]
; Address the tile server listens on
host = {}
port = {}
; On a miss, derive the tile from a cached ancestor up to this many zoom
; levels coarser before downloading it (0 = always download)
derive_levels = {}

[download]
; Request timeout in seconds
timeout = {}
; User-Agent header sent to tile servers
user_agent = {}
; Number of tiles downloaded in parallel
batch_size = {}

[logging]
; Also write logs to this file (empty = console only)
file = {}
"#,
        config.server.host,
        config.server.port,
        config.server.derive_levels,
        config.download.timeout,
        config.download.user_agent,
        config.download.batch_size,
        log_file,
    )
}
