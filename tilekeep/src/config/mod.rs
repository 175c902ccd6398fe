//! User configuration
//!
//! Settings live in `~/.tilekeep/config.ini`:
//!
//! ```ini
//! [server]
//! host = 127.0.0.1
//! port = 8080
//! derive_levels = 0
//!
//! [download]
//! timeout = 30
//! user_agent = tilekeep/0.4.0
//! batch_size = 16
//!
//! [logging]
//! file =
//! ```
//!
//! Missing files and keys fall back to defaults.

mod file;
mod keys;
mod parser;
mod settings;
mod writer;

pub use file::{config_directory, config_file_path, ConfigFileError};
pub use keys::{ConfigKey, ConfigKeyError};
pub use settings::{ConfigFile, DownloadSettings, LoggingSettings, ServerSettings};
