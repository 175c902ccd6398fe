//! Logging setup.
//!
//! Console output goes to stderr so that command results on stdout stay
//! machine-readable. An optional log file receives the same events without
//! ANSI colours. `RUST_LOG` overrides the verbosity chosen on the command line.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Console verbosity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Verbosity {
    /// Warnings and errors only
    Quiet,
    #[default]
    Normal,
    /// Include debug events
    Verbose,
}

impl Verbosity {
    pub fn from_flags(quiet: bool, verbose: bool) -> Self {
        match (quiet, verbose) {
            (true, _) => Verbosity::Quiet,
            (false, true) => Verbosity::Verbose,
            (false, false) => Verbosity::Normal,
        }
    }

    /// Default filter directive for this verbosity.
    pub fn directive(&self) -> &'static str {
        match self {
            Verbosity::Quiet => "warn",
            Verbosity::Normal => "info",
            Verbosity::Verbose => "debug",
        }
    }
}

/// Logging options.
#[derive(Debug, Clone, Default)]
pub struct LogOptions {
    pub verbosity: Verbosity,
    /// Also append events to this file
    pub file: Option<PathBuf>,
}

/// Guard that must be kept alive for the duration of logging.
///
/// Dropping this guard flushes and closes the log file writer.
pub struct LoggingGuard {
    _file_guard: Option<WorkerGuard>,
}

/// Initialize the global subscriber.
///
/// # Errors
///
/// Returns an error if the log file directory cannot be created.
pub fn init_logging(options: &LogOptions) -> Result<LoggingGuard, io::Error> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(options.verbosity.directive()));

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stderr)
        .with_target(false)
        .compact();

    let (file_layer, file_guard) = match &options.file {
        Some(path) => {
            let (dir, name) = split_log_path(path)?;
            let appender = tracing_appender::rolling::never(dir, name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    // A second call (e.g. from tests) keeps the first subscriber
    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init();

    Ok(LoggingGuard {
        _file_guard: file_guard,
    })
}

/// Splits a log file path into an existing directory and a file name.
fn split_log_path(path: &Path) -> Result<(PathBuf, PathBuf), io::Error> {
    let name = path.file_name().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("log file path has no file name: {}", path.display()),
        )
    })?;
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&dir)?;
    Ok((dir, PathBuf::from(name)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_from_flags() {
        assert_eq!(Verbosity::from_flags(false, false), Verbosity::Normal);
        assert_eq!(Verbosity::from_flags(true, false), Verbosity::Quiet);
        assert_eq!(Verbosity::from_flags(false, true), Verbosity::Verbose);
        assert_eq!(Verbosity::from_flags(true, true), Verbosity::Quiet);
    }

    #[test]
    fn test_directives() {
        assert_eq!(Verbosity::Quiet.directive(), "warn");
        assert_eq!(Verbosity::Normal.directive(), "info");
        assert_eq!(Verbosity::Verbose.directive(), "debug");
    }

    #[test]
    fn test_split_log_path_creates_directory() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("logs").join("deep").join("tilekeep.log");

        let (dir, name) = split_log_path(&path).unwrap();
        assert!(dir.is_dir());
        assert_eq!(name, PathBuf::from("tilekeep.log"));
    }

    #[test]
    fn test_split_log_path_bare_name() {
        let (dir, name) = split_log_path(Path::new("x.log")).unwrap();
        assert_eq!(dir, PathBuf::from("."));
        assert_eq!(name, PathBuf::from("x.log"));
    }

    #[test]
    fn test_split_log_path_without_name_fails() {
        assert!(split_log_path(Path::new("/")).is_err());
    }

    #[test]
    fn test_guard_structure() {
        let (writer, guard) = tracing_appender::non_blocking(std::io::sink());
        drop(writer);
        let _logging_guard = LoggingGuard {
            _file_guard: Some(guard),
        };
    }

    // Actual log output uses the global subscriber, which can only be set
    // once per process, so it is exercised through the CLI.
}
