//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use std::fmt;
use std::process;

use tilekeep::config::ConfigFileError;
use tilekeep::footprint::ProjectError;
use tilekeep::operations::OperationError;
use tilekeep::provider::FetchError;
use tilekeep::server::ServeError;
use tilekeep::store::StoreError;
use tilekeep::track::TrackError;

/// Exit code used when the user interrupts an operation.
const EXIT_INTERRUPTED: i32 = 130;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(std::io::Error),
    /// Configuration error
    Config(String),
    /// Configuration file could not be read or written
    ConfigFile(ConfigFileError),
    /// Bad command-line argument
    Usage(String),
    /// Store could not be opened or described
    Store(StoreError),
    /// Track file could not be read
    Track(TrackError),
    /// Project file could not be read
    Project(ProjectError),
    /// Batch operation failed
    Operation(OperationError),
    /// HTTP client could not be created
    Client(FetchError),
    /// Tile server error
    Serve(ServeError),
    /// Failed to install the Ctrl-C handler or start the runtime
    Runtime(String),
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        match self {
            CliError::Operation(OperationError::Cancelled { .. }) => {
                process::exit(EXIT_INTERRUPTED)
            }
            CliError::Store(StoreError::Metadata { .. }) => {
                eprintln!();
                eprintln!("Stores must be described before use, for example:");
                eprintln!(
                    "  tilekeep describe cache.db --db native --tile-format png \
                     --url 'https://tile.example.org/{{zoom}}/{{x}}/{{y}}.png'"
                );
            }
            CliError::Serve(ServeError::Io(_)) => {
                eprintln!();
                eprintln!("Common issues:");
                eprintln!("  1. Port in use: choose another with --port or server.port");
                eprintln!("  2. Permissions: ports below 1024 need elevated privileges");
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(e) => write!(f, "Failed to initialize logging: {}", e),
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::ConfigFile(e) => write!(f, "{}", e),
            CliError::Usage(msg) => write!(f, "{}", msg),
            CliError::Store(e) => write!(f, "{}", e),
            CliError::Track(e) => write!(f, "{}", e),
            CliError::Project(e) => write!(f, "{}", e),
            CliError::Operation(e) => write!(f, "{}", e),
            CliError::Client(e) => write!(f, "Failed to create HTTP client: {}", e),
            CliError::Serve(e) => write!(f, "Tile server error: {}", e),
            CliError::Runtime(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::LoggingInit(e) => Some(e),
            CliError::ConfigFile(e) => Some(e),
            CliError::Store(e) => Some(e),
            CliError::Track(e) => Some(e),
            CliError::Project(e) => Some(e),
            CliError::Operation(e) => Some(e),
            CliError::Client(e) => Some(e),
            CliError::Serve(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::ConfigFile(e)
    }
}

impl From<StoreError> for CliError {
    fn from(e: StoreError) -> Self {
        CliError::Store(e)
    }
}

impl From<TrackError> for CliError {
    fn from(e: TrackError) -> Self {
        CliError::Track(e)
    }
}

impl From<ProjectError> for CliError {
    fn from(e: ProjectError) -> Self {
        CliError::Project(e)
    }
}

impl From<OperationError> for CliError {
    fn from(e: OperationError) -> Self {
        CliError::Operation(e)
    }
}

impl From<ServeError> for CliError {
    fn from(e: ServeError) -> Self {
        CliError::Serve(e)
    }
}
