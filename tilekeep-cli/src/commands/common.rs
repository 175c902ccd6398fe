//! Context shared across CLI commands.

use std::path::Path;
use std::sync::Arc;

use tilekeep::config::ConfigFile;
use tilekeep::operations::Operations;
use tilekeep::provider::{HttpClient, ReqwestClient};
use tilekeep::store::{open_store, TileStore};
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::error::CliError;

/// Settings and resources every command may need.
pub struct CliContext {
    config: ConfigFile,
}

impl CliContext {
    pub fn new(config: ConfigFile) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    /// Blocking HTTP client configured from `[download]`.
    pub fn http_client(&self) -> Result<Arc<dyn HttpClient>, CliError> {
        let client = ReqwestClient::with_options(
            self.config.download.timeout,
            &self.config.download.user_agent,
        )
        .map_err(CliError::Client)?;
        Ok(Arc::new(client))
    }

    /// Batch operation context that stops cleanly on Ctrl-C.
    pub fn operations(&self) -> Result<Operations, CliError> {
        let token = CancellationToken::new();
        install_interrupt_handler(token.clone())?;
        Ok(Operations::new(self.http_client()?)
            .with_batch_size(self.config.download.batch_size)
            .with_cancellation(token))
    }
}

/// Opens a described store.
pub fn open(location: &Path) -> Result<Box<dyn TileStore>, CliError> {
    Ok(open_store(location)?)
}

/// Cancels `token` on the first Ctrl-C.
fn install_interrupt_handler(token: CancellationToken) -> Result<(), CliError> {
    ctrlc::set_handler(move || {
        if !token.is_cancelled() {
            warn!("Interrupted, stopping after the current tile");
        }
        token.cancel();
    })
    .map_err(|e| CliError::Runtime(format!("Cannot install Ctrl-C handler: {}", e)))
}
