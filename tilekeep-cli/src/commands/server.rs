//! Server command - serve a store over HTTP until Ctrl-C.

use std::path::Path;
use std::sync::Arc;

use tilekeep::server::{CacheServer, ServerConfig, TileService};
use tilekeep::store::TileStore;
use tracing::info;

use super::common::{open, CliContext};
use crate::error::CliError;

/// Command-line overrides of the `[server]` settings.
#[derive(Debug, Default)]
pub struct ServerOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub derive_levels: Option<u8>,
}

/// Applies overrides on top of the configured settings.
fn server_config(base: ServerConfig, overrides: ServerOverrides) -> ServerConfig {
    ServerConfig {
        host: overrides.host.unwrap_or(base.host),
        port: overrides.port.unwrap_or(base.port),
        derive_levels: overrides.derive_levels.unwrap_or(base.derive_levels),
    }
}

/// Run the server command.
pub fn run(
    context: &CliContext,
    database: &Path,
    overrides: ServerOverrides,
) -> Result<(), CliError> {
    let config = server_config(context.config().server_config(), overrides);
    let store: Arc<dyn TileStore> = Arc::from(open(database)?);

    // The blocking HTTP client inside the service must be dropped outside
    // the runtime
    let service = Arc::new(TileService::new(
        Arc::clone(&store),
        context.http_client()?,
        config.derive_levels,
    ));

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| CliError::Runtime(format!("Cannot start async runtime: {}", e)))?;

    let server = CacheServer::new(Arc::clone(&service), config);
    let result = runtime.block_on(server.serve(async {
        let _ = tokio::signal::ctrl_c().await;
        info!("Shutting down");
    }));
    drop(runtime);
    drop(service);

    store.close()?;
    result?;
    Ok(())
}
