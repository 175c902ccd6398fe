//! Caching tile server
//!
//! Serves `GET /{zoom}/{x}/{y}[.ext]` from a store. A miss is answered by
//! deriving the tile from the nearest cached ancestor or, failing that, by
//! downloading it from the store's upstream URL; the result is persisted
//! before it is returned.
//!
//! [`TileService`] holds the synchronous core and is shared by the axum
//! handlers, which call it on the blocking thread pool. Requests for the same
//! coordinate are serialized so a tile is fetched at most once.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use dashmap::DashMap;
use parking_lot::Mutex;
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

use crate::coord::{CoordError, TileCoord};
use crate::derive::{DerivationError, Deriver};
use crate::operations::to_store_encoding;
use crate::provider::{FetchError, HttpClient, TileFetcher, UrlTemplate};
use crate::store::encoding::content_type;
use crate::store::{StoreError, TileRecord, TileStore};

/// Default listen address.
pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8080;

/// Default number of coarser zoom levels searched for an ancestor.
pub const DEFAULT_DERIVE_LEVELS: u8 = 0;

/// Errors answering a tile request.
#[derive(Debug, Error)]
pub enum ServeError {
    #[error(transparent)]
    InvalidCoord(#[from] CoordError),

    #[error("Bad tile path: {0}")]
    BadPath(String),

    #[error("Upstream fetch failed: {0}")]
    Upstream(#[from] FetchError),

    #[error("Upstream returned an unusable tile: {0}")]
    BadUpstreamTile(String),

    #[error("Derivation failed: {0}")]
    Derivation(DerivationError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Server I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Request handler failed: {0}")]
    Internal(String),
}

impl ServeError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidCoord(_) | Self::BadPath(_) => StatusCode::BAD_REQUEST,
            Self::Upstream(_) | Self::BadUpstreamTile(_) | Self::Derivation(_) => {
                StatusCode::BAD_GATEWAY
            }
            Self::Store(_) | Self::Io(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<DerivationError> for ServeError {
    fn from(e: DerivationError) -> Self {
        match e {
            DerivationError::Store(e) => Self::Store(e),
            other => Self::Derivation(other),
        }
    }
}

impl IntoResponse for ServeError {
    fn into_response(self) -> Response {
        (self.status_code(), self.to_string()).into_response()
    }
}

/// Server settings, fixed for the lifetime of a server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// How many coarser zooms to search for an ancestor to derive from
    pub derive_levels: u8,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            derive_levels: DEFAULT_DERIVE_LEVELS,
        }
    }
}

impl ServerConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Where a served tile came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileOrigin {
    Store,
    Derived,
    Fetched,
}

/// A tile ready to be sent.
#[derive(Debug, Clone)]
pub struct ServedTile {
    pub data: Vec<u8>,
    pub content_type: &'static str,
    pub origin: TileOrigin,
}

/// Synchronous request core shared by all handlers.
pub struct TileService {
    store: Arc<dyn TileStore>,
    fetcher: Result<TileFetcher, FetchError>,
    deriver: Deriver,
    derive_levels: u8,
    locks: DashMap<TileCoord, Arc<Mutex<()>>>,
}

impl TileService {
    pub fn new(store: Arc<dyn TileStore>, client: Arc<dyn HttpClient>, derive_levels: u8) -> Self {
        let fetcher = UrlTemplate::parse(&store.handle().url_template)
            .map(|template| TileFetcher::new(client, template));
        if let Err(e) = &fetcher {
            warn!(error = %e, "Store has no usable upstream URL, misses cannot be fetched");
        }
        Self {
            store,
            fetcher,
            deriver: Deriver::new(),
            derive_levels,
            locks: DashMap::new(),
        }
    }

    pub fn store(&self) -> &Arc<dyn TileStore> {
        &self.store
    }

    /// Answers one tile request.
    pub fn resolve(&self, zoom: u8, x: u32, y: u32) -> Result<ServedTile, ServeError> {
        let coord = TileCoord::new(zoom, x, y)?;

        let lock = self
            .locks
            .entry(coord)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let result = {
            let _guard = lock.lock();
            self.resolve_locked(&coord)
        };
        drop(lock);
        self.locks
            .remove_if(&coord, |_, l| Arc::strong_count(l) == 1);

        result
    }

    fn resolve_locked(&self, coord: &TileCoord) -> Result<ServedTile, ServeError> {
        let encoding = self.store.encoding();
        let served = |data: Vec<u8>, origin| ServedTile {
            content_type: content_type(encoding, &data),
            data,
            origin,
        };

        if let Some(record) = self.store.get(coord)? {
            debug!(tile = %coord, "Served from store");
            return Ok(served(record.data, TileOrigin::Store));
        }

        if self.derive_levels > 0 {
            match self
                .deriver
                .derive_nearest(self.store.as_ref(), coord, self.derive_levels)
            {
                Ok(record) => {
                    self.store.put(&record)?;
                    debug!(tile = %coord, "Derived on miss");
                    return Ok(served(record.data, TileOrigin::Derived));
                }
                Err(DerivationError::Store(e)) => return Err(e.into()),
                Err(DerivationError::AncestorMissing { .. }) => {}
                Err(e) => warn!(tile = %coord, error = %e, "Derivation failed, fetching"),
            }
        }

        let fetcher = self.fetcher.as_ref().map_err(|e| e.clone())?;
        let data = fetcher.fetch(coord)?;
        let data = to_store_encoding(&data, encoding).map_err(ServeError::BadUpstreamTile)?;
        self.store
            .put(&TileRecord::new(*coord, data.clone(), encoding))?;
        debug!(tile = %coord, "Fetched on miss");
        Ok(served(data, TileOrigin::Fetched))
    }
}

/// Parses `5`, `5.png` or `5.jpg` into a tile index.
fn parse_index(segment: &str) -> Result<u32, ServeError> {
    let digits = segment.split_once('.').map_or(segment, |(n, _)| n);
    digits
        .parse()
        .map_err(|_| ServeError::BadPath(segment.to_string()))
}

async fn get_tile(
    State(service): State<Arc<TileService>>,
    Path((zoom, x, y)): Path<(String, String, String)>,
) -> Result<Response, ServeError> {
    let zoom: u8 = zoom.parse().map_err(|_| ServeError::BadPath(zoom.clone()))?;
    let x = parse_index(&x)?;
    let y = parse_index(&y)?;

    let tile = tokio::task::spawn_blocking(move || service.resolve(zoom, x, y))
        .await
        .map_err(|e| ServeError::Internal(e.to_string()))??;

    Ok(([(header::CONTENT_TYPE, tile.content_type)], tile.data).into_response())
}

/// Builds the HTTP router.
pub fn router(service: Arc<TileService>) -> Router {
    Router::new()
        .route("/:zoom/:x/:y", get(get_tile))
        .with_state(service)
}

/// HTTP front end of a [`TileService`].
pub struct CacheServer {
    service: Arc<TileService>,
    config: ServerConfig,
}

impl CacheServer {
    pub fn new(service: Arc<TileService>, config: ServerConfig) -> Self {
        Self { service, config }
    }

    /// Binds the configured address and serves until `shutdown` resolves.
    pub async fn serve<F>(self, shutdown: F) -> Result<(), ServeError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(self.config.address()).await?;
        self.serve_on(listener, shutdown).await
    }

    /// Serves on an already bound listener until `shutdown` resolves.
    pub async fn serve_on<F>(self, listener: TcpListener, shutdown: F) -> Result<(), ServeError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr: SocketAddr = listener.local_addr()?;
        info!(
            %addr,
            store = %self.service.store().handle().location.display(),
            derive_levels = self.config.derive_levels,
            "Tile server listening"
        );
        axum::serve(listener, router(self.service))
            .with_graceful_shutdown(shutdown)
            .await?;
        info!("Tile server stopped");
        Ok(())
    }
}
