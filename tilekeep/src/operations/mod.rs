//! Batch tile operations
//!
//! [`Operations`] carries the context shared by every batch command: the
//! HTTP client used for downloads, a cancellation token and the download
//! batch size. Each operation resolves its [`TileRequest`] into per-zoom
//! [`TilePlan`]s and reports [`Stats`].
//!
//! | Operation | present | downloaded | missing |
//! |---|---|---|---|
//! | count | in store (or derivable) | 0 | not in store |
//! | insert | already in store or derived | fetched | failed or not required |
//! | export / import | available in the source | 0 | not in the source or not convertible |
//! | delete | deleted | 0 | not in store |
//!
//! Per-tile download, decode and derivation failures are logged and counted
//! as missing. Store errors abort the operation.

mod stats;
mod tileset;

pub use stats::{Stats, ZoomStat};
pub use tileset::{TilePlan, TileRequest};

use std::sync::Arc;

use rayon::prelude::*;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::coord::{CoordError, TileCoord};
use crate::derive::{DerivationError, Deriver};
use crate::footprint::FootprintError;
use crate::provider::{FetchError, HttpClient, TileFetcher, UrlTemplate};
use crate::store::encoding::{self, TileEncoding};
use crate::store::{StoreError, TileRecord, TileStore};
use crate::zoom::ZoomError;

/// Default number of tiles downloaded in parallel per batch.
pub const DEFAULT_BATCH_SIZE: usize = 16;

/// Errors that abort an operation.
#[derive(Debug, Error)]
pub enum OperationError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Zoom(#[from] ZoomError),

    #[error(transparent)]
    Coord(#[from] CoordError),

    #[error(transparent)]
    Footprint(#[from] FootprintError),

    #[error("Project requests zoom {zoom} from different source zooms")]
    MixedSources { zoom: u8 },

    #[error("Cannot download tiles: {0}")]
    Fetch(#[from] FetchError),

    #[error("Operation cancelled after {partial}")]
    Cancelled { partial: Stats },
}

/// Context for batch operations.
pub struct Operations {
    client: Arc<dyn HttpClient>,
    cancel: CancellationToken,
    batch_size: usize,
    deriver: Deriver,
}

impl Operations {
    pub fn new(client: Arc<dyn HttpClient>) -> Self {
        Self {
            client,
            cancel: CancellationToken::new(),
            batch_size: DEFAULT_BATCH_SIZE,
            deriver: Deriver::new(),
        }
    }

    /// Use an externally controlled cancellation token.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    fn check_cancelled(&self, partial: Stats) -> Result<(), OperationError> {
        if self.cancel.is_cancelled() {
            warn!(%partial, "Operation cancelled");
            return Err(OperationError::Cancelled { partial });
        }
        Ok(())
    }

    /// Resolves a request against `store` into per-zoom plans.
    pub fn resolve(
        &self,
        store: &dyn TileStore,
        request: &TileRequest,
    ) -> Result<Vec<TilePlan>, OperationError> {
        tileset::plan(store, store, request)
    }

    /// Counts required tiles and how many of them are available.
    ///
    /// Under zoom subdivision every required tile has a present ancestor and
    /// counts as present.
    pub fn count(
        &self,
        store: &dyn TileStore,
        request: &TileRequest,
    ) -> Result<Stats, OperationError> {
        let mut stats = Stats::default();
        for plan in self.resolve(store, request)? {
            stats.total += plan.tiles.len() as u64;
            stats.missing += plan.surplus() as u64;
            for tile in &plan.required {
                self.check_cancelled(stats)?;
                if plan.is_subdivision() || store.exists(tile)? {
                    stats.present += 1;
                } else {
                    stats.missing += 1;
                }
            }
        }
        info!(%stats, "count");
        Ok(stats)
    }

    /// Reports, per target zoom, the size of the tile set and how much of it
    /// the store holds. Nothing is fetched or written.
    pub fn stat(
        &self,
        store: &dyn TileStore,
        request: &TileRequest,
    ) -> Result<Vec<ZoomStat>, OperationError> {
        let mut report = Vec::new();
        for plan in self.resolve(store, request)? {
            let mut zoom = ZoomStat {
                zoom: plan.zoom,
                tiles: plan.tiles.len() as u64,
                ..ZoomStat::default()
            };
            for tile in &plan.tiles {
                if let Some(record) = store.get(tile)? {
                    zoom.present += 1;
                    zoom.bytes += record.data.len() as u64;
                }
            }
            debug!(zoom = zoom.zoom, tiles = zoom.tiles, present = zoom.present, "stat");
            report.push(zoom);
        }
        Ok(report)
    }

    /// Brings required tiles into the store.
    ///
    /// Missing tiles are derived from their ancestor when the zoom is produced
    /// by subdivision, and downloaded otherwise or when derivation fails.
    pub fn insert(
        &self,
        store: &dyn TileStore,
        request: &TileRequest,
    ) -> Result<Stats, OperationError> {
        let mut stats = Stats::default();
        for plan in self.resolve(store, request)? {
            stats.total += plan.tiles.len() as u64;
            stats.missing += plan.surplus() as u64;

            let mut to_fetch = Vec::new();
            for tile in &plan.required {
                self.check_cancelled(stats)?;
                if store.exists(tile)? {
                    stats.present += 1;
                    continue;
                }
                if let Some(source) = plan.source {
                    match self.deriver.derive(store, tile, source) {
                        Ok(record) => {
                            store.put(&record)?;
                            stats.present += 1;
                            continue;
                        }
                        Err(DerivationError::Store(e)) => return Err(e.into()),
                        Err(e) => warn!(tile = %tile, error = %e, "Derivation failed, downloading"),
                    }
                }
                to_fetch.push(*tile);
            }

            self.download(store, &to_fetch, &mut stats)?;
        }
        info!(%stats, "insert");
        Ok(stats)
    }

    /// Downloads `tiles` in parallel batches and stores them serially.
    fn download(
        &self,
        store: &dyn TileStore,
        tiles: &[TileCoord],
        stats: &mut Stats,
    ) -> Result<(), OperationError> {
        if tiles.is_empty() {
            return Ok(());
        }
        let template = UrlTemplate::parse(&store.handle().url_template)?;
        let fetcher = TileFetcher::new(Arc::clone(&self.client), template);
        let target = store.encoding();

        for batch in tiles.chunks(self.batch_size) {
            self.check_cancelled(*stats)?;

            let results: Vec<(TileCoord, Result<Vec<u8>, FetchError>)> = batch
                .par_iter()
                .map(|tile| (*tile, fetcher.fetch(tile)))
                .collect();

            for (tile, result) in results {
                let data = match result {
                    Ok(data) => data,
                    Err(e) => {
                        warn!(tile = %tile, error = %e, "Download failed");
                        stats.missing += 1;
                        continue;
                    }
                };
                match to_store_encoding(&data, target) {
                    Ok(data) => {
                        store.put(&TileRecord::new(tile, data, target))?;
                        stats.downloaded += 1;
                    }
                    Err(reason) => {
                        warn!(tile = %tile, %reason, "Discarding downloaded tile");
                        stats.missing += 1;
                    }
                }
            }
            debug!(batch = batch.len(), %stats, "Downloaded batch");
        }
        Ok(())
    }

    /// Copies required tiles from `source` to `dest` when `dest` lacks them.
    pub fn export(
        &self,
        source: &dyn TileStore,
        dest: &dyn TileStore,
        request: &TileRequest,
    ) -> Result<Stats, OperationError> {
        let plans = tileset::plan(source, source, request)?;
        let stats = self.copy(source, dest, &plans, false)?;
        info!(%stats, dest = %dest.handle().location.display(), "export");
        Ok(stats)
    }

    /// Copies every required tile present in `source` into `dest`,
    /// overwriting what `dest` holds.
    pub fn import(
        &self,
        dest: &dyn TileStore,
        source: &dyn TileStore,
        request: &TileRequest,
    ) -> Result<Stats, OperationError> {
        let plans = tileset::plan(source, dest, request)?;
        let stats = self.copy(source, dest, &plans, true)?;
        info!(%stats, source = %source.handle().location.display(), "import");
        Ok(stats)
    }

    fn copy(
        &self,
        source: &dyn TileStore,
        dest: &dyn TileStore,
        plans: &[TilePlan],
        overwrite: bool,
    ) -> Result<Stats, OperationError> {
        let mut stats = Stats::default();
        for plan in plans {
            stats.total += plan.tiles.len() as u64;
            stats.missing += plan.surplus() as u64;
            for tile in &plan.required {
                self.check_cancelled(stats)?;
                let Some(record) = source.get(tile)? else {
                    stats.missing += 1;
                    continue;
                };
                if !overwrite && dest.exists(tile)? {
                    stats.present += 1;
                    continue;
                }
                match encoding::convert(&record.data, record.encoding, dest.encoding()) {
                    Ok(data) => {
                        dest.put(&TileRecord::new(*tile, data, dest.encoding()))?;
                        stats.present += 1;
                    }
                    Err(e) => {
                        warn!(tile = %tile, error = %e, "Cannot convert tile, skipping");
                        stats.missing += 1;
                    }
                }
            }
        }
        Ok(stats)
    }

    /// Removes required tiles from the store.
    pub fn delete(
        &self,
        store: &dyn TileStore,
        request: &TileRequest,
    ) -> Result<Stats, OperationError> {
        let mut stats = Stats::default();
        for plan in self.resolve(store, request)? {
            stats.total += plan.tiles.len() as u64;
            stats.missing += plan.surplus() as u64;
            for tile in &plan.required {
                self.check_cancelled(stats)?;
                if store.exists(tile)? {
                    store.delete(tile)?;
                    stats.present += 1;
                } else {
                    stats.missing += 1;
                }
            }
        }
        info!(%stats, "delete");
        Ok(stats)
    }
}

/// Converts downloaded bytes to the store encoding.
///
/// Concrete encodings only accept recognizable images.
pub(crate) fn to_store_encoding(data: &[u8], target: TileEncoding) -> Result<Vec<u8>, String> {
    if !target.is_concrete() {
        return Ok(data.to_vec());
    }
    let detected = TileEncoding::detect(data).ok_or_else(|| "not a PNG or JPEG image".to_string())?;
    encoding::convert(data, detected, target).map_err(|e| e.to_string())
}
