//! Tile derivation by zoom subdivision
//!
//! A tile at zoom `T` is produced from its cached ancestor at a coarser zoom
//! `S` by cropping the ancestor's sub-square that the tile covers and scaling
//! it back up to full tile size. No network access is involved.

use image::imageops::FilterType;
use image::GenericImageView;
use thiserror::Error;
use tracing::debug;

use crate::coord::{CoordError, TileCoord};
use crate::store::encoding::{self, EncodingError, TileEncoding};
use crate::store::{StoreError, TileRecord, TileStore};

/// Errors deriving a tile.
#[derive(Debug, Error)]
pub enum DerivationError {
    #[error("No ancestor of {tile} present at zoom {source_zoom}")]
    AncestorMissing { tile: TileCoord, source_zoom: u8 },

    #[error("Cannot derive {tile} from zoom {source_zoom}: {reason}")]
    InvalidSource {
        tile: TileCoord,
        source_zoom: u8,
        reason: CoordError,
    },

    #[error("Failed to decode ancestor {tile}: {source}")]
    Decode {
        tile: TileCoord,
        #[source]
        source: image::ImageError,
    },

    #[error(transparent)]
    Encode(#[from] EncodingError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Derives fine-zoom tiles from coarse-zoom ones.
#[derive(Debug, Clone, Copy)]
pub struct Deriver {
    filter: FilterType,
}

impl Default for Deriver {
    fn default() -> Self {
        Self {
            filter: FilterType::CatmullRom,
        }
    }
}

impl Deriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different resampling filter.
    pub fn with_filter(mut self, filter: FilterType) -> Self {
        self.filter = filter;
        self
    }

    /// Derives `coord` from its ancestor at `source_zoom`.
    ///
    /// The result is encoded in the store's encoding; server-encoded stores
    /// keep the ancestor's format.
    pub fn derive(
        &self,
        store: &dyn TileStore,
        coord: &TileCoord,
        source_zoom: u8,
    ) -> Result<TileRecord, DerivationError> {
        let invalid = |reason| DerivationError::InvalidSource {
            tile: *coord,
            source_zoom,
            reason,
        };
        let ancestor = coord.ancestor(source_zoom).map_err(invalid)?;
        let (dx, dy, side) = coord.offset_in_ancestor(source_zoom).map_err(invalid)?;

        let parent = store
            .get(&ancestor)?
            .ok_or(DerivationError::AncestorMissing {
                tile: *coord,
                source_zoom,
            })?;

        let image = image::load_from_memory(&parent.data).map_err(|source| {
            DerivationError::Decode {
                tile: ancestor,
                source,
            }
        })?;

        let (width, height) = image.dimensions();
        let sub_w = (width / side).max(1);
        let sub_h = (height / side).max(1);
        let left = (dx * width / side).min(width - sub_w);
        let top = (dy * height / side).min(height - sub_h);

        let resized = image
            .crop_imm(left, top, sub_w, sub_h)
            .resize_exact(width, height, self.filter);

        let target = match store.encoding() {
            TileEncoding::Server => {
                TileEncoding::detect(&parent.data).unwrap_or(TileEncoding::Png)
            }
            concrete => concrete,
        };
        let data = encoding::encode(&resized, target)?;

        debug!(tile = %coord, ancestor = %ancestor, "Derived tile");
        Ok(TileRecord::new(*coord, data, store.encoding()))
    }

    /// Derives `coord` from the nearest present ancestor at most
    /// `max_levels` zooms above it.
    pub fn derive_nearest(
        &self,
        store: &dyn TileStore,
        coord: &TileCoord,
        max_levels: u8,
    ) -> Result<TileRecord, DerivationError> {
        let lowest = coord.zoom.saturating_sub(max_levels);
        for source_zoom in (lowest..coord.zoom).rev() {
            let ancestor = coord.ancestor(source_zoom).map_err(|reason| {
                DerivationError::InvalidSource {
                    tile: *coord,
                    source_zoom,
                    reason,
                }
            })?;
            if store.exists(&ancestor)? {
                return self.derive(store, coord, source_zoom);
            }
        }
        Err(DerivationError::AncestorMissing {
            tile: *coord,
            source_zoom: lowest,
        })
    }
}
