//! Tile storage
//!
//! A [`TileStore`] is a persistent mapping from [`TileCoord`] to tile bytes.
//! Four backend layouts implement the same contract and are selected once,
//! when the store is opened from its metadata sidecar:
//!
//! | Variant | Layout |
//! |---|---|
//! | [`StoreVariant::Native`] | SQLite `tiles(zoom, x, y, image)` |
//! | [`StoreVariant::Maverick`] | SQLite `tiles(x, y, z, s, image)`, `z = 17 - zoom` |
//! | [`StoreVariant::PlainFolder`] | `zoom/x/y.ext` |
//! | [`StoreVariant::RowFolder`] | `zoom/y/x.ext` |
//!
//! Stores holding the same tiles report the same `count_tiles` and
//! `list_tiles` results whatever their variant.

pub mod encoding;
mod folder;
mod maverick;
pub mod metadata;
mod native;
mod sqlite;

pub use encoding::{EncodingError, TileEncoding};
pub use folder::FolderStore;
pub use maverick::MaverickStore;
pub use metadata::{sidecar_path, StoreHandle, StoreVariant};
pub use native::NativeStore;

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

use crate::coord::{CoordError, TileCoord};

/// Errors from store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Invalid store metadata {path}: {reason}")]
    Metadata { path: PathBuf, reason: String },

    #[error("Unknown store format '{0}' (expected native, folder, rowfolder or maverick)")]
    UnknownVariant(String),

    #[error("Store {0} is closed")]
    Closed(PathBuf),

    #[error("Corrupt tile entry: {0}")]
    Corrupt(#[from] CoordError),
}

/// A tile and its bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileRecord {
    pub coord: TileCoord,
    pub data: Vec<u8>,
    pub encoding: TileEncoding,
}

impl TileRecord {
    pub fn new(coord: TileCoord, data: Vec<u8>, encoding: TileEncoding) -> Self {
        Self {
            coord,
            data,
            encoding,
        }
    }
}

/// Uniform contract over all store variants.
///
/// `put` stores bytes verbatim; callers convert them to the store's encoding
/// first (see [`encoding::convert`]). `delete` of an absent tile is a no-op.
/// `list_tiles` returns coordinates sorted by `(zoom, x, y)` and always agrees
/// with `count_tiles` for the same zooms.
pub trait TileStore: Send + Sync {
    fn handle(&self) -> &StoreHandle;

    fn get(&self, coord: &TileCoord) -> Result<Option<TileRecord>, StoreError>;

    fn put(&self, record: &TileRecord) -> Result<(), StoreError>;

    fn delete(&self, coord: &TileCoord) -> Result<(), StoreError>;

    fn exists(&self, coord: &TileCoord) -> Result<bool, StoreError>;

    fn count_tiles(&self, zooms: &[u8]) -> Result<u64, StoreError>;

    fn list_tiles(&self, zooms: &[u8]) -> Result<Vec<TileCoord>, StoreError>;

    /// Releases backend resources. Calling it again is a no-op.
    fn close(&self) -> Result<(), StoreError>;

    fn encoding(&self) -> TileEncoding {
        self.handle().encoding
    }
}

/// Writes the metadata sidecar and creates empty backend storage.
///
/// Describing an existing store rewrites its metadata and keeps its tiles.
pub fn describe(handle: &StoreHandle) -> Result<(), StoreError> {
    handle.save()?;
    let store = open_with(handle.clone())?;
    store.close()?;
    info!(
        location = %handle.location.display(),
        variant = %handle.variant,
        encoding = %handle.encoding,
        "Described store"
    );
    Ok(())
}

/// Opens the store at `location` according to its sidecar.
pub fn open_store(location: &Path) -> Result<Box<dyn TileStore>, StoreError> {
    let handle = StoreHandle::load(location)?;
    open_with(handle)
}

fn open_with(handle: StoreHandle) -> Result<Box<dyn TileStore>, StoreError> {
    debug!(
        location = %handle.location.display(),
        variant = %handle.variant,
        "Opening store"
    );
    Ok(match handle.variant {
        StoreVariant::Native => Box::new(NativeStore::open(handle)?),
        StoreVariant::Maverick => Box::new(MaverickStore::open(handle)?),
        StoreVariant::PlainFolder | StoreVariant::RowFolder => {
            Box::new(FolderStore::open(handle)?)
        }
    })
}
