//! Directory-tree stores.
//!
//! One file per tile under the store location, either `zoom/x/y.ext`
//! ([`StoreVariant::PlainFolder`]) or `zoom/y/x.ext`
//! ([`StoreVariant::RowFolder`]). Files are written to a temporary name and
//! renamed into place.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::trace;

use super::metadata::StoreVariant;
use super::{StoreError, StoreHandle, TileRecord, TileStore};
use crate::coord::TileCoord;

pub struct FolderStore {
    handle: StoreHandle,
    extension: String,
    row_major: bool,
}

impl FolderStore {
    pub fn open(handle: StoreHandle) -> Result<Self, StoreError> {
        fs::create_dir_all(&handle.location)?;
        Ok(Self {
            extension: handle.file_extension(),
            row_major: handle.variant == StoreVariant::RowFolder,
            handle,
        })
    }

    fn tile_path(&self, coord: &TileCoord) -> PathBuf {
        let (outer, inner) = if self.row_major {
            (coord.y, coord.x)
        } else {
            (coord.x, coord.y)
        };
        self.handle
            .location
            .join(coord.zoom.to_string())
            .join(outer.to_string())
            .join(format!("{}.{}", inner, self.extension))
    }

    /// Parses `<n>.<ext>` file names; other files are ignored.
    fn parse_file_name(&self, path: &Path) -> Option<u32> {
        let ext = path.extension()?.to_str()?;
        if !ext.eq_ignore_ascii_case(&self.extension) {
            return None;
        }
        path.file_stem()?.to_str()?.parse().ok()
    }

    fn list_zoom(&self, zoom: u8, tiles: &mut Vec<TileCoord>) -> Result<(), StoreError> {
        let zoom_dir = self.handle.location.join(zoom.to_string());
        let outer_entries = match fs::read_dir(&zoom_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e.into()),
        };

        for outer_entry in outer_entries {
            let outer_entry = outer_entry?;
            if !outer_entry.file_type()?.is_dir() {
                continue;
            }
            let Some(outer) = outer_entry
                .file_name()
                .to_str()
                .and_then(|s| s.parse::<u32>().ok())
            else {
                continue;
            };

            for entry in fs::read_dir(outer_entry.path())? {
                let entry = entry?;
                if !entry.file_type()?.is_file() {
                    continue;
                }
                let Some(inner) = self.parse_file_name(&entry.path()) else {
                    continue;
                };
                let (x, y) = if self.row_major {
                    (inner, outer)
                } else {
                    (outer, inner)
                };
                let coord = TileCoord { zoom, x, y };
                if coord.is_valid() {
                    tiles.push(coord);
                }
            }
        }
        Ok(())
    }
}

impl TileStore for FolderStore {
    fn handle(&self) -> &StoreHandle {
        &self.handle
    }

    fn get(&self, coord: &TileCoord) -> Result<Option<TileRecord>, StoreError> {
        match fs::read(self.tile_path(coord)) {
            Ok(data) => Ok(Some(TileRecord::new(*coord, data, self.handle.encoding))),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn put(&self, record: &TileRecord) -> Result<(), StoreError> {
        let path = self.tile_path(&record.coord);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        trace!(tile = %record.coord, path = %path.display(), "folder put");

        // Write atomically via temp file
        let temp_path = path.with_extension(format!("{}.tmp", self.extension));
        fs::write(&temp_path, &record.data)?;
        fs::rename(&temp_path, &path)?;
        Ok(())
    }

    fn delete(&self, coord: &TileCoord) -> Result<(), StoreError> {
        match fs::remove_file(self.tile_path(coord)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn exists(&self, coord: &TileCoord) -> Result<bool, StoreError> {
        Ok(self.tile_path(coord).is_file())
    }

    fn count_tiles(&self, zooms: &[u8]) -> Result<u64, StoreError> {
        Ok(self.list_tiles(zooms)?.len() as u64)
    }

    fn list_tiles(&self, zooms: &[u8]) -> Result<Vec<TileCoord>, StoreError> {
        let mut tiles = Vec::new();
        for &zoom in zooms {
            self.list_zoom(zoom, &mut tiles)?;
        }
        tiles.sort();
        tiles.dedup();
        Ok(tiles)
    }

    fn close(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::tests::{png_tile, tile};
    use crate::store::TileEncoding;

    fn store(root: &Path, variant: StoreVariant, encoding: TileEncoding) -> FolderStore {
        let handle = StoreHandle::new(
            variant,
            root.join("tiles"),
            "http://host/{zoom}/{x}/{y}.jpg",
            encoding,
        );
        FolderStore::open(handle).unwrap()
    }

    #[test]
    fn test_plain_layout() {
        let dir = tempfile::tempdir().unwrap();
        let s = store(dir.path(), StoreVariant::PlainFolder, TileEncoding::Png);
        s.put(&TileRecord::new(tile(4, 3, 9), png_tile(1), TileEncoding::Png))
            .unwrap();
        assert!(dir.path().join("tiles/4/3/9.png").is_file());
    }

    #[test]
    fn test_row_layout() {
        let dir = tempfile::tempdir().unwrap();
        let s = store(dir.path(), StoreVariant::RowFolder, TileEncoding::Png);
        s.put(&TileRecord::new(tile(4, 3, 9), png_tile(1), TileEncoding::Png))
            .unwrap();
        assert!(dir.path().join("tiles/4/9/3.png").is_file());
        assert_eq!(s.list_tiles(&[4]).unwrap(), vec![tile(4, 3, 9)]);
    }

    #[test]
    fn test_server_encoding_uses_template_extension() {
        let dir = tempfile::tempdir().unwrap();
        let s = store(dir.path(), StoreVariant::PlainFolder, TileEncoding::Server);
        s.put(&TileRecord::new(tile(2, 1, 1), b"raw".to_vec(), TileEncoding::Server))
            .unwrap();
        assert!(dir.path().join("tiles/2/1/1.jpg").is_file());
    }

    #[test]
    fn test_foreign_files_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let s = store(dir.path(), StoreVariant::PlainFolder, TileEncoding::Png);
        s.put(&TileRecord::new(tile(2, 1, 1), png_tile(1), TileEncoding::Png))
            .unwrap();

        let col = dir.path().join("tiles/2/1");
        fs::write(col.join("2.txt"), b"x").unwrap();
        fs::write(col.join("notes.png"), b"x").unwrap();
        fs::write(col.join("9.png"), b"x").unwrap(); // outside the zoom-2 grid
        fs::create_dir_all(dir.path().join("tiles/2/abc")).unwrap();

        assert_eq!(s.list_tiles(&[2]).unwrap(), vec![tile(2, 1, 1)]);
        assert_eq!(s.count_tiles(&[2]).unwrap(), 1);
    }

    #[test]
    fn test_no_temp_files_left() {
        let dir = tempfile::tempdir().unwrap();
        let s = store(dir.path(), StoreVariant::PlainFolder, TileEncoding::Png);
        s.put(&TileRecord::new(tile(1, 0, 1), png_tile(1), TileEncoding::Png))
            .unwrap();
        let names: Vec<_> = fs::read_dir(dir.path().join("tiles/1/0"))
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("1.png")]);
    }
}
