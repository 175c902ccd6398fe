//! RMaps / Maverick "sqlitedb" store.
//!
//! Tiles live in `tiles(x, y, z, s, image)` where `z` is the inverted zoom
//! `17 - zoom` and `s` is always 0. The single-row `info` table carries the
//! zoom extent in the same inverted units and is refreshed on close.

use rusqlite::{params, params_from_iter, OptionalExtension};
use tracing::trace;

use super::sqlite::{placeholders, SqliteConnection};
use super::{StoreError, StoreHandle, TileRecord, TileStore};
use crate::coord::TileCoord;

/// Offset of the inverted zoom used by the schema.
const ZOOM_BASE: i64 = 17;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS tiles (
        x     INTEGER NOT NULL,
        y     INTEGER NOT NULL,
        z     INTEGER NOT NULL,
        s     INTEGER NOT NULL DEFAULT 0,
        image BLOB,
        PRIMARY KEY (x, y, z, s)
    );
    CREATE INDEX IF NOT EXISTS tiles_z ON tiles (z);
    CREATE TABLE IF NOT EXISTS info (minzoom INTEGER, maxzoom INTEGER);
    INSERT INTO info (minzoom, maxzoom)
        SELECT NULL, NULL WHERE NOT EXISTS (SELECT 1 FROM info);
";

#[inline]
fn inverted(zoom: u8) -> i64 {
    ZOOM_BASE - zoom as i64
}

pub struct MaverickStore {
    handle: StoreHandle,
    db: SqliteConnection,
}

impl MaverickStore {
    pub fn open(handle: StoreHandle) -> Result<Self, StoreError> {
        let db = SqliteConnection::open(&handle.location, SCHEMA)?;
        Ok(Self { handle, db })
    }

    /// Recomputes the `info` row from the tiles present.
    fn refresh_info(&self) -> Result<(), StoreError> {
        self.db.with(|conn| {
            conn.execute(
                "UPDATE info SET minzoom = (SELECT MIN(z) FROM tiles),
                                 maxzoom = (SELECT MAX(z) FROM tiles)",
                [],
            )
        })?;
        Ok(())
    }

    fn inverted_zooms(zooms: &[u8]) -> Vec<i64> {
        zooms.iter().map(|&z| inverted(z)).collect()
    }
}

impl TileStore for MaverickStore {
    fn handle(&self) -> &StoreHandle {
        &self.handle
    }

    fn get(&self, coord: &TileCoord) -> Result<Option<TileRecord>, StoreError> {
        let data = self.db.with(|conn| {
            conn.query_row(
                "SELECT image FROM tiles WHERE x = ?1 AND y = ?2 AND z = ?3 AND s = 0",
                params![coord.x, coord.y, inverted(coord.zoom)],
                |row| row.get::<_, Vec<u8>>(0),
            )
            .optional()
        })?;
        Ok(data.map(|data| TileRecord::new(*coord, data, self.handle.encoding)))
    }

    fn put(&self, record: &TileRecord) -> Result<(), StoreError> {
        let c = record.coord;
        let z = inverted(c.zoom);
        trace!(tile = %c, bytes = record.data.len(), "maverick put");
        self.db.with(|conn| {
            conn.execute(
                "INSERT OR REPLACE INTO tiles (x, y, z, s, image) VALUES (?1, ?2, ?3, 0, ?4)",
                params![c.x, c.y, z, record.data],
            )?;
            conn.execute(
                "UPDATE info SET minzoom = MIN(COALESCE(minzoom, ?1), ?1),
                                 maxzoom = MAX(COALESCE(maxzoom, ?1), ?1)",
                params![z],
            )
        })?;
        Ok(())
    }

    fn delete(&self, coord: &TileCoord) -> Result<(), StoreError> {
        self.db.with(|conn| {
            conn.execute(
                "DELETE FROM tiles WHERE x = ?1 AND y = ?2 AND z = ?3 AND s = 0",
                params![coord.x, coord.y, inverted(coord.zoom)],
            )
        })?;
        Ok(())
    }

    fn exists(&self, coord: &TileCoord) -> Result<bool, StoreError> {
        self.db.with(|conn| {
            conn.query_row(
                "SELECT EXISTS (SELECT 1 FROM tiles WHERE x = ?1 AND y = ?2 AND z = ?3 AND s = 0)",
                params![coord.x, coord.y, inverted(coord.zoom)],
                |row| row.get(0),
            )
        })
    }

    fn count_tiles(&self, zooms: &[u8]) -> Result<u64, StoreError> {
        if zooms.is_empty() {
            return Ok(0);
        }
        let sql = format!(
            "SELECT COUNT(*) FROM tiles WHERE s = 0 AND z IN ({})",
            placeholders(zooms.len())
        );
        let zs = Self::inverted_zooms(zooms);
        self.db
            .with(|conn| {
                conn.query_row(&sql, params_from_iter(zs.iter()), |row| {
                    row.get::<_, i64>(0)
                })
            })
            .map(|n| n as u64)
    }

    fn list_tiles(&self, zooms: &[u8]) -> Result<Vec<TileCoord>, StoreError> {
        if zooms.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT z, x, y FROM tiles WHERE s = 0 AND z IN ({})",
            placeholders(zooms.len())
        );
        let zs = Self::inverted_zooms(zooms);
        let rows = self.db.with(|conn| {
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(params_from_iter(zs.iter()), |row| {
                    Ok((row.get::<_, i64>(0)?, row.get::<_, u32>(1)?, row.get::<_, u32>(2)?))
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(rows)
        })?;

        let mut tiles = rows
            .into_iter()
            .map(|(z, x, y)| {
                let zoom = u8::try_from(ZOOM_BASE - z).unwrap_or(u8::MAX);
                TileCoord::new(zoom, x, y).map_err(StoreError::from)
            })
            .collect::<Result<Vec<_>, _>>()?;
        tiles.sort();
        Ok(tiles)
    }

    fn close(&self) -> Result<(), StoreError> {
        if self.db.is_open() {
            self.refresh_info()?;
        }
        self.db.close()
    }
}

impl Drop for MaverickStore {
    fn drop(&mut self) {
        let _ = self.close();
    }
}
