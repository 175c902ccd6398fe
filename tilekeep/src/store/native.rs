//! Native SQLite store: one `tiles` table keyed by `(zoom, x, y)`.

use rusqlite::{params, params_from_iter, OptionalExtension};
use tracing::trace;

use super::sqlite::{placeholders, SqliteConnection};
use super::{StoreError, StoreHandle, TileRecord, TileStore};
use crate::coord::TileCoord;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS tiles (
        zoom  INTEGER NOT NULL,
        x     INTEGER NOT NULL,
        y     INTEGER NOT NULL,
        image BLOB    NOT NULL,
        PRIMARY KEY (zoom, x, y)
    );
";

pub struct NativeStore {
    handle: StoreHandle,
    db: SqliteConnection,
}

impl NativeStore {
    pub fn open(handle: StoreHandle) -> Result<Self, StoreError> {
        let db = SqliteConnection::open(&handle.location, SCHEMA)?;
        Ok(Self { handle, db })
    }
}

impl TileStore for NativeStore {
    fn handle(&self) -> &StoreHandle {
        &self.handle
    }

    fn get(&self, coord: &TileCoord) -> Result<Option<TileRecord>, StoreError> {
        let data = self.db.with(|conn| {
            conn.query_row(
                "SELECT image FROM tiles WHERE zoom = ?1 AND x = ?2 AND y = ?3",
                params![coord.zoom, coord.x, coord.y],
                |row| row.get::<_, Vec<u8>>(0),
            )
            .optional()
        })?;
        Ok(data.map(|data| TileRecord::new(*coord, data, self.handle.encoding)))
    }

    fn put(&self, record: &TileRecord) -> Result<(), StoreError> {
        let c = record.coord;
        trace!(tile = %c, bytes = record.data.len(), "native put");
        self.db.with(|conn| {
            conn.execute(
                "INSERT OR REPLACE INTO tiles (zoom, x, y, image) VALUES (?1, ?2, ?3, ?4)",
                params![c.zoom, c.x, c.y, record.data],
            )
        })?;
        Ok(())
    }

    fn delete(&self, coord: &TileCoord) -> Result<(), StoreError> {
        self.db.with(|conn| {
            conn.execute(
                "DELETE FROM tiles WHERE zoom = ?1 AND x = ?2 AND y = ?3",
                params![coord.zoom, coord.x, coord.y],
            )
        })?;
        Ok(())
    }

    fn exists(&self, coord: &TileCoord) -> Result<bool, StoreError> {
        self.db.with(|conn| {
            conn.query_row(
                "SELECT EXISTS (SELECT 1 FROM tiles WHERE zoom = ?1 AND x = ?2 AND y = ?3)",
                params![coord.zoom, coord.x, coord.y],
                |row| row.get(0),
            )
        })
    }

    fn count_tiles(&self, zooms: &[u8]) -> Result<u64, StoreError> {
        if zooms.is_empty() {
            return Ok(0);
        }
        let sql = format!(
            "SELECT COUNT(*) FROM tiles WHERE zoom IN ({})",
            placeholders(zooms.len())
        );
        self.db.with(|conn| {
            conn.query_row(&sql, params_from_iter(zooms.iter()), |row| {
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
            "SELECT zoom, x, y FROM tiles WHERE zoom IN ({}) ORDER BY zoom, x, y",
            placeholders(zooms.len())
        );
        let rows = self.db.with(|conn| {
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(params_from_iter(zooms.iter()), |row| {
                    Ok((row.get::<_, u8>(0)?, row.get::<_, u32>(1)?, row.get::<_, u32>(2)?))
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(rows)
        })?;

        rows.into_iter()
            .map(|(zoom, x, y)| TileCoord::new(zoom, x, y).map_err(StoreError::from))
            .collect()
    }

    fn close(&self) -> Result<(), StoreError> {
        self.db.close()
    }
}

impl Drop for NativeStore {
    fn drop(&mut self) {
        let _ = self.db.close();
    }
}
