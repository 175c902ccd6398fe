//! Shared SQLite connection handling for the database-backed variants.

use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use rusqlite::{Connection, OpenFlags};

use super::StoreError;

/// A lazily closable SQLite connection.
pub(super) struct SqliteConnection {
    path: PathBuf,
    conn: Mutex<Option<Connection>>,
}

impl SqliteConnection {
    /// Opens (creating if needed) the database and applies `schema`.
    pub(super) fn open(path: &Path, schema: &str) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        conn.execute_batch(schema)?;
        Ok(Self {
            path: path.to_path_buf(),
            conn: Mutex::new(Some(conn)),
        })
    }

    /// Runs `f` with the open connection.
    pub(super) fn with<T>(
        &self,
        f: impl FnOnce(&Connection) -> rusqlite::Result<T>,
    ) -> Result<T, StoreError> {
        let guard = self.conn.lock();
        let conn = guard
            .as_ref()
            .ok_or_else(|| StoreError::Closed(self.path.clone()))?;
        Ok(f(conn)?)
    }

    /// Closes the connection; later calls are no-ops.
    pub(super) fn close(&self) -> Result<(), StoreError> {
        if let Some(conn) = self.conn.lock().take() {
            conn.close().map_err(|(_, e)| StoreError::Database(e))?;
        }
        Ok(())
    }

    pub(super) fn is_open(&self) -> bool {
        self.conn.lock().is_some()
    }
}

/// `?, ?, ...` with one placeholder per value.
pub(super) fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}
