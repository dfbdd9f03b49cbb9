//! Durable storage of element sets and state vectors in SQLite
//!
//! A [`Storage`] wraps one connection. It is opened explicitly at process
//! start, handed to whatever needs it and closed at shutdown.

mod reader;
mod record;
mod writer;

use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, NaiveDateTime, Utc};
use rusqlite::Connection;

use crate::data::{Satellite, SpaceObject};
use crate::error::StorageResult;

pub use reader::*;
pub use record::*;
pub use writer::*;

/// How long a writer waits for another connection's write lock
const BUSY_TIMEOUT: Duration = Duration::from_secs(30);

const EPOCH_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.9fZ";

const VECTOR3D_TABLE: &str = "CREATE TABLE IF NOT EXISTS vector3d (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    x REAL NOT NULL,
    y REAL NOT NULL,
    z REAL NOT NULL
);";

// Vectors are owned by exactly one state; they go when it goes.
const SPACE_OBJECT_OWNS_VECTORS: &str =
    "CREATE TRIGGER IF NOT EXISTS space_object_drop_vectors
AFTER DELETE ON space_object
BEGIN
    DELETE FROM vector3d WHERE id IN (OLD.position_id, OLD.velocity_id);
END;";

/// Handle to the tracker database
pub struct Storage {
    conn: Connection,
}

impl Storage {
    /// Open (and create if needed) a database file
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let path = path.as_ref();
        log::info!("Opening storage at {:?}", path);
        Self::init(Connection::open(path)?)
    }

    /// Private in-memory database, mostly for tests
    pub fn open_in_memory() -> StorageResult<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> StorageResult<Self> {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.pragma_update(None, "foreign_keys", true)?;
        conn.execute_batch(&schema_sql())?;
        Ok(Self { conn })
    }

    /// Flush and close the connection
    pub fn close(self) -> StorageResult<()> {
        self.conn.close().map_err(|(_, err)| err.into())
    }

    pub(crate) fn connection(&self) -> &Connection {
        &self.conn
    }

    pub(crate) fn connection_mut(&mut self) -> &mut Connection {
        &mut self.conn
    }

    /// Number of persisted rows of a record type
    pub fn count<T: Record>(&self) -> StorageResult<u64> {
        let sql = format!("SELECT COUNT(*) FROM {}", T::TABLE);
        let count: i64 = self.conn.query_row(&sql, [], |row| row.get(0))?;
        Ok(count as u64)
    }

    /// Number of persisted vector rows
    pub fn vector_count(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM vector3d", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}

/// Full schema, tables generated from the record descriptors
pub fn schema_sql() -> String {
    [
        VECTOR3D_TABLE.to_string(),
        create_table_sql::<Satellite>(),
        create_table_sql::<SpaceObject>(),
        SPACE_OBJECT_OWNS_VECTORS.to_string(),
    ]
    .join("\n")
}

/// Fixed-width UTC text, so equal instants are equal strings
pub fn format_epoch(epoch: &DateTime<Utc>) -> String {
    epoch.format(EPOCH_FORMAT).to_string()
}

pub fn parse_stored_epoch(text: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.fZ")
        .ok()
        .map(|naive| naive.and_utc())
}
