//! Keyed snapshot storage backends.
//!
//! # Responsibility
//! - Abstract where serialized reading-state snapshots live.
//! - Provide an in-memory backend for tests/mocks and a SQLite backend for
//!   the real client.
//!
//! # Invariants
//! - `save` replaces the whole payload stored under a key.
//! - Backends never interpret the payload; decoding belongs to `snapshot`.

use crate::db::{open_db, DbError};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;

pub type StorageResult<T> = Result<T, StorageError>;

#[derive(Debug)]
pub enum StorageError {
    Db(DbError),
}

impl Display for StorageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "snapshot storage: {err}"),
        }
    }
}

impl Error for StorageError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
        }
    }
}

impl From<DbError> for StorageError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StorageError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Keyed blob storage for persisted snapshots.
pub trait SnapshotStorage {
    /// Returns the raw payload stored under `key`, if any.
    fn load(&self, key: &str) -> StorageResult<Option<String>>;
    /// Stores `payload` under `key`, tagging it with `version`.
    fn save(&mut self, key: &str, version: u32, payload: &str) -> StorageResult<()>;
    /// Deletes the payload stored under `key`. Missing keys are not an error.
    fn remove(&mut self, key: &str) -> StorageResult<()>;
}

/// Process-local storage, used by tests and UI mocks.
#[derive(Debug, Default, Clone)]
pub struct MemorySnapshotStorage {
    entries: HashMap<String, String>,
}

impl MemorySnapshotStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a raw payload, bypassing encoding. Handy for hydration tests.
    pub fn with_entry(mut self, key: impl Into<String>, payload: impl Into<String>) -> Self {
        self.entries.insert(key.into(), payload.into());
        self
    }

    pub fn raw(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }
}

impl SnapshotStorage for MemorySnapshotStorage {
    fn load(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn save(&mut self, key: &str, _version: u32, payload: &str) -> StorageResult<()> {
        self.entries.insert(key.to_string(), payload.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> StorageResult<()> {
        self.entries.remove(key);
        Ok(())
    }
}

/// SQLite-backed storage over the `snapshots` table.
pub struct SqliteSnapshotStorage {
    conn: Connection,
}

impl SqliteSnapshotStorage {
    /// Wraps a migrated connection (see [`crate::db::open_db`]).
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    /// Opens (and migrates) the database at `path`.
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        Ok(Self::new(open_db(path)?))
    }

    /// Version tag stored alongside the payload for `key`.
    pub fn stored_version(&self, key: &str) -> StorageResult<Option<u32>> {
        Ok(self
            .conn
            .query_row(
                "SELECT version FROM snapshots WHERE key = ?1;",
                [key],
                |row| row.get::<_, u32>(0),
            )
            .optional()?)
    }
}

impl SnapshotStorage for SqliteSnapshotStorage {
    fn load(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self
            .conn
            .query_row(
                "SELECT payload FROM snapshots WHERE key = ?1;",
                [key],
                |row| row.get::<_, String>(0),
            )
            .optional()?)
    }

    fn save(&mut self, key: &str, version: u32, payload: &str) -> StorageResult<()> {
        self.conn.execute(
            "INSERT INTO snapshots (key, version, payload)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET
                version = excluded.version,
                payload = excluded.payload,
                updated_at = (strftime('%s', 'now') * 1000);",
            params![key, version, payload],
        )?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> StorageResult<()> {
        self.conn
            .execute("DELETE FROM snapshots WHERE key = ?1;", [key])?;
        Ok(())
    }
}
