//! SQLite-based key-value storage for event definitions.
//!
//! The whole definition list is one JSON blob under a single key of the
//! `kv` table, mirroring the web client's local storage layout.

use std::path::Path;

use rusqlite::{params, Connection};

use super::migrations;
use super::{Config, EventStorage};
use crate::error::{DatabaseError, Result};
use crate::event::EventDefinition;

const DEFAULT_KEY: &str = "calendar-events";

/// SQLite database holding the definition blob.
pub struct Database {
    conn: Connection,
    key: String,
}

impl Database {
    /// Open the database configured by `config`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open(config: &Config) -> Result<Self> {
        let path = config.database_path()?;
        Self::open_at(&path, &config.storage.storage_key)
    }

    /// Open the database file at `path`, storing definitions under `key`.
    pub fn open_at(path: &Path, key: &str) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        Self::with_connection(conn, key)
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::with_connection(conn, DEFAULT_KEY)
    }

    fn with_connection(conn: Connection, key: &str) -> Result<Self> {
        migrations::migrate(&conn)
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;
        Ok(Self {
            conn,
            key: key.to_string(),
        })
    }

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> std::result::Result<Option<String>, rusqlite::Error> {
        let mut stmt = self.conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        let result = stmt.query_row(params![key], |row| row.get::<_, String>(0));
        match result {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> std::result::Result<(), rusqlite::Error> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }
}

impl EventStorage for Database {
    fn load(&self) -> Result<Vec<EventDefinition>> {
        match self.kv_get(&self.key)? {
            Some(blob) => Ok(serde_json::from_str(&blob)?),
            None => Ok(Vec::new()),
        }
    }

    fn save(&mut self, definitions: &[EventDefinition]) -> Result<()> {
        let blob = serde_json::to_string(definitions)?;
        self.kv_set(&self.key, &blob)?;
        tracing::debug!(key = %self.key, count = definitions.len(), "saved definitions");
        Ok(())
    }
}
