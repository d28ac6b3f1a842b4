//! Schema and data migrations.
//!
//! Schema migrations are versioned and applied automatically when opening the
//! database. The `schema_version` table tracks the current migration version.
//!
//! [`fold_legacy_rows`] migrates definition data regardless of the storage
//! backend: it removes per-occurrence rows written by the old eager
//! expansion, which lazy expansion now regenerates from the base definition.

use std::collections::HashSet;

use rusqlite::{Connection, Result as SqliteResult};

use crate::event::EventDefinition;

/// Current schema version.
///
/// Increment this when adding new migrations.
pub const SCHEMA_VERSION: i32 = 1;

/// Apply all pending migrations to bring the database to the current schema version.
///
/// # Errors
/// Returns an error if migration fails.
pub fn migrate(conn: &Connection) -> SqliteResult<()> {
    create_schema_version_table(conn)?;

    let current_version = get_schema_version(conn)?;

    if current_version < 1 {
        migrate_v1(conn)?;
    }

    Ok(())
}

/// Create the schema_version table if it doesn't exist.
fn create_schema_version_table(conn: &Connection) -> SqliteResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        );",
    )
}

/// Get the current schema version from the database.
///
/// Returns 0 if no version is set (initial database).
pub fn get_schema_version(conn: &Connection) -> SqliteResult<i32> {
    match conn.query_row("SELECT version FROM schema_version", [], |row| {
        row.get::<_, i32>(0)
    }) {
        Ok(version) => Ok(version),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(0),
        Err(e) => Err(e),
    }
}

/// Set the schema version in the database.
fn set_schema_version(conn: &Connection, version: i32) -> SqliteResult<()> {
    conn.execute("DELETE FROM schema_version", [])?;
    conn.execute(
        "INSERT INTO schema_version (version) VALUES (?1)",
        [version],
    )?;
    Ok(())
}

/// Migration v1: the key-value table holding the definition blob.
fn migrate_v1(conn: &Connection) -> SqliteResult<()> {
    let tx = conn.unchecked_transaction()?;
    tx.execute_batch(
        "CREATE TABLE IF NOT EXISTS kv (
            key   TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );",
    )?;
    set_schema_version(&tx, 1)?;
    tx.commit()?;
    tracing::info!("database migrated to schema v1");
    Ok(())
}

/// Fold rows materialized by the old eager expansion back into their series
/// and restore the record invariants on every row.
///
/// A row with a `parentEventId` is dropped when its parent is present and
/// recurring, and becomes a standalone one-off event otherwise. Duplicate ids
/// keep their first row.
pub fn fold_legacy_rows(rows: Vec<EventDefinition>) -> Vec<EventDefinition> {
    let recurring_parents: HashSet<String> = rows
        .iter()
        .filter(|row| row.parent_event_id.is_none() && row.is_recurring())
        .map(|row| row.id.clone())
        .collect();

    let mut seen = HashSet::new();
    let mut folded = Vec::with_capacity(rows.len());
    for mut row in rows {
        if let Some(parent) = row.parent_event_id.take() {
            if recurring_parents.contains(&parent) {
                tracing::info!(id = %row.id, %parent, "dropping materialized occurrence");
                continue;
            }
            tracing::info!(id = %row.id, %parent, "detaching orphaned occurrence");
            row.is_recurring = false;
        }
        if !seen.insert(row.id.clone()) {
            tracing::warn!(id = %row.id, "dropping row with duplicate id");
            continue;
        }
        row.normalize();
        folded.push(row);
    }
    folded
}
