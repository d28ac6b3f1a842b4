//! Core error types for eventide-core.
//!
//! Every fallible operation returns one of these as a value; nothing here is
//! fatal to the process. The presentation layer decides how to surface them.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for eventide-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Event store and recurrence errors
    #[error(transparent)]
    Event(#[from] EventError),

    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors raised by the event store and the recurrence engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EventError {
    /// No definition with this id exists
    #[error("Event not found: {id}")]
    NotFound { id: String },

    /// The recurrence type has no advancement rule
    #[error("Unsupported recurrence type: {kind}")]
    UnsupportedRecurrence { kind: String },

    /// The recurrence pattern can not produce a bounded series
    #[error("Invalid recurrence configuration: {0}")]
    InvalidRecurrenceConfig(String),
}

impl EventError {
    pub fn not_found(id: impl Into<String>) -> Self {
        EventError::NotFound { id: id.into() }
    }
}

/// Database-specific errors.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to open database connection
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Migration failed
    #[error("Database migration failed: {0}")]
    MigrationFailed(String),

    /// Database is locked
    #[error("Database is locked")]
    Locked,
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown configuration key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// No usable data directory
    #[error("Cannot determine data directory: {0}")]
    DataDir(String),
}

/// Validation errors for user-supplied values.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Not a `YYYY-MM-DD` date
    #[error("Invalid date '{0}': expected YYYY-MM-DD")]
    InvalidDate(String),

    /// Not a `HH:MM` time
    #[error("Invalid time '{0}': expected HH:MM")]
    InvalidTime(String),

    /// Not a CSS hex color
    #[error("Invalid color '{0}': expected #rgb or #rrggbb")]
    InvalidColor(String),

    /// Range start after range end
    #[error("Invalid date range: start ({start}) is after end ({end})")]
    InvalidDateRange {
        start: chrono::NaiveDate,
        end: chrono::NaiveDate,
    },

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(err, _msg) => {
                if err.code == rusqlite::ErrorCode::DatabaseLocked {
                    DatabaseError::Locked
                } else {
                    DatabaseError::QueryFailed(err.to_string())
                }
            }
            _ => DatabaseError::QueryFailed(err.to_string()),
        }
    }
}

impl From<rusqlite::Error> for CoreError {
    fn from(err: rusqlite::Error) -> Self {
        CoreError::Database(err.into())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
