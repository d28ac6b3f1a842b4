mod config;
pub mod database;
pub mod memory;
pub mod migrations;

pub use config::{Config, DefaultsConfig, RecurrenceConfig, StorageConfig};
pub use database::Database;
pub use memory::MemoryStorage;

use std::path::PathBuf;

use crate::error::{ConfigError, Result};
use crate::event::EventDefinition;

/// Persistence collaborator of the event store.
///
/// The store calls `load` once when it opens and `save` with the complete
/// definition list after every mutation.
pub trait EventStorage {
    /// All stored definitions, or an empty list if nothing was stored yet.
    fn load(&self) -> Result<Vec<EventDefinition>>;

    /// Replace the stored definitions.
    fn save(&mut self, definitions: &[EventDefinition]) -> Result<()>;
}

/// Returns the data directory.
///
/// `EVENTIDE_DATA_DIR` wins when set. Otherwise `~/.config/eventide[-dev]/`,
/// with the `-dev` suffix when `EVENTIDE_ENV=dev`.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf> {
    let dir = match std::env::var_os("EVENTIDE_DATA_DIR") {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");

            let env = std::env::var("EVENTIDE_ENV").unwrap_or_else(|_| "production".to_string());

            if env == "dev" {
                base_dir.join("eventide-dev")
            } else {
                base_dir.join("eventide")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
