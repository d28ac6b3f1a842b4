//! In-process storage, for tests and for embedding without a database.

use super::EventStorage;
use crate::error::Result;
use crate::event::EventDefinition;

#[derive(Debug, Default, Clone)]
pub struct MemoryStorage {
    definitions: Vec<EventDefinition>,
    saves: usize,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage that starts out holding `definitions`.
    pub fn with_definitions(definitions: Vec<EventDefinition>) -> Self {
        Self {
            definitions,
            saves: 0,
        }
    }

    /// What the last save wrote.
    pub fn definitions(&self) -> &[EventDefinition] {
        &self.definitions
    }

    /// Number of saves so far.
    pub fn saves(&self) -> usize {
        self.saves
    }
}

impl EventStorage for MemoryStorage {
    fn load(&self) -> Result<Vec<EventDefinition>> {
        Ok(self.definitions.clone())
    }

    fn save(&mut self, definitions: &[EventDefinition]) -> Result<()> {
        self.definitions = definitions.to_vec();
        self.saves += 1;
        Ok(())
    }
}
