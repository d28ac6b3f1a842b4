//! The event store: canonical definitions plus series-aware mutations.
//!
//! [`EventStore`] is the only sanctioned way to change event data. It owns
//! the definitions exclusively, expands them on query and hands the complete
//! list to its [`EventStorage`] after every mutation.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{EventError, Result};
use crate::event::{EventDefinition, EventFormData, EventId, EventInstance, InstanceOverride};
use crate::range::DateRange;
use crate::recurrence::{self, DEFAULT_OCCURRENCE_CAP};
use crate::storage::migrations::fold_legacy_rows;
use crate::storage::{Config, EventStorage};

/// Result of a reschedule. A move always succeeds; conflicts are advisory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RescheduleOutcome {
    pub moved: bool,
    /// Titles of other events starting on the new date at the same time.
    pub conflicting_titles: Vec<String>,
}

impl RescheduleOutcome {
    pub fn has_conflicts(&self) -> bool {
        !self.conflicting_titles.is_empty()
    }

    /// User-facing note about the move, if there is something to warn about.
    pub fn message(&self) -> Option<String> {
        self.has_conflicts().then(|| {
            format!(
                "Event moved but conflicts with: {}",
                self.conflicting_titles.join(", ")
            )
        })
    }
}

/// Event store and recurrence engine.
pub struct EventStore<S: EventStorage> {
    storage: S,
    events: Vec<EventDefinition>,
    occurrence_cap: u32,
}

impl<S: EventStorage> EventStore<S> {
    /// Load definitions from `storage` with the default occurrence cap.
    ///
    /// # Errors
    /// Returns an error if the storage can not be read.
    pub fn open(storage: S) -> Result<Self> {
        Self::open_with_cap(storage, DEFAULT_OCCURRENCE_CAP)
    }

    /// Load definitions from `storage` using the limits in `config`.
    pub fn with_config(storage: S, config: &Config) -> Result<Self> {
        Self::open_with_cap(storage, config.recurrence.default_occurrence_cap)
    }

    /// Load definitions from `storage`; series without an end condition stop
    /// after `occurrence_cap` occurrences.
    pub fn open_with_cap(storage: S, occurrence_cap: u32) -> Result<Self> {
        let loaded = storage.load()?;
        let loaded_count = loaded.len();
        let events = fold_legacy_rows(loaded);
        tracing::debug!(
            loaded = loaded_count,
            kept = events.len(),
            occurrence_cap,
            "event store opened"
        );
        Ok(Self {
            storage,
            events,
            occurrence_cap,
        })
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn into_storage(self) -> S {
        self.storage
    }

    pub fn occurrence_cap(&self) -> u32 {
        self.occurrence_cap
    }

    /// All canonical definitions, in insertion order.
    pub fn definitions(&self) -> &[EventDefinition] {
        &self.events
    }

    pub fn get(&self, id: &str) -> Option<&EventDefinition> {
        self.events.iter().find(|e| e.id == id)
    }

    /// Every instance inside `range`, across all definitions, in no particular
    /// order.
    ///
    /// # Errors
    /// Fails up front if any definition can not be expanded.
    pub fn list_in_range(
        &self,
        range: DateRange,
    ) -> Result<impl Iterator<Item = EventInstance> + '_> {
        let expansions = self
            .events
            .iter()
            .map(|definition| recurrence::expand(definition, range, self.occurrence_cap))
            .collect::<std::result::Result<Vec<_>, EventError>>()?;
        Ok(expansions.into_iter().flatten())
    }

    /// Instances occurring on `date`, sorted for display.
    pub fn events_on(&self, date: NaiveDate) -> Result<Vec<EventInstance>> {
        let mut instances: Vec<_> = self.list_in_range(DateRange::day(date))?.collect();
        sort_for_display(&mut instances);
        Ok(instances)
    }

    /// Create a definition from `form` and return its new id.
    ///
    /// # Errors
    /// Rejects recurrence patterns that can not be expanded.
    pub fn add(&mut self, form: EventFormData) -> Result<EventId> {
        self.check_recurrence(&form)?;
        let id = self.fresh_id();
        let definition = EventDefinition::from_form(id.clone(), form);
        tracing::info!(%id, title = %definition.title, recurring = definition.is_recurring(), "event added");
        self.events.push(definition);
        self.persist()?;
        Ok(id)
    }

    /// Edit a whole definition, or a single occurrence of a series.
    ///
    /// With `instance_date` on a recurring definition, `form` becomes the
    /// override for that date and the base record is left alone. Otherwise
    /// the definition's own fields are overwritten.
    ///
    /// # Errors
    /// `NotFound` if `id` does not exist.
    pub fn update(
        &mut self,
        id: &str,
        form: EventFormData,
        instance_date: Option<NaiveDate>,
    ) -> Result<()> {
        let index = self.index_of(id).ok_or_else(|| EventError::not_found(id))?;

        match instance_date {
            Some(date) if self.events[index].is_recurring() => {
                let modification = InstanceOverride::from(&form);
                self.events[index]
                    .recurrence_modifications
                    .insert(date, modification);
                tracing::info!(%id, %date, "occurrence updated");
            }
            _ => {
                self.check_recurrence(&form)?;
                self.events[index].apply_form(form);
                tracing::info!(%id, "event updated");
            }
        }

        self.persist()
    }

    /// Delete a whole definition, or suppress a single occurrence of a series.
    ///
    /// Removing an unknown id is a no-op, so repeated deletes are harmless.
    pub fn remove(&mut self, id: &str, instance_date: Option<NaiveDate>) -> Result<()> {
        let Some(index) = self.index_of(id) else {
            tracing::debug!(%id, "remove of unknown event ignored");
            return Ok(());
        };

        match instance_date {
            Some(date) if self.events[index].is_recurring() => {
                self.events[index].recurrence_exceptions.insert(date);
                tracing::info!(%id, %date, "occurrence removed");
            }
            _ => {
                self.events.remove(index);
                tracing::info!(%id, "event removed");
            }
        }

        self.persist()
    }

    /// Move a definition to `new_date`.
    ///
    /// Other definitions starting on `new_date` at the same start time are
    /// reported as conflicts; they never block the move.
    ///
    /// # Errors
    /// `NotFound` if `id` does not exist.
    pub fn reschedule(&mut self, id: &str, new_date: NaiveDate) -> Result<RescheduleOutcome> {
        let index = self.index_of(id).ok_or_else(|| EventError::not_found(id))?;
        let start_time = self.events[index].start_time;

        let conflicting_titles: Vec<String> = self
            .events
            .iter()
            .filter(|e| e.id != id && e.start_date == new_date && e.start_time == start_time)
            .map(|e| e.title.clone())
            .collect();

        let event = &mut self.events[index];
        event.start_date = new_date;
        event.end_date = new_date;

        if conflicting_titles.is_empty() {
            tracing::info!(%id, %new_date, "event rescheduled");
        } else {
            tracing::warn!(
                %id,
                %new_date,
                conflicts = %conflicting_titles.join(", "),
                "event rescheduled onto a conflicting slot"
            );
        }

        self.persist()?;
        Ok(RescheduleOutcome {
            moved: true,
            conflicting_titles,
        })
    }

    fn index_of(&self, id: &str) -> Option<usize> {
        self.events.iter().position(|e| e.id == id)
    }

    fn fresh_id(&self) -> EventId {
        loop {
            let id = Uuid::new_v4().to_string();
            if self.index_of(&id).is_none() {
                return id;
            }
        }
    }

    fn check_recurrence(&self, form: &EventFormData) -> Result<()> {
        if let Some(pattern) = form.effective_recurrence() {
            recurrence::validate(pattern, self.occurrence_cap)?;
        }
        Ok(())
    }

    fn persist(&mut self) -> Result<()> {
        self.storage.save(&self.events)
    }
}

/// Order instances the way the list view shows them: by date, then start
/// time with untimed events first, then title.
pub fn sort_for_display(instances: &mut [EventInstance]) {
    instances.sort_by(|a, b| {
        a.start_date
            .cmp(&b.start_date)
            .then_with(|| a.start_time.cmp(&b.start_time))
            .then_with(|| a.title.cmp(&b.title))
    });
}
