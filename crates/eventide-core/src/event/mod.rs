//! Event definitions, instances and the form data that creates them.
//!
//! A [`EventDefinition`] is the only persisted record. Recurring definitions
//! hold sparse per-date exceptions and overrides; concrete occurrences are
//! projected into [`EventInstance`] values by [`crate::recurrence`] on demand.
//!
//! Field names serialize in camelCase so stored blobs stay compatible with
//! the web client's `calendar-events` format.

mod clearable;
mod color;
pub mod time_format;

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Display;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::storage::DefaultsConfig;

pub use color::Color;
pub use time_format::{format_time, parse_date, parse_time};

/// Opaque, immutable identifier of an event definition.
pub type EventId = String;

const TYPE_DAILY: &str = "daily";
const TYPE_WEEKLY: &str = "weekly";
const TYPE_MONTHLY: &str = "monthly";
const TYPE_CUSTOM: &str = "custom";

/// Interval unit of a recurring series.
///
/// `Custom` is reserved by the data model and has no advancement rule.
/// Unrecognized tags are preserved verbatim in `Other` so a save never
/// rewrites data the engine does not understand.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RecurrenceType {
    Daily,
    Weekly,
    Monthly,
    Custom,
    Other(String),
}

impl AsRef<str> for RecurrenceType {
    fn as_ref(&self) -> &str {
        match self {
            RecurrenceType::Daily => TYPE_DAILY,
            RecurrenceType::Weekly => TYPE_WEEKLY,
            RecurrenceType::Monthly => TYPE_MONTHLY,
            RecurrenceType::Custom => TYPE_CUSTOM,
            RecurrenceType::Other(tag) => tag,
        }
    }
}

impl Display for RecurrenceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<String> for RecurrenceType {
    fn from(value: String) -> Self {
        match value.as_str() {
            TYPE_DAILY => RecurrenceType::Daily,
            TYPE_WEEKLY => RecurrenceType::Weekly,
            TYPE_MONTHLY => RecurrenceType::Monthly,
            TYPE_CUSTOM => RecurrenceType::Custom,
            _ => RecurrenceType::Other(value),
        }
    }
}

impl From<RecurrenceType> for String {
    fn from(value: RecurrenceType) -> Self {
        match value {
            RecurrenceType::Other(tag) => tag,
            known => known.as_ref().to_string(),
        }
    }
}

/// How a recurring series repeats and when it ends.
///
/// At most one end condition is expected; when both are present the series
/// stops at whichever is reached first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecurrencePattern {
    #[serde(rename = "type")]
    pub kind: RecurrenceType,
    pub frequency: u32,
    /// Carried for the web client; expansion does not consult it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub days_of_week: Option<Vec<u8>>,
    /// Inclusive last date of the series.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_after_occurrences: Option<u32>,
}

impl RecurrencePattern {
    pub fn new(kind: RecurrenceType, frequency: u32) -> Self {
        Self {
            kind,
            frequency,
            days_of_week: None,
            end_date: None,
            end_after_occurrences: None,
        }
    }

    pub fn daily(frequency: u32) -> Self {
        Self::new(RecurrenceType::Daily, frequency)
    }

    pub fn weekly(frequency: u32) -> Self {
        Self::new(RecurrenceType::Weekly, frequency)
    }

    pub fn monthly(frequency: u32) -> Self {
        Self::new(RecurrenceType::Monthly, frequency)
    }

    /// End the series on `date` (inclusive).
    pub fn until(mut self, date: NaiveDate) -> Self {
        self.end_date = Some(date);
        self
    }

    /// End the series after `count` occurrences.
    pub fn count(mut self, count: u32) -> Self {
        self.end_after_occurrences = Some(count);
        self
    }

    pub fn has_end_condition(&self) -> bool {
        self.end_date.is_some() || self.end_after_occurrences.is_some()
    }
}

/// Per-date field overrides for one occurrence of a series.
///
/// Identity, dates and recurrence are series properties and can not be
/// overridden here. The optional display fields are doubly optional: `None`
/// keeps the series value, `Some(None)` clears it on this date.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, with = "clearable::text", skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,
    #[serde(default, with = "clearable::time", skip_serializing_if = "Option::is_none")]
    pub start_time: Option<Option<NaiveTime>>,
    #[serde(default, with = "clearable::time", skip_serializing_if = "Option::is_none")]
    pub end_time: Option<Option<NaiveTime>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Color>,
    #[serde(default, with = "clearable::text", skip_serializing_if = "Option::is_none")]
    pub category: Option<Option<String>>,
}

impl InstanceOverride {
    /// Shallow-merge the overridden fields onto an instance.
    pub(crate) fn apply_to<'a>(&self, instance: &'a mut EventInstance) -> &'a mut EventInstance {
        if let Some(title) = &self.title {
            instance.title = title.clone();
        }
        if let Some(description) = &self.description {
            instance.description = description.clone();
        }
        if let Some(start_time) = self.start_time {
            instance.start_time = start_time;
        }
        if let Some(end_time) = self.end_time {
            instance.end_time = end_time;
        }
        if let Some(color) = &self.color {
            instance.color = color.clone();
        }
        if let Some(category) = &self.category {
            instance.category = category.clone();
        }
        instance
    }
}

/// A single-occurrence edit: every display field of the form applies to
/// that date, including ones the form leaves empty.
impl From<&EventFormData> for InstanceOverride {
    fn from(form: &EventFormData) -> Self {
        Self {
            title: Some(form.title.clone()),
            description: Some(non_empty(form.description.clone())),
            start_time: Some(form.start_time),
            end_time: Some(form.end_time),
            color: Some(form.color.clone()),
            category: Some(non_empty(form.category.clone())),
        }
    }
}

/// Data submitted by the presentation layer to create or edit an event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventFormData {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(
        default,
        with = "time_format::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub start_time: Option<NaiveTime>,
    #[serde(
        default,
        with = "time_format::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub end_time: Option<NaiveTime>,
    #[serde(default)]
    pub color: Color,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default)]
    pub is_recurring: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurrence: Option<RecurrencePattern>,
}

impl EventFormData {
    /// A one-day form for `date` with the built-in defaults.
    pub fn new(title: impl Into<String>, date: NaiveDate) -> Self {
        Self::with_defaults(title, date, &DefaultsConfig::default())
    }

    /// A one-day form for `date` with color and times from `defaults`.
    pub fn with_defaults(
        title: impl Into<String>,
        date: NaiveDate,
        defaults: &DefaultsConfig,
    ) -> Self {
        Self {
            title: title.into(),
            description: None,
            start_date: date,
            end_date: date,
            start_time: Some(defaults.start_time),
            end_time: Some(defaults.end_time),
            color: defaults.color.clone(),
            category: None,
            is_recurring: false,
            recurrence: None,
        }
    }

    /// Mark the form as recurring with `pattern`.
    pub fn recurring(mut self, pattern: RecurrencePattern) -> Self {
        self.is_recurring = true;
        self.recurrence = Some(pattern);
        self
    }

    /// Same form without clock times.
    pub fn all_day(mut self) -> Self {
        self.start_time = None;
        self.end_time = None;
        self
    }

    /// The pattern that applies, if the form describes a recurring event.
    pub fn effective_recurrence(&self) -> Option<&RecurrencePattern> {
        if self.is_recurring {
            self.recurrence.as_ref()
        } else {
            None
        }
    }
}

/// The canonical, persisted record of one event or recurring series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDefinition {
    pub id: EventId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(
        default,
        with = "time_format::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub start_time: Option<NaiveTime>,
    #[serde(
        default,
        with = "time_format::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub end_time: Option<NaiveTime>,
    #[serde(default)]
    pub color: Color,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default)]
    pub is_recurring: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurrence: Option<RecurrencePattern>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub recurrence_exceptions: BTreeSet<NaiveDate>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub recurrence_modifications: BTreeMap<NaiveDate, InstanceOverride>,
    /// Only set on rows written by the old eager expansion.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_event_id: Option<EventId>,
}

impl EventDefinition {
    /// Build a new definition from form data.
    pub fn from_form(id: impl Into<EventId>, form: EventFormData) -> Self {
        let mut definition = Self {
            id: id.into(),
            title: String::new(),
            description: None,
            start_date: form.start_date,
            end_date: form.end_date,
            start_time: None,
            end_time: None,
            color: Color::default(),
            category: None,
            is_recurring: false,
            recurrence: None,
            recurrence_exceptions: BTreeSet::new(),
            recurrence_modifications: BTreeMap::new(),
            parent_event_id: None,
        };
        definition.apply_form(form);
        definition
    }

    /// Overwrite the definition's own fields with `form`.
    ///
    /// The id, exceptions and modifications survive.
    pub fn apply_form(&mut self, form: EventFormData) {
        self.title = form.title;
        self.description = form.description;
        self.start_date = form.start_date;
        self.end_date = form.end_date;
        self.start_time = form.start_time;
        self.end_time = form.end_time;
        self.color = form.color;
        self.category = form.category;
        self.is_recurring = form.is_recurring;
        self.recurrence = form.recurrence;
        self.normalize();
    }

    /// Restore the record invariants: `is_recurring` iff a pattern is present,
    /// a pattern only when recurring, no empty optional text, and an end date
    /// no earlier than the start date.
    pub fn normalize(&mut self) {
        if !self.is_recurring {
            self.recurrence = None;
        }
        self.is_recurring = self.recurrence.is_some();
        self.description = non_empty(self.description.take());
        self.category = non_empty(self.category.take());
        if self.end_date < self.start_date {
            self.end_date = self.start_date;
        }
    }

    pub fn is_recurring(&self) -> bool {
        self.is_recurring && self.recurrence.is_some()
    }

    /// The current field values as form data, as an edit form would show them.
    pub fn to_form(&self) -> EventFormData {
        EventFormData {
            title: self.title.clone(),
            description: self.description.clone(),
            start_date: self.start_date,
            end_date: self.end_date,
            start_time: self.start_time,
            end_time: self.end_time,
            color: self.color.clone(),
            category: self.category.clone(),
            is_recurring: self.is_recurring,
            recurrence: self.recurrence.clone(),
        }
    }
}

/// One concrete occurrence of a definition. Derived, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventInstance {
    /// `{definitionId}::{occurrence}` for recurring events, otherwise the
    /// definition id.
    pub id: String,
    pub definition_id: EventId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_event_id: Option<EventId>,
    /// 1-based position in the series.
    pub occurrence: u32,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(
        default,
        with = "time_format::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub start_time: Option<NaiveTime>,
    #[serde(
        default,
        with = "time_format::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub end_time: Option<NaiveTime>,
    pub color: Color,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub is_recurring: bool,
}

impl EventInstance {
    /// Project a definition onto its own dates.
    pub(crate) fn from_definition(definition: &EventDefinition) -> Self {
        Self {
            id: definition.id.clone(),
            definition_id: definition.id.clone(),
            parent_event_id: None,
            occurrence: 1,
            title: definition.title.clone(),
            description: definition.description.clone(),
            start_date: definition.start_date,
            end_date: definition.end_date,
            start_time: definition.start_time,
            end_time: definition.end_time,
            color: definition.color.clone(),
            category: definition.category.clone(),
            is_recurring: definition.is_recurring(),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}
