//! # Eventide Core Library
//!
//! This library provides the event store and recurrence engine behind the
//! Eventide personal calendar. Presentation layers (the `eventide` CLI, or a
//! GUI) never touch event data directly; they call the store's operations and
//! render the instances it returns.
//!
//! ## Architecture
//!
//! - **Event model**: a single persisted [`EventDefinition`] per event or
//!   recurring series, with sparse per-date exceptions and overrides
//! - **Recurrence**: lazy, bounded expansion of definitions into
//!   [`EventInstance`] values over a [`DateRange`]
//! - **Store**: [`EventStore`] applies add/update/remove/reschedule with
//!   series-vs-occurrence semantics and saves after every mutation
//! - **Storage**: the [`EventStorage`] collaborator, backed by SQLite
//!   ([`Database`]) or memory ([`MemoryStorage`]), plus TOML [`Config`]
//!
//! ## Key Components
//!
//! - [`EventStore`]: canonical state and mutations
//! - [`recurrence::expand`]: per-definition occurrence sequence
//! - [`Database`]: key-value blob persistence

pub mod error;
pub mod event;
pub mod range;
pub mod recurrence;
pub mod storage;
pub mod store;

pub use error::{ConfigError, CoreError, DatabaseError, EventError, Result, ValidationError};
pub use event::{
    Color, EventDefinition, EventFormData, EventId, EventInstance, InstanceOverride,
    RecurrencePattern, RecurrenceType,
};
pub use range::DateRange;
pub use recurrence::{Occurrences, DEFAULT_OCCURRENCE_CAP};
pub use storage::{Config, Database, EventStorage, MemoryStorage};
pub use store::{sort_for_display, EventStore, RescheduleOutcome};
