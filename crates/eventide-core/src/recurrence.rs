//! Recurrence expansion.
//!
//! Turns one [`EventDefinition`] into the occurrences that fall inside a
//! [`DateRange`]. Expansion is lazy and always finite: a series stops at the
//! range end, its own end date, its occurrence count, or the default cap when
//! it has no end condition at all.

use chrono::{Datelike, Days, Months, NaiveDate};

use crate::error::EventError;
use crate::event::{EventDefinition, EventInstance, RecurrencePattern, RecurrenceType};
use crate::range::DateRange;

/// Occurrence cap for series with neither an end date nor a count.
pub const DEFAULT_OCCURRENCE_CAP: u32 = 50;

/// Check that a pattern has an advancement rule and a bounded length.
///
/// `cap` is the limit applied when the pattern has no end condition.
pub fn validate(pattern: &RecurrencePattern, cap: u32) -> Result<(), EventError> {
    match &pattern.kind {
        RecurrenceType::Daily | RecurrenceType::Weekly | RecurrenceType::Monthly => {}
        other => {
            return Err(EventError::UnsupportedRecurrence {
                kind: other.to_string(),
            })
        }
    }
    if pattern.frequency < 1 {
        return Err(EventError::InvalidRecurrenceConfig(
            "frequency must be at least 1".to_string(),
        ));
    }
    if pattern.end_after_occurrences == Some(0) {
        return Err(EventError::InvalidRecurrenceConfig(
            "endAfterOccurrences must be at least 1".to_string(),
        ));
    }
    if !pattern.has_end_condition() && cap == 0 {
        return Err(EventError::InvalidRecurrenceConfig(
            "series has no end condition and the occurrence cap is 0".to_string(),
        ));
    }
    Ok(())
}

/// Expand `definition` over `range`.
///
/// # Errors
/// `UnsupportedRecurrence` for `custom` or unrecognized types and
/// `InvalidRecurrenceConfig` for unbounded or zero-interval patterns.
pub fn expand(
    definition: &EventDefinition,
    range: DateRange,
    cap: u32,
) -> Result<Occurrences<'_>, EventError> {
    let pattern = match (&definition.recurrence, definition.is_recurring) {
        (Some(pattern), true) => pattern,
        _ => {
            return Ok(Occurrences {
                definition,
                range,
                plan: Plan::Single,
                cursor: Cursor::Fresh,
            })
        }
    };

    validate(pattern, cap)?;
    let step = match pattern.kind {
        RecurrenceType::Daily => Step::Days(pattern.frequency),
        RecurrenceType::Weekly => Step::Weeks(pattern.frequency),
        RecurrenceType::Monthly => Step::Months(pattern.frequency),
        RecurrenceType::Custom | RecurrenceType::Other(_) => {
            return Err(EventError::UnsupportedRecurrence {
                kind: pattern.kind.to_string(),
            })
        }
    };
    let limit = match (pattern.end_after_occurrences, pattern.end_date) {
        (Some(count), _) => Some(count),
        (None, Some(_)) => None,
        (None, None) => Some(cap),
    };

    tracing::debug!(
        id = %definition.id,
        kind = %pattern.kind,
        frequency = pattern.frequency,
        ?limit,
        until = ?pattern.end_date,
        "expanding series"
    );

    Ok(Occurrences {
        definition,
        range,
        plan: Plan::Series {
            anchor: definition.start_date,
            step,
            limit,
            until: pattern.end_date,
        },
        cursor: Cursor::Fresh,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Days(u32),
    Weeks(u32),
    Months(u32),
}

impl Step {
    /// Date of the 1-based occurrence `n`, computed from the anchor so that
    /// month-end clamping never drifts into later occurrences.
    fn nth(self, anchor: NaiveDate, n: u32) -> Option<NaiveDate> {
        let intervals = u64::from(n.checked_sub(1)?);
        match self {
            Step::Days(f) => anchor.checked_add_days(Days::new(intervals.checked_mul(u64::from(f))?)),
            Step::Weeks(f) => anchor.checked_add_days(Days::new(
                intervals.checked_mul(u64::from(f))?.checked_mul(7)?,
            )),
            Step::Months(f) => {
                let months = u32::try_from(intervals.checked_mul(u64::from(f))?).ok()?;
                anchor.checked_add_months(Months::new(months))
            }
        }
    }

    /// An occurrence index at or before the first occurrence on or after `from`.
    ///
    /// Lets a query far from the anchor start near the range instead of
    /// walking every earlier occurrence. Occurrence numbering is unaffected.
    fn first_candidate(self, anchor: NaiveDate, from: NaiveDate) -> u32 {
        if from <= anchor {
            return 1;
        }
        let units = match self {
            Step::Days(f) => (from - anchor).num_days() / i64::from(f),
            Step::Weeks(f) => (from - anchor).num_days() / (7 * i64::from(f)),
            Step::Months(f) => {
                let months = i64::from(from.year() - anchor.year()) * 12
                    + i64::from(from.month())
                    - i64::from(anchor.month());
                months / i64::from(f)
            }
        };
        u32::try_from(units.saturating_add(1)).unwrap_or(u32::MAX)
    }
}

#[derive(Debug, Clone)]
enum Plan {
    Single,
    Series {
        anchor: NaiveDate,
        step: Step,
        limit: Option<u32>,
        until: Option<NaiveDate>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cursor {
    Fresh,
    At(u32),
    Done,
}

/// Lazy sequence of the instances of one definition inside a range.
///
/// Cloning yields an independent cursor; [`Occurrences::restart`] rewinds.
#[derive(Debug, Clone)]
pub struct Occurrences<'a> {
    definition: &'a EventDefinition,
    range: DateRange,
    plan: Plan,
    cursor: Cursor,
}

impl Occurrences<'_> {
    /// Rewind to the beginning of the sequence.
    pub fn restart(&mut self) {
        self.cursor = Cursor::Fresh;
    }

    fn occurrence(&self, n: u32, date: NaiveDate) -> EventInstance {
        let definition = self.definition;
        let mut instance = EventInstance::from_definition(definition);
        instance.id = format!("{}::{}", definition.id, n);
        instance.parent_event_id = Some(definition.id.clone());
        instance.occurrence = n;
        instance.start_date = date;
        instance.end_date = date;
        if let Some(modification) = definition.recurrence_modifications.get(&date) {
            modification.apply_to(&mut instance);
        }
        instance
    }
}

impl Iterator for Occurrences<'_> {
    type Item = EventInstance;

    fn next(&mut self) -> Option<EventInstance> {
        let (anchor, step, limit, until) = match self.plan {
            Plan::Single => {
                if self.cursor != Cursor::Fresh {
                    return None;
                }
                self.cursor = Cursor::Done;
                let definition = self.definition;
                return self
                    .range
                    .intersects(definition.start_date, definition.end_date)
                    .then(|| EventInstance::from_definition(definition));
            }
            Plan::Series {
                anchor,
                step,
                limit,
                until,
            } => (anchor, step, limit, until),
        };

        let mut n = match self.cursor {
            Cursor::Fresh => step.first_candidate(anchor, self.range.start()),
            Cursor::At(n) => n,
            Cursor::Done => return None,
        };

        loop {
            let date = match step.nth(anchor, n) {
                Some(date)
                    if limit.map_or(true, |limit| n <= limit)
                        && date <= self.range.end()
                        && until.map_or(true, |until| date <= until) =>
                {
                    date
                }
                _ => {
                    self.cursor = Cursor::Done;
                    return None;
                }
            };

            n = match n.checked_add(1) {
                Some(next) => next,
                None => {
                    self.cursor = Cursor::Done;
                    return None;
                }
            };
            self.cursor = Cursor::At(n);

            if date < self.range.start() || self.definition.recurrence_exceptions.contains(&date) {
                continue;
            }
            return Some(self.occurrence(n - 1, date));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{EventFormData, InstanceOverride};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn range(start: NaiveDate, end: NaiveDate) -> DateRange {
        DateRange::new(start, end).unwrap()
    }

    fn series(start: NaiveDate, pattern: RecurrencePattern) -> EventDefinition {
        EventDefinition::from_form("s1", EventFormData::new("Series", start).recurring(pattern))
    }

    fn dates(occurrences: Occurrences<'_>) -> Vec<NaiveDate> {
        occurrences.map(|i| i.start_date).collect()
    }

    #[test]
    fn weekly_three_occurrences() {
        let def = series(date(2024, 1, 1), RecurrencePattern::weekly(1).count(3));
        let got = dates(expand(&def, range(date(2024, 1, 1), date(2024, 1, 31)), 50).unwrap());
        assert_eq!(got, vec![date(2024, 1, 1), date(2024, 1, 8), date(2024, 1, 15)]);
    }

    #[test]
    fn non_recurring_event_only_when_intersecting() {
        let mut form = EventFormData::new("Trip", date(2024, 3, 10));
        form.end_date = date(2024, 3, 12);
        let def = EventDefinition::from_form("t", form);

        let inside: Vec<_> = expand(&def, range(date(2024, 3, 12), date(2024, 3, 20)), 50)
            .unwrap()
            .collect();
        assert_eq!(inside.len(), 1);
        assert_eq!(inside[0].id, "t");
        assert_eq!(inside[0].parent_event_id, None);
        assert_eq!(inside[0].end_date, date(2024, 3, 12));

        let outside = expand(&def, range(date(2024, 3, 13), date(2024, 3, 20)), 50).unwrap();
        assert_eq!(outside.count(), 0);
    }

    #[test]
    fn default_cap_bounds_open_series() {
        let def = series(date(2024, 1, 1), RecurrencePattern::daily(1));
        let all = dates(expand(&def, range(date(2024, 1, 1), date(2030, 1, 1)), 50).unwrap());
        assert_eq!(all.len(), 50);
        assert_eq!(all[49], date(2024, 2, 19));
    }

    #[test]
    fn end_date_is_inclusive_and_lifts_the_cap() {
        let def = series(
            date(2024, 1, 1),
            RecurrencePattern::daily(1).until(date(2024, 3, 31)),
        );
        let all = dates(expand(&def, range(date(2024, 1, 1), date(2025, 1, 1)), 50).unwrap());
        assert_eq!(all.len(), 91);
        assert_eq!(all.last(), Some(&date(2024, 3, 31)));
    }

    #[test]
    fn exceptions_are_suppressed_but_keep_numbering() {
        let mut def = series(date(2024, 1, 1), RecurrencePattern::weekly(1).count(4));
        def.recurrence_exceptions.insert(date(2024, 1, 8));
        let got: Vec<_> = expand(&def, range(date(2024, 1, 1), date(2024, 12, 31)), 50)
            .unwrap()
            .collect();
        let ids: Vec<_> = got.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["s1::1", "s1::3", "s1::4"]);
    }

    #[test]
    fn exception_wins_over_modification() {
        let mut def = series(date(2024, 1, 1), RecurrencePattern::daily(1).count(3));
        def.recurrence_exceptions.insert(date(2024, 1, 2));
        def.recurrence_modifications.insert(
            date(2024, 1, 2),
            InstanceOverride {
                title: Some("Moved".into()),
                ..Default::default()
            },
        );
        let got = dates(expand(&def, range(date(2024, 1, 1), date(2024, 1, 31)), 50).unwrap());
        assert_eq!(got, vec![date(2024, 1, 1), date(2024, 1, 3)]);
    }

    #[test]
    fn modification_overrides_fields_but_not_identity() {
        let mut def = series(date(2024, 1, 1), RecurrencePattern::daily(1).count(3));
        def.recurrence_modifications.insert(
            date(2024, 1, 2),
            InstanceOverride {
                title: Some("Late standup".into()),
                start_time: Some(chrono::NaiveTime::from_hms_opt(11, 0, 0)),
                ..Default::default()
            },
        );
        let got: Vec<_> = expand(&def, range(date(2024, 1, 1), date(2024, 1, 31)), 50)
            .unwrap()
            .collect();
        assert_eq!(got[0].title, "Series");
        assert_eq!(got[1].title, "Late standup");
        assert_eq!(got[1].id, "s1::2");
        assert_eq!(got[1].parent_event_id.as_deref(), Some("s1"));
        assert_eq!(got[1].start_time, chrono::NaiveTime::from_hms_opt(11, 0, 0));
        assert_eq!(got[2].title, "Series");
    }

    #[test]
    fn monthly_clamps_without_drift() {
        let def = series(date(2024, 1, 31), RecurrencePattern::monthly(1).count(4));
        let got = dates(expand(&def, range(date(2024, 1, 1), date(2024, 12, 31)), 50).unwrap());
        assert_eq!(
            got,
            vec![date(2024, 1, 31), date(2024, 2, 29), date(2024, 3, 31), date(2024, 4, 30)]
        );
    }

    #[test]
    fn range_start_skips_but_counts_earlier_occurrences() {
        let def = series(date(2024, 1, 1), RecurrencePattern::daily(2).count(10));
        let got: Vec<_> = expand(&def, range(date(2024, 1, 10), date(2024, 1, 15)), 50)
            .unwrap()
            .collect();
        let ids: Vec<_> = got.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["s1::6", "s1::7", "s1::8"]);
        assert_eq!(got[0].start_date, date(2024, 1, 11));
    }

    #[test]
    fn count_reached_before_range_yields_nothing() {
        let def = series(date(2024, 1, 1), RecurrencePattern::weekly(1).count(3));
        let got = expand(&def, range(date(2024, 2, 1), date(2024, 2, 28)), 50).unwrap();
        assert_eq!(got.count(), 0);
    }

    #[test]
    fn sequence_is_restartable() {
        let def = series(date(2024, 1, 1), RecurrencePattern::daily(1).count(5));
        let mut occurrences = expand(&def, range(date(2024, 1, 1), date(2024, 1, 31)), 50).unwrap();
        let snapshot = occurrences.clone();
        let first: Vec<_> = occurrences.by_ref().collect();
        assert_eq!(occurrences.next(), None);
        occurrences.restart();
        let again: Vec<_> = occurrences.collect();
        assert_eq!(first, again);
        assert_eq!(snapshot.count(), 5);
    }

    #[test]
    fn custom_type_is_unsupported() {
        let def = series(
            date(2024, 1, 1),
            RecurrencePattern::new(RecurrenceType::Custom, 1),
        );
        let err = expand(&def, range(date(2024, 1, 1), date(2024, 1, 31)), 50).unwrap_err();
        assert_eq!(
            err,
            EventError::UnsupportedRecurrence {
                kind: "custom".into()
            }
        );
    }

    #[test]
    fn zero_frequency_is_invalid() {
        let def = series(date(2024, 1, 1), RecurrencePattern::daily(0));
        let err = expand(&def, range(date(2024, 1, 1), date(2024, 1, 31)), 50).unwrap_err();
        assert!(matches!(err, EventError::InvalidRecurrenceConfig(_)));
    }

    #[test]
    fn zero_cap_without_end_condition_is_invalid() {
        let def = series(date(2024, 1, 1), RecurrencePattern::daily(1));
        assert!(matches!(
            expand(&def, range(date(2024, 1, 1), date(2024, 1, 31)), 0),
            Err(EventError::InvalidRecurrenceConfig(_))
        ));
        let bounded = series(date(2024, 1, 1), RecurrencePattern::daily(1).count(2));
        assert!(expand(&bounded, range(date(2024, 1, 1), date(2024, 1, 31)), 0).is_ok());
    }

    #[test]
    fn first_candidate_never_overshoots() {
        let anchor = date(2024, 1, 31);
        let step = Step::Months(1);
        let from = date(2024, 3, 5);
        let n = step.first_candidate(anchor, from);
        assert!(step.nth(anchor, n).unwrap() >= from || n == 1);
        assert!(step.nth(anchor, n - 1).unwrap() < from);
    }
}
