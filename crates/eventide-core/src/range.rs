//! Inclusive calendar date ranges used by queries.

use chrono::{Datelike, Days, NaiveDate};

use crate::error::ValidationError;

/// A closed interval of calendar dates, `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    /// # Errors
    /// Returns `InvalidDateRange` if `start` is after `end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, ValidationError> {
        if start > end {
            return Err(ValidationError::InvalidDateRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// A single day.
    pub fn day(date: NaiveDate) -> Self {
        Self {
            start: date,
            end: date,
        }
    }

    /// Every day of a calendar month.
    pub fn month(year: i32, month: u32) -> Result<Self, ValidationError> {
        let start = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(|| invalid_month(year, month))?;
        let next = if month == 12 {
            NaiveDate::from_ymd_opt(year + 1, 1, 1)
        } else {
            NaiveDate::from_ymd_opt(year, month + 1, 1)
        };
        let end = next
            .and_then(|d| d.pred_opt())
            .ok_or_else(|| invalid_month(year, month))?;
        Ok(Self { start, end })
    }

    /// The month widened to whole Sunday-start weeks, as a month grid shows it.
    pub fn month_grid(year: i32, month: u32) -> Result<Self, ValidationError> {
        let month_range = Self::month(year, month)?;
        let lead = month_range.start.weekday().num_days_from_sunday();
        let tail = 6 - month_range.end.weekday().num_days_from_sunday();
        let start = month_range
            .start
            .checked_sub_days(Days::new(u64::from(lead)))
            .ok_or_else(|| invalid_month(year, month))?;
        let end = month_range
            .end
            .checked_add_days(Days::new(u64::from(tail)))
            .ok_or_else(|| invalid_month(year, month))?;
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Whether the span `[start, end]` shares at least one day with the range.
    pub fn intersects(&self, start: NaiveDate, end: NaiveDate) -> bool {
        start <= self.end && end >= self.start
    }
}

fn invalid_month(year: i32, month: u32) -> ValidationError {
    ValidationError::InvalidValue {
        field: "month".to_string(),
        message: format!("{year}-{month:02} is not a calendar month"),
    }
}
