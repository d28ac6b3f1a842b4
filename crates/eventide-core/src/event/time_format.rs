//! Wire formats for calendar dates (`YYYY-MM-DD`) and clock times (`HH:MM`).

use chrono::{NaiveDate, NaiveTime};

use crate::error::ValidationError;

pub(crate) const TIME_FORMAT: &str = "%H:%M";
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse a `YYYY-MM-DD` calendar date.
pub fn parse_date(value: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT)
        .map_err(|_| ValidationError::InvalidDate(value.to_string()))
}

/// Parse a 24-hour `HH:MM` clock time. `HH:MM:SS` is also accepted.
pub fn parse_time(value: &str) -> Result<NaiveTime, ValidationError> {
    let value_trimmed = value.trim();
    NaiveTime::parse_from_str(value_trimmed, TIME_FORMAT)
        .or_else(|_| NaiveTime::parse_from_str(value_trimmed, "%H:%M:%S"))
        .map_err(|_| ValidationError::InvalidTime(value.to_string()))
}

pub fn format_time(time: &NaiveTime) -> String {
    time.format(TIME_FORMAT).to_string()
}

/// Serde adapter for a required `HH:MM` field.
pub(crate) mod required {
    use chrono::NaiveTime;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &NaiveTime, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&super::format_time(value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(d)?;
        super::parse_time(&raw).map_err(de::Error::custom)
    }
}

/// Serde adapter for an optional `HH:MM` field. Empty strings read as absent.
pub(crate) mod option {
    use chrono::NaiveTime;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<NaiveTime>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(time) => s.serialize_some(&super::format_time(time)),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<NaiveTime>, D::Error> {
        let raw: Option<String> = Option::deserialize(d)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(value) => super::parse_time(value).map(Some).map_err(de::Error::custom),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_dates() {
        assert_eq!(
            parse_date("2024-02-29").unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
        );
        assert!(parse_date("2023-02-29").is_err());
        assert!(parse_date("02/03/2024").is_err());
    }

    #[test]
    fn parses_times_with_and_without_seconds() {
        let nine = NaiveTime::from_hms_opt(9, 0, 0).unwrap();
        assert_eq!(parse_time("09:00").unwrap(), nine);
        assert_eq!(parse_time("09:00:00").unwrap(), nine);
        assert!(parse_time("25:00").is_err());
        assert_eq!(format_time(&nine), "09:00");
    }
}
