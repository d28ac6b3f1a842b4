//! Serde adapters for override fields that can also be cleared.
//!
//! A missing key means "keep the series value" (`None`). An empty string or
//! `null` means "clear it on this date" (`Some(None)`). Anything else is a
//! replacement value (`Some(Some(v))`). Pair with `default` and
//! `skip_serializing_if = "Option::is_none"`.

/// Optional text such as a description or category.
pub(crate) mod text {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<Option<String>>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(Some(text)) => s.serialize_str(text),
            _ => s.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Option<String>>, D::Error> {
        let raw: Option<String> = Option::deserialize(d)?;
        Ok(Some(raw.filter(|s| !s.trim().is_empty())))
    }
}

/// Optional `HH:MM` clock time.
pub(crate) mod time {
    use chrono::NaiveTime;
    use serde::{Deserializer, Serializer};

    use crate::event::time_format;

    pub fn serialize<S: Serializer>(
        value: &Option<Option<NaiveTime>>,
        s: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(Some(time)) => s.serialize_str(&time_format::format_time(time)),
            _ => s.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        d: D,
    ) -> Result<Option<Option<NaiveTime>>, D::Error> {
        time_format::option::deserialize(d).map(Some)
    }
}
