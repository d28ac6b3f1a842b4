use std::fmt::Display;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

const DEFAULT_COLOR: &str = "#3b82f6";

/// CSS-style hex color used as an event's display token.
///
/// Accepts `#rgb` and `#rrggbb`; the text is kept as given.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color(String);

impl Color {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Color {
    fn default() -> Self {
        Color(DEFAULT_COLOR.to_string())
    }
}

impl FromStr for Color {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        let valid = match trimmed.strip_prefix('#') {
            Some(hex) => {
                matches!(hex.len(), 3 | 6) && hex.chars().all(|c| c.is_ascii_hexdigit())
            }
            None => false,
        };
        if valid {
            Ok(Color(trimmed.to_string()))
        } else {
            Err(ValidationError::InvalidColor(value.to_string()))
        }
    }
}

impl TryFrom<String> for Color {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.0
    }
}

impl Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_short_and_long_hex() {
        assert_eq!("#fff".parse::<Color>().unwrap().as_str(), "#fff");
        assert_eq!("#3B82F6".parse::<Color>().unwrap().as_str(), "#3B82F6");
    }

    #[test]
    fn rejects_non_hex() {
        assert!("blue".parse::<Color>().is_err());
        assert!("#12345".parse::<Color>().is_err());
        assert!("#ggg".parse::<Color>().is_err());
    }

    #[test]
    fn deserialize_validates() {
        assert!(serde_json::from_str::<Color>("\"#10b981\"").is_ok());
        assert!(serde_json::from_str::<Color>("\"red\"").is_err());
    }
}
