use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{PhonebookError, Result};

/// A phone number in its canonical `(xxx)xxx-xxxx` form.
///
/// Accepted input is either ten bare digits or the canonical form itself, so
/// parsing an already canonical number is a no-op.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PhoneNumber(String);

fn bare_digits() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[0-9]{10}$").expect("phone pattern compiles"))
}

fn formatted() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^\([0-9]{3}\)[0-9]{3}-[0-9]{4}$").expect("phone pattern compiles")
    })
}

impl PhoneNumber {
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        let digits: String = if bare_digits().is_match(raw) {
            raw.to_string()
        } else if formatted().is_match(raw) {
            raw.chars().filter(char::is_ascii_digit).collect()
        } else {
            return Err(PhonebookError::validation(
                "phone",
                format!(
                    "'{}' is not a valid phone number; use (xxx)xxx-xxxx or xxxxxxxxxx",
                    raw
                ),
            ));
        };

        Ok(Self(format!(
            "({}){}-{}",
            &digits[..3],
            &digits[3..6],
            &digits[6..]
        )))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for PhoneNumber {
    type Error = PhonebookError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<PhoneNumber> for String {
    fn from(phone: PhoneNumber) -> Self {
        phone.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bare_digits() {
        let phone = PhoneNumber::parse("5551234567").unwrap();
        assert_eq!(phone.as_str(), "(555)123-4567");
    }

    #[test]
    fn test_parse_formatted_is_idempotent() {
        for raw in ["5551234567", "(555)123-4567", " 0001112222 "] {
            let once = PhoneNumber::parse(raw).unwrap();
            let twice = PhoneNumber::parse(once.as_str()).unwrap();
            assert_eq!(once, twice, "formatting {} twice changed it", raw);
        }
    }

    #[test]
    fn test_rejects_other_shapes() {
        for raw in [
            "",
            "555123456",
            "55512345678",
            "555-123-4567",
            "(555) 123-4567",
            "555.123.4567",
            "phone",
            "٥٥٥١٢٣٤٥٦٧",
        ] {
            assert!(PhoneNumber::parse(raw).is_err(), "accepted {:?}", raw);
        }
    }

    #[test]
    fn test_error_is_validation() {
        let err = PhoneNumber::parse("12345").unwrap_err();
        assert!(matches!(err, PhonebookError::Validation { ref field, .. } if field == "phone"));
    }
}
