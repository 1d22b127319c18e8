//! Value policy for contact fields.
//!
//! Names are required and alphabetic. Email is optional and must look like
//! `text@text.text`. Phone rules live with [`crate::models::PhoneNumber`].

use std::sync::OnceLock;

use regex::Regex;

use crate::error::{PhonebookError, Result};

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\S+@\S+\.\S+$").expect("email pattern compiles"))
}

/// Validate email format
pub fn is_valid_email(email: &str) -> bool {
    email_pattern().is_match(email)
}

/// Check a required name field. Returns the trimmed value.
pub fn validate_name(field: &str, value: &str) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(PhonebookError::validation(field, "cannot be empty"));
    }
    if !value.chars().all(char::is_alphabetic) {
        return Err(PhonebookError::validation(
            field,
            format!("'{}' must only contain letters", value),
        ));
    }
    Ok(value.to_string())
}

/// Check an optional email. Blank input means "no email".
pub fn validate_email(value: Option<&str>) -> Result<Option<String>> {
    let Some(email) = value.map(str::trim).filter(|e| !e.is_empty()) else {
        return Ok(None);
    };
    if !is_valid_email(email) {
        return Err(PhonebookError::validation(
            "email",
            format!("'{}' is not a valid email address", email),
        ));
    }
    Ok(Some(email.to_string()))
}

/// Normalize an optional free-text field; blank becomes `None`.
pub fn optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
