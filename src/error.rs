//! Error types for phonebook operations.

use std::path::PathBuf;

use thiserror::Error;

use crate::models::Contact;

/// Every failure the data layer and the phonebook service can report.
#[derive(Error, Debug)]
pub enum PhonebookError {
    /// A field name that is not a column of the table (or is managed by the store)
    #[error("Field '{field}' is not a writable column of '{table}'")]
    SchemaViolation { table: String, field: String },

    /// The store rejected a write, e.g. a duplicate unique phone
    #[error("Constraint violation in {operation}: {source}")]
    ConstraintViolation {
        operation: String,
        #[source]
        source: rusqlite::Error,
    },

    /// A value failed the phone / email / name policy
    #[error("Invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    /// The phone is already taken by another contact
    #[error("Phone number {} already belongs to {} {}", .existing.phone, .existing.first_name, .existing.last_name)]
    DuplicatePhone { existing: Box<Contact> },

    /// Lookup by id or phone found nothing
    #[error("No contact found with {what}")]
    NotFound { what: String },

    /// Unusable input: missing CSV headers, absent file, inconsistent batch
    #[error("{0}")]
    MalformedInput(String),

    /// Any other SQLite failure
    #[error("Database error: {message}")]
    Database {
        message: String,
        #[source]
        source: rusqlite::Error,
    },

    /// A stored row that cannot be turned into a domain value
    #[error("Invalid stored record: {0}")]
    InvalidRecord(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("File system error at path '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PhonebookError {
    /// Validation failure for `field`.
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Classify a rusqlite error raised while running `operation`.
    pub fn from_sqlite(operation: &str, source: rusqlite::Error) -> Self {
        if source.sqlite_error_code() == Some(rusqlite::ErrorCode::ConstraintViolation) {
            Self::ConstraintViolation {
                operation: operation.to_string(),
                source,
            }
        } else {
            Self::Database {
                message: operation.to_string(),
                source,
            }
        }
    }

    /// Attach the operation name to an error coming out of a transaction body.
    /// Already classified errors keep their kind.
    pub(crate) fn in_operation(self, operation: &str) -> Self {
        match self {
            Self::Database { message, source } => Self::Database {
                message: format!("{}: {}", operation, message),
                source,
            },
            Self::ConstraintViolation {
                operation: inner,
                source,
            } => Self::ConstraintViolation {
                operation: format!("{}: {}", operation, inner),
                source,
            },
            other => other,
        }
    }

    /// True for errors raised by the store's constraints or the duplicate pre-check.
    pub fn is_duplicate(&self) -> bool {
        matches!(
            self,
            Self::ConstraintViolation { .. } | Self::DuplicatePhone { .. }
        )
    }
}

impl From<rusqlite::Error> for PhonebookError {
    fn from(source: rusqlite::Error) -> Self {
        Self::from_sqlite("query failed", source)
    }
}

/// Extension trait for rusqlite results to attach the operation name.
pub trait DatabaseResultExt<T> {
    fn db_context(self, operation: &str) -> Result<T>;
}

impl<T> DatabaseResultExt<T> for std::result::Result<T, rusqlite::Error> {
    fn db_context(self, operation: &str) -> Result<T> {
        self.map_err(|e| PhonebookError::from_sqlite(operation, e))
    }
}

/// Result type alias for phonebook operations
pub type Result<T> = std::result::Result<T, PhonebookError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_sqlite_error_is_database() {
        let err = PhonebookError::from_sqlite("fetch", rusqlite::Error::QueryReturnedNoRows);
        assert!(matches!(err, PhonebookError::Database { .. }));
        assert!(!err.is_duplicate());
    }

    #[test]
    fn test_in_operation_prefixes_database_message() {
        let err = PhonebookError::from_sqlite("insert", rusqlite::Error::InvalidQuery)
            .in_operation("add");
        match err {
            PhonebookError::Database { message, .. } => assert_eq!(message, "add: insert"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_in_operation_keeps_validation_kind() {
        let err = PhonebookError::validation("phone", "too short").in_operation("add");
        assert!(matches!(err, PhonebookError::Validation { .. }));
        assert_eq!(err.to_string(), "Invalid phone: too short");
    }
}
