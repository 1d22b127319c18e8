use std::collections::HashSet;
use std::fs::File;
use std::path::Path;

use log::{info, warn};
use serde::Deserialize;

use super::Phonebook;
use crate::error::{PhonebookError, Result};
use crate::logging::AUDIT_TARGET;
use crate::models::NewContact;

/// Headers an import file must carry.
pub const REQUIRED_HEADERS: [&str; 3] = ["first_name", "last_name", "phone"];

/// A row from a CSV import file.
///
/// Headers must match field names exactly. Extra columns are ignored and
/// empty strings are converted to `None`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ImportRow {
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub first_name: Option<String>,

    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub last_name: Option<String>,

    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub phone: Option<String>,

    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub email: Option<String>,

    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub address: Option<String>,
}

impl ImportRow {
    /// Validate the row into an insertable contact.
    pub fn to_contact(&self) -> Result<NewContact> {
        let (Some(first), Some(last), Some(phone)) = (
            self.first_name.as_deref(),
            self.last_name.as_deref(),
            self.phone.as_deref(),
        ) else {
            return Err(PhonebookError::MalformedInput(
                "missing required data".to_string(),
            ));
        };

        Ok(NewContact::new(first, last, phone)?
            .with_email(self.email.as_deref())?
            .with_address(self.address.as_deref()))
    }
}

/// Deserialize empty strings as None.
fn empty_string_as_none<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    Ok(s.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()))
}

/// A row that was not imported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedRecord {
    /// Line in the file, header is line 1
    pub line: u64,
    /// The raw row, comma-joined
    pub record: String,
    pub reason: String,
}

#[derive(Debug, Default)]
pub struct ImportSummary {
    pub success_count: usize,
    pub failed: Vec<FailedRecord>,
    pub imported: Vec<NewContact>,
}

impl ImportSummary {
    pub fn failed_count(&self) -> usize {
        self.failed.len()
    }

    fn fail(&mut self, line: u64, record: String, reason: impl Into<String>) {
        let reason = reason.into();
        warn!("Skipping invalid record at line {}: {} - {}", line, record, reason);
        self.failed.push(FailedRecord {
            line,
            record,
            reason,
        });
    }
}

impl<'a> Phonebook<'a> {
    /// Import contacts from a CSV file.
    ///
    /// Rows with missing or invalid values, or with a phone that is already
    /// stored or repeated earlier in the file, are reported in the summary.
    /// The remaining rows are inserted together; if that insert fails none
    /// of them are kept.
    pub fn import_csv(&self, path: &Path) -> Result<ImportSummary> {
        if !path.is_file() {
            return Err(PhonebookError::MalformedInput(format!(
                "CSV file not found: {}",
                path.display()
            )));
        }

        let file = File::open(path).map_err(|source| PhonebookError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::Headers)
            .from_reader(file);

        let headers = reader.headers()?.clone();
        let missing: Vec<&str> = REQUIRED_HEADERS
            .iter()
            .copied()
            .filter(|h| !headers.iter().any(|found| found == *h))
            .collect();
        if !missing.is_empty() {
            return Err(PhonebookError::MalformedInput(format!(
                "CSV file is missing required headers: {}",
                missing.join(", ")
            )));
        }

        let mut summary = ImportSummary::default();
        let mut seen = HashSet::new();

        for (idx, result) in reader.records().enumerate() {
            let line = idx as u64 + 2;

            let raw = match result {
                Ok(raw) => raw,
                Err(e) => {
                    summary.fail(line, String::new(), format!("unreadable row: {}", e));
                    continue;
                }
            };
            let line = raw.position().map(|p| p.line()).unwrap_or(line);
            let text = raw.iter().collect::<Vec<_>>().join(",");

            let row: ImportRow = match raw.deserialize(Some(&headers)) {
                Ok(row) => row,
                Err(e) => {
                    summary.fail(line, text, format!("unreadable row: {}", e));
                    continue;
                }
            };

            let contact = match row.to_contact() {
                Ok(contact) => contact,
                Err(e) => {
                    summary.fail(line, text, e.to_string());
                    continue;
                }
            };

            if !seen.insert(contact.phone.clone()) {
                summary.fail(
                    line,
                    text,
                    format!("phone {} appears earlier in the file", contact.phone),
                );
                continue;
            }
            if let Some(existing) = self.find_by_phone(&contact.phone)? {
                let err = PhonebookError::DuplicatePhone {
                    existing: Box::new(existing),
                };
                summary.fail(line, text, err.to_string());
                continue;
            }

            summary.imported.push(contact);
        }

        if !summary.imported.is_empty() {
            summary.success_count = self.repo.bulk_add(&summary.imported)?;
            info!(
                "Bulk added contacts from CSV file: {}, Total records: {}",
                path.display(),
                summary.success_count
            );
            info!(
                target: AUDIT_TARGET,
                "Contacts imported: {} from {}",
                summary.success_count,
                path.display()
            );
        }

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::tests::temp_db;
    use crate::service::tests::contact;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn csv_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_import_counts_missing_data() {
        let (_dir, db) = temp_db();
        let book = Phonebook::open(&db, 10).unwrap();
        let file = csv_file(
            "first_name,last_name,phone\n\
             Ann,Lee,5550000001\n\
             Bob,,5550000002\n\
             Cid,Lee,5550000003\n\
             ,Lee,5550000004\n\
             Eve,Lee,5550000005\n",
        );

        let summary = book.import_csv(file.path()).unwrap();
        assert_eq!(summary.success_count, 3);
        assert_eq!(summary.failed_count(), 2);
        assert_eq!(summary.failed[0].line, 3);
        assert_eq!(summary.failed[0].reason, "missing required data");
        assert_eq!(summary.failed[1].record, ",Lee,5550000004");
        assert_eq!(book.summary(10).unwrap().0, 3);
    }

    #[test]
    fn test_import_accepts_spaced_headers() {
        let (_dir, db) = temp_db();
        let book = Phonebook::open(&db, 10).unwrap();
        let file = csv_file(
            "first_name, last_name, phone\n\
             Ann,Lee,5550000001\n\
             Bob,Lee,5550000002\n",
        );

        let summary = book.import_csv(file.path()).unwrap();
        assert_eq!(summary.success_count, 2);
        assert_eq!(summary.failed_count(), 0);
        assert_eq!(summary.imported[1].last_name, "Lee");
    }

    #[test]
    fn test_import_validates_and_canonicalizes() {
        let (_dir, db) = temp_db();
        let book = Phonebook::open(&db, 10).unwrap();
        let file = csv_file(
            "first_name,last_name,phone,email,address,notes\n\
             Ann,Lee,(555)000-0001,ann@example.com,\"1 Main St, Springfield\",vip\n\
             Bob,Lee,555-000-0002,,,\n\
             Cid,L33,5550000003,,,\n\
             Dan,Lee,5550000004,not-an-email,,\n",
        );

        let summary = book.import_csv(file.path()).unwrap();
        assert_eq!(summary.success_count, 1);
        assert_eq!(summary.failed_count(), 3);

        let ann = &summary.imported[0];
        assert_eq!(ann.phone.as_str(), "(555)000-0001");
        assert_eq!(ann.address.as_deref(), Some("1 Main St, Springfield"));
        assert!(summary.failed.iter().any(|f| f.reason.contains("phone")));
        assert!(summary.failed.iter().any(|f| f.reason.contains("last name")));
        assert!(summary.failed.iter().any(|f| f.reason.contains("email")));
    }

    #[test]
    fn test_import_reports_duplicate_phones() {
        let (_dir, db) = temp_db();
        let book = Phonebook::open(&db, 10).unwrap();
        book.add_contact(&contact("Jane", "Doe", "5551234567")).unwrap();
        let file = csv_file(
            "first_name,last_name,phone\n\
             Ann,Lee,(555)123-4567\n\
             Bob,Lee,5550000002\n\
             Cid,Lee,(555)000-0002\n",
        );

        let summary = book.import_csv(file.path()).unwrap();
        assert_eq!(summary.success_count, 1);
        assert_eq!(summary.failed_count(), 2);
        assert!(summary.failed[0].reason.contains("Jane Doe"));
        assert!(summary.failed[1].reason.contains("earlier in the file"));
        assert_eq!(book.summary(10).unwrap().0, 2);
    }

    #[test]
    fn test_import_missing_headers() {
        let (_dir, db) = temp_db();
        let book = Phonebook::open(&db, 10).unwrap();
        let file = csv_file("first_name,surname,mobile\nAnn,Lee,5550000001\n");

        match book.import_csv(file.path()).unwrap_err() {
            PhonebookError::MalformedInput(msg) => {
                assert!(msg.contains("last_name"));
                assert!(msg.contains("phone"));
                assert!(!msg.contains("first_name"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(book.summary(10).unwrap().0, 0);
    }

    #[test]
    fn test_import_missing_file() {
        let (dir, db) = temp_db();
        let book = Phonebook::open(&db, 10).unwrap();

        let err = book.import_csv(&dir.path().join("nope.csv")).unwrap_err();
        assert!(matches!(err, PhonebookError::MalformedInput(_)));
    }

    #[test]
    fn test_import_header_only_file() {
        let (_dir, db) = temp_db();
        let book = Phonebook::open(&db, 10).unwrap();
        let file = csv_file("first_name,last_name,phone\n");

        let summary = book.import_csv(file.path()).unwrap();
        assert_eq!(summary.success_count, 0);
        assert_eq!(summary.failed_count(), 0);
    }
}
