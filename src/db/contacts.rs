use chrono::{DateTime, NaiveDateTime, Utc};
use log::debug;
use rusqlite::ToSql;

use super::{Crud, Database, Record};
use crate::error::{PhonebookError, Result};
use crate::models::{Contact, ContactChanges, NewContact, PhoneNumber};

pub const CONTACTS_TABLE: &str = "contacts";

const CREATE_CONTACTS: &str = "
CREATE TABLE IF NOT EXISTS contacts (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    first_name TEXT NOT NULL,
    last_name TEXT NOT NULL,
    phone TEXT UNIQUE NOT NULL,
    email TEXT,
    address TEXT,
    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
    updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
);
CREATE INDEX IF NOT EXISTS idx_contacts_name ON contacts(last_name, first_name);
";

/// Phone with its punctuation removed, for digit-only matching.
const PHONE_DIGITS_SQL: &str = "REPLACE(REPLACE(REPLACE(phone, '(', ''), ')', ''), '-', '')";

/// Contacts table access on top of the generic [`Crud`] engine.
pub struct ContactRepository<'a> {
    crud: Crud<'a>,
}

impl<'a> ContactRepository<'a> {
    /// Create the contacts table if needed and bind to it.
    pub fn open(db: &'a Database) -> Result<Self> {
        db.transaction("create contacts table", |db| db.execute_batch(CREATE_CONTACTS))?;
        let crud = Crud::new(db, CONTACTS_TABLE)?;
        Ok(Self { crud })
    }

    fn db(&self) -> &'a Database {
        self.crud.database()
    }

    pub fn add(&self, contact: &NewContact) -> Result<i64> {
        let id = self.crud.add(&new_contact_record(contact))?;
        debug!("Inserted contact {} ({})", id, contact.phone);
        Ok(id)
    }

    /// Insert every contact or none of them.
    pub fn bulk_add(&self, contacts: &[NewContact]) -> Result<usize> {
        let records: Vec<Record> = contacts.iter().map(new_contact_record).collect();
        self.crud.bulk_add(&records)
    }

    /// Substring match over first name, last name and phone, case-insensitive.
    /// A term made only of digits and phone punctuation also matches the
    /// phone's bare digits, so `5551234` finds `(555)123-4567`.
    pub fn search(&self, term: &str, limit: u32, offset: u32) -> Result<Vec<Contact>> {
        let (condition, patterns) = search_condition(term);
        let sql = format!(
            "SELECT * FROM contacts WHERE {} ORDER BY id LIMIT ? OFFSET ?",
            condition
        );

        let mut params: Vec<&dyn ToSql> = patterns.iter().map(|p| p as &dyn ToSql).collect();
        params.push(&limit);
        params.push(&offset);

        self.db()
            .fetch_all(&sql, &params)?
            .iter()
            .map(contact_from_record)
            .collect()
    }

    /// Number of contacts, optionally restricted to those matching `term`
    /// as in [`ContactRepository::search`].
    pub fn count(&self, term: Option<&str>) -> Result<u32> {
        let Some(term) = term else {
            return self.crud.count(&Record::new());
        };

        let (condition, patterns) = search_condition(term);
        let sql = format!("SELECT COUNT(*) AS n FROM contacts WHERE {}", condition);
        let params: Vec<&dyn ToSql> = patterns.iter().map(|p| p as &dyn ToSql).collect();

        let count = self
            .db()
            .fetch_one(&sql, &params)?
            .and_then(|r| r.integer("n"))
            .unwrap_or(0);
        Ok(u32::try_from(count).unwrap_or(u32::MAX))
    }

    pub fn list(&self, limit: u32, offset: u32) -> Result<Vec<Contact>> {
        self.crud
            .fetch_all(limit, offset, &Record::new())?
            .iter()
            .map(contact_from_record)
            .collect()
    }

    pub fn find_by_phone(&self, phone: &PhoneNumber) -> Result<Option<Contact>> {
        self.crud
            .fetch_one(&by_phone(phone))?
            .as_ref()
            .map(contact_from_record)
            .transpose()
    }

    pub fn find_by_id(&self, id: i64) -> Result<Option<Contact>> {
        self.crud
            .fetch_one(&by_id(id))?
            .as_ref()
            .map(contact_from_record)
            .transpose()
    }

    /// Returns the number of rows changed; zero when the phone is unknown.
    pub fn update_by_phone(&self, phone: &PhoneNumber, changes: &ContactChanges) -> Result<usize> {
        self.crud.update(&by_phone(phone), &changes_record(changes))
    }

    pub fn update_by_id(&self, id: i64, changes: &ContactChanges) -> Result<usize> {
        self.crud.update(&by_id(id), &changes_record(changes))
    }

    pub fn delete_by_phone(&self, phone: &PhoneNumber) -> Result<usize> {
        self.crud.delete(&by_phone(phone))
    }

    pub fn delete_by_id(&self, id: i64) -> Result<usize> {
        self.crud.delete(&by_id(id))
    }
}

fn by_phone(phone: &PhoneNumber) -> Record {
    Record::new().with("phone", phone.to_string())
}

fn by_id(id: i64) -> Record {
    Record::new().with("id", id)
}

fn new_contact_record(contact: &NewContact) -> Record {
    Record::new()
        .with("first_name", contact.first_name.clone())
        .with("last_name", contact.last_name.clone())
        .with("phone", contact.phone.to_string())
        .with_optional("email", contact.email.clone())
        .with_optional("address", contact.address.clone())
}

fn changes_record(changes: &ContactChanges) -> Record {
    changes
        .assignments()
        .into_iter()
        .fold(Record::new(), |record, (column, value)| record.with(column, value))
}

/// Escape special LIKE characters (% and _) for safe use in LIKE patterns
fn escape_like(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '%' | '_' | '\\' => {
                result.push('\\');
                result.push(c);
            }
            _ => result.push(c),
        }
    }
    result
}

/// WHERE condition and its bound patterns for a search term.
fn search_condition(term: &str) -> (String, Vec<String>) {
    let term = term.trim();
    let mut patterns = vec![format!("%{}%", escape_like(term))];
    let mut condition = String::from(
        "(first_name LIKE ?1 ESCAPE '\\' OR last_name LIKE ?1 ESCAPE '\\' OR phone LIKE ?1 ESCAPE '\\'",
    );

    let digits: String = term.chars().filter(char::is_ascii_digit).collect();
    let phone_like = term
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '(' | ')' | '-' | ' '));
    if !digits.is_empty() && phone_like {
        condition.push_str(&format!(" OR {} LIKE ?2", PHONE_DIGITS_SQL));
        patterns.push(format!("%{}%", digits));
    }
    condition.push(')');

    (condition, patterns)
}

fn parse_timestamp(field: &str, value: Option<&str>) -> Result<DateTime<Utc>> {
    let raw = value.ok_or_else(|| PhonebookError::InvalidRecord(format!("missing {}", field)))?;

    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    // Rows written by the column default use SQLite's CURRENT_TIMESTAMP format
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .map(|naive| naive.and_utc())
        .map_err(|e| PhonebookError::InvalidRecord(format!("{} '{}': {}", field, raw, e)))
}

fn required_text(record: &Record, field: &str) -> Result<String> {
    record
        .text(field)
        .map(str::to_string)
        .ok_or_else(|| PhonebookError::InvalidRecord(format!("missing {}", field)))
}

fn contact_from_record(record: &Record) -> Result<Contact> {
    let id = record
        .integer("id")
        .ok_or_else(|| PhonebookError::InvalidRecord("missing id".to_string()))?;
    let phone = PhoneNumber::parse(&required_text(record, "phone")?)
        .map_err(|e| PhonebookError::InvalidRecord(format!("contact {}: {}", id, e)))?;

    Ok(Contact {
        id,
        first_name: required_text(record, "first_name")?,
        last_name: required_text(record, "last_name")?,
        phone,
        email: record.text("email").map(str::to_string),
        address: record.text("address").map(str::to_string),
        created_at: parse_timestamp("created_at", record.text("created_at"))?,
        updated_at: parse_timestamp("updated_at", record.text("updated_at"))?,
    })
}
