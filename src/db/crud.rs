//! Table-agnostic writes and reads over [`Database`].
//!
//! Every write validates its field names against the introspected schema,
//! runs in its own transaction and closes the handle afterwards. Reads need
//! no transaction.

use chrono::{SecondsFormat, Utc};
use log::{debug, warn};
use rusqlite::ToSql;

use super::schema::{self, TableSchema, CREATED_AT, UPDATED_AT};
use super::{Database, Record};
use crate::error::{DatabaseResultExt, PhonebookError, Result};

pub struct Crud<'a> {
    db: &'a Database,
    schema: TableSchema,
}

/// Double-quote an identifier for interpolation into SQL.
fn quote(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn now_stamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn conditions(fields: &Record) -> String {
    fields
        .names()
        .map(|name| format!("{} = ?", quote(name)))
        .collect::<Vec<_>>()
        .join(" AND ")
}

fn params_of(record: &Record) -> Vec<&dyn ToSql> {
    record.values().map(|v| v as &dyn ToSql).collect()
}

impl<'a> Crud<'a> {
    /// Bind to `table`, introspecting its schema once.
    pub fn new(db: &'a Database, table: &str) -> Result<Self> {
        let schema = schema::introspect(db, table)?;
        if schema.is_empty() {
            warn!("Table '{}' not found; all fields will be rejected", table);
        }
        Ok(Self { db, schema })
    }

    pub fn table(&self) -> &str {
        self.schema.table()
    }

    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    pub fn database(&self) -> &'a Database {
        self.db
    }

    /// Timestamp columns present in this table, in insert order.
    fn stamp_columns(&self) -> Vec<&'static str> {
        [CREATED_AT, UPDATED_AT]
            .into_iter()
            .filter(|c| self.schema.has_column(c))
            .collect()
    }

    fn insert_sql(&self, fields: &Record) -> String {
        let mut columns: Vec<String> = fields.names().map(quote).collect();
        columns.extend(self.stamp_columns().into_iter().map(quote));
        let placeholders = vec!["?"; columns.len()].join(", ");

        format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quote(self.table()),
            columns.join(", "),
            placeholders
        )
    }

    /// Insert one row and return its rowid. Both timestamps get the same instant.
    pub fn add(&self, fields: &Record) -> Result<i64> {
        if fields.is_empty() {
            return Err(PhonebookError::MalformedInput(
                "cannot insert a record without fields".to_string(),
            ));
        }
        self.schema.validate_writable(fields.names())?;

        let sql = self.insert_sql(fields);
        let stamp = now_stamp();
        debug!("{}", sql);

        self.db.transaction("add", |db| {
            let mut params = params_of(fields);
            params.extend(self.stamp_columns().iter().map(|_| &stamp as &dyn ToSql));
            db.execute(&sql, &params)?;
            db.last_insert_rowid()
        })
    }

    /// Update the rows matching every `filter` field. Matching nothing is not
    /// an error; the affected row count is returned.
    pub fn update(&self, filter: &Record, set: &Record) -> Result<usize> {
        if set.is_empty() {
            return Err(PhonebookError::MalformedInput(
                "no fields to update".to_string(),
            ));
        }
        if filter.is_empty() {
            return Err(PhonebookError::MalformedInput(
                "update requires at least one condition".to_string(),
            ));
        }
        self.schema.validate_writable(set.names())?;
        self.schema.validate_fields(filter.names())?;

        let mut assignments: Vec<String> = set
            .names()
            .map(|name| format!("{} = ?", quote(name)))
            .collect();
        let touch = self.schema.has_column(UPDATED_AT);
        if touch {
            assignments.push(format!("{} = ?", quote(UPDATED_AT)));
        }

        let sql = format!(
            "UPDATE {} SET {} WHERE {}",
            quote(self.table()),
            assignments.join(", "),
            conditions(filter)
        );
        let stamp = now_stamp();
        debug!("{}", sql);

        self.db.transaction("update", |db| {
            let mut params = params_of(set);
            if touch {
                params.push(&stamp);
            }
            params.extend(params_of(filter));
            db.execute(&sql, &params)
        })
    }

    /// Delete the rows matching every `filter` field. Matching nothing is not an error.
    pub fn delete(&self, filter: &Record) -> Result<usize> {
        if filter.is_empty() {
            return Err(PhonebookError::MalformedInput(
                "delete requires at least one condition".to_string(),
            ));
        }
        self.schema.validate_fields(filter.names())?;

        let sql = format!(
            "DELETE FROM {} WHERE {}",
            quote(self.table()),
            conditions(filter)
        );
        debug!("{}", sql);

        self.db
            .transaction("delete", |db| db.execute(&sql, &params_of(filter)))
    }

    /// Insert all records in one transaction; any failure keeps none of them.
    /// Every record must carry the same field names as the first.
    pub fn bulk_add(&self, records: &[Record]) -> Result<usize> {
        let Some(first) = records.first() else {
            return Ok(0);
        };
        if first.is_empty() {
            return Err(PhonebookError::MalformedInput(
                "cannot insert a record without fields".to_string(),
            ));
        }
        self.schema.validate_writable(first.names())?;

        if let Some(pos) = records
            .iter()
            .position(|r| !r.names().eq(first.names()))
        {
            return Err(PhonebookError::MalformedInput(format!(
                "record {} does not have the same fields as the first record",
                pos + 1
            )));
        }

        let sql = self.insert_sql(first);
        let stamp = now_stamp();
        let stamps = self.stamp_columns().len();
        debug!("{} (x{})", sql, records.len());

        self.db.transaction("bulk_add", |db| {
            db.with_connection(|conn| {
                let mut stmt = conn.prepare(&sql).db_context("bulk insert")?;
                for record in records {
                    let mut params = params_of(record);
                    params.extend((0..stamps).map(|_| &stamp as &dyn ToSql));
                    stmt.execute(&params[..]).db_context("bulk insert")?;
                }
                Ok(records.len())
            })
        })
    }

    fn select_sql(&self, filter: &Record) -> String {
        let mut sql = format!("SELECT * FROM {}", quote(self.table()));
        if !filter.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&conditions(filter));
        }
        sql
    }

    pub fn fetch_one(&self, filter: &Record) -> Result<Option<Record>> {
        self.schema.validate_fields(filter.names())?;
        let sql = format!("{} LIMIT 1", self.select_sql(filter));
        self.db.fetch_one(&sql, &params_of(filter))
    }

    /// One page of rows matching `filter` (all rows when it is empty).
    pub fn fetch_all(&self, limit: u32, offset: u32, filter: &Record) -> Result<Vec<Record>> {
        self.schema.validate_fields(filter.names())?;

        let mut sql = self.select_sql(filter);
        if self.schema.has_column("id") {
            sql.push_str(" ORDER BY \"id\"");
        }
        sql.push_str(" LIMIT ? OFFSET ?");

        let mut params = params_of(filter);
        params.push(&limit);
        params.push(&offset);
        self.db.fetch_all(&sql, &params)
    }

    pub fn count(&self, filter: &Record) -> Result<u32> {
        self.schema.validate_fields(filter.names())?;

        let mut sql = format!("SELECT COUNT(*) AS n FROM {}", quote(self.table()));
        if !filter.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&conditions(filter));
        }

        let row = self.db.fetch_one(&sql, &params_of(filter))?;
        let count = row.and_then(|r| r.integer("n")).unwrap_or(0);
        Ok(u32::try_from(count).unwrap_or(u32::MAX))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::tests::temp_db;

    fn setup(db: &Database) {
        db.execute_batch(
            "CREATE TABLE people (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                phone TEXT UNIQUE NOT NULL,
                created_at TEXT,
                updated_at TEXT
            )",
        )
        .unwrap();
        db.close();
    }

    fn person(name: &str, phone: &str) -> Record {
        Record::new()
            .with("name", name.to_string())
            .with("phone", phone.to_string())
    }

    fn by(field: &str, value: &str) -> Record {
        Record::new().with(field, value.to_string())
    }

    #[test]
    fn test_add_stamps_both_timestamps() {
        let (_dir, db) = temp_db();
        setup(&db);
        let crud = Crud::new(&db, "people").unwrap();

        let id = crud.add(&person("Ann", "1")).unwrap();
        assert_eq!(id, 1);
        assert!(!db.is_connected());

        let row = crud.fetch_one(&by("phone", "1")).unwrap().unwrap();
        assert_eq!(row.integer("id"), Some(1));
        assert_eq!(row.text("name"), Some("Ann"));
        let created = row.text("created_at").unwrap();
        assert_eq!(Some(created), row.text("updated_at"));
    }

    #[test]
    fn test_add_unknown_field_writes_nothing() {
        let (_dir, db) = temp_db();
        setup(&db);
        let crud = Crud::new(&db, "people").unwrap();

        let fields = person("Ann", "1").with("nickname", "A".to_string());
        let err = crud.add(&fields).unwrap_err();
        assert!(matches!(err, PhonebookError::SchemaViolation { .. }));
        assert_eq!(crud.count(&Record::new()).unwrap(), 0);
    }

    #[test]
    fn test_add_rejects_managed_columns() {
        let (_dir, db) = temp_db();
        setup(&db);
        let crud = Crud::new(&db, "people").unwrap();

        let fields = person("Ann", "1").with("created_at", "yesterday".to_string());
        assert!(matches!(
            crud.add(&fields),
            Err(PhonebookError::SchemaViolation { .. })
        ));
    }

    #[test]
    fn test_duplicate_unique_is_constraint_violation() {
        let (_dir, db) = temp_db();
        setup(&db);
        let crud = Crud::new(&db, "people").unwrap();

        crud.add(&person("Ann", "1")).unwrap();
        let err = crud.add(&person("Bob", "1")).unwrap_err();
        assert!(matches!(err, PhonebookError::ConstraintViolation { .. }));
        assert_eq!(crud.count(&Record::new()).unwrap(), 1);
    }

    #[test]
    fn test_update_sets_fields_and_touches_updated_at() {
        let (_dir, db) = temp_db();
        setup(&db);
        let crud = Crud::new(&db, "people").unwrap();
        crud.add(&person("Ann", "1")).unwrap();
        let before = crud.fetch_one(&by("phone", "1")).unwrap().unwrap();

        let changed = crud.update(&by("phone", "1"), &by("name", "Anna")).unwrap();
        assert_eq!(changed, 1);

        let after = crud.fetch_one(&by("phone", "1")).unwrap().unwrap();
        assert_eq!(after.text("name"), Some("Anna"));
        assert_eq!(after.text("created_at"), before.text("created_at"));
        assert!(after.text("updated_at") >= before.text("updated_at"));
    }

    #[test]
    fn test_update_matching_nothing_is_ok() {
        let (_dir, db) = temp_db();
        setup(&db);
        let crud = Crud::new(&db, "people").unwrap();
        crud.add(&person("Ann", "1")).unwrap();

        let changed = crud.update(&by("phone", "999"), &by("name", "Zed")).unwrap();
        assert_eq!(changed, 0);
        let row = crud.fetch_one(&by("phone", "1")).unwrap().unwrap();
        assert_eq!(row.text("name"), Some("Ann"));
    }

    #[test]
    fn test_update_unknown_field_changes_nothing() {
        let (_dir, db) = temp_db();
        setup(&db);
        let crud = Crud::new(&db, "people").unwrap();
        crud.add(&person("Ann", "1")).unwrap();

        let set = by("name", "Zed").with("age", 3i64);
        let err = crud.update(&by("phone", "1"), &set).unwrap_err();
        assert!(matches!(err, PhonebookError::SchemaViolation { .. }));

        let row = crud.fetch_one(&by("phone", "1")).unwrap().unwrap();
        assert_eq!(row.text("name"), Some("Ann"));
    }

    #[test]
    fn test_update_and_delete_require_conditions() {
        let (_dir, db) = temp_db();
        setup(&db);
        let crud = Crud::new(&db, "people").unwrap();

        assert!(matches!(
            crud.update(&Record::new(), &by("name", "x")),
            Err(PhonebookError::MalformedInput(_))
        ));
        assert!(matches!(
            crud.update(&by("phone", "1"), &Record::new()),
            Err(PhonebookError::MalformedInput(_))
        ));
        assert!(matches!(
            crud.delete(&Record::new()),
            Err(PhonebookError::MalformedInput(_))
        ));
    }

    #[test]
    fn test_delete() {
        let (_dir, db) = temp_db();
        setup(&db);
        let crud = Crud::new(&db, "people").unwrap();
        crud.add(&person("Ann", "1")).unwrap();
        crud.add(&person("Bob", "2")).unwrap();

        assert_eq!(crud.delete(&by("phone", "1")).unwrap(), 1);
        assert_eq!(crud.delete(&by("phone", "1")).unwrap(), 0);
        assert_eq!(crud.count(&Record::new()).unwrap(), 1);
    }

    #[test]
    fn test_bulk_add_is_atomic() {
        let (_dir, db) = temp_db();
        setup(&db);
        let crud = Crud::new(&db, "people").unwrap();

        let batch = vec![person("Ann", "1"), person("Bob", "2"), person("Cid", "1")];
        let err = crud.bulk_add(&batch).unwrap_err();
        assert!(matches!(err, PhonebookError::ConstraintViolation { .. }));
        assert_eq!(crud.count(&Record::new()).unwrap(), 0);

        let batch = vec![person("Ann", "1"), person("Bob", "2")];
        assert_eq!(crud.bulk_add(&batch).unwrap(), 2);
        assert_eq!(crud.count(&Record::new()).unwrap(), 2);
    }

    #[test]
    fn test_bulk_add_requires_same_fields() {
        let (_dir, db) = temp_db();
        setup(&db);
        let crud = Crud::new(&db, "people").unwrap();

        let batch = vec![person("Ann", "1"), by("name", "Bob")];
        assert!(matches!(
            crud.bulk_add(&batch),
            Err(PhonebookError::MalformedInput(_))
        ));
        assert_eq!(crud.bulk_add(&[]).unwrap(), 0);
    }

    #[test]
    fn test_fetch_all_paginates() {
        let (_dir, db) = temp_db();
        setup(&db);
        let crud = Crud::new(&db, "people").unwrap();
        let batch: Vec<Record> = (1..=5)
            .map(|i| person(&format!("P{}", i), &i.to_string()))
            .collect();
        crud.bulk_add(&batch).unwrap();

        let first = crud.fetch_all(2, 0, &Record::new()).unwrap();
        let third = crud.fetch_all(2, 4, &Record::new()).unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(first[0].text("name"), Some("P1"));
        assert_eq!(third.len(), 1);
        assert_eq!(third[0].text("name"), Some("P5"));

        let filtered = crud.fetch_all(10, 0, &by("name", "P3")).unwrap();
        assert_eq!(filtered.len(), 1);
    }

    #[test]
    fn test_missing_table_rejects_all_fields() {
        let (_dir, db) = temp_db();
        let crud = Crud::new(&db, "ghosts").unwrap();
        assert!(crud.schema().is_empty());
        assert!(matches!(
            crud.add(&by("name", "Boo")),
            Err(PhonebookError::SchemaViolation { .. })
        ));
    }
}
