//! Table introspection and field validation against the introspected columns.

use std::collections::BTreeMap;

use super::Database;
use crate::error::{PhonebookError, Result};

/// Columns the CRUD engine stamps itself; callers may not write them.
pub const CREATED_AT: &str = "created_at";
pub const UPDATED_AT: &str = "updated_at";

/// Column name to declared type, as reported by the store's catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableSchema {
    table: String,
    columns: BTreeMap<String, String>,
}

impl TableSchema {
    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn columns(&self) -> &BTreeMap<String, String> {
        &self.columns
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    /// An empty schema means the table does not exist.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Fail with `SchemaViolation` on the first name that is not a column.
    pub fn validate_fields<'a>(&self, names: impl IntoIterator<Item = &'a str>) -> Result<()> {
        for name in names {
            if !self.has_column(name) {
                return Err(self.violation(name));
            }
        }
        Ok(())
    }

    /// Like [`TableSchema::validate_fields`], also rejecting the timestamp
    /// columns that the store manages.
    pub fn validate_writable<'a>(&self, names: impl IntoIterator<Item = &'a str>) -> Result<()> {
        for name in names {
            if name == CREATED_AT || name == UPDATED_AT || !self.has_column(name) {
                return Err(self.violation(name));
            }
        }
        Ok(())
    }

    fn violation(&self, field: &str) -> PhonebookError {
        PhonebookError::SchemaViolation {
            table: self.table.clone(),
            field: field.to_string(),
        }
    }
}

/// Read the column definitions of `table`. A missing table yields an empty schema.
pub fn introspect(db: &Database, table: &str) -> Result<TableSchema> {
    let rows = db.fetch_all(
        "SELECT name, type FROM pragma_table_info(?1)",
        &[&table],
    )?;

    let columns = rows
        .iter()
        .filter_map(|row| {
            let name = row.text("name")?;
            Some((name.to_string(), row.text("type").unwrap_or_default().to_string()))
        })
        .collect();

    Ok(TableSchema {
        table: table.to_string(),
        columns,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::tests::temp_db;

    fn setup(db: &Database) {
        db.execute_batch(
            "CREATE TABLE people (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                age INTEGER,
                created_at TEXT,
                updated_at TEXT
            )",
        )
        .unwrap();
    }

    #[test]
    fn test_introspect_columns_and_types() {
        let (_dir, db) = temp_db();
        setup(&db);

        let schema = introspect(&db, "people").unwrap();
        assert_eq!(schema.table(), "people");
        assert_eq!(schema.columns().len(), 5);
        assert_eq!(schema.columns().get("name").map(String::as_str), Some("TEXT"));
        assert_eq!(schema.columns().get("age").map(String::as_str), Some("INTEGER"));
        assert!(schema.has_column("created_at"));
    }

    #[test]
    fn test_missing_table_is_empty_and_rejects_everything() {
        let (_dir, db) = temp_db();

        let schema = introspect(&db, "nope").unwrap();
        assert!(schema.is_empty());
        assert!(schema.validate_fields(["id"]).is_err());
        assert!(schema.validate_fields(std::iter::empty()).is_ok());
    }

    #[test]
    fn test_validate_fields() {
        let (_dir, db) = temp_db();
        setup(&db);
        let schema = introspect(&db, "people").unwrap();

        assert!(schema.validate_fields(["name", "age"]).is_ok());

        let err = schema.validate_fields(["name", "nickname"]).unwrap_err();
        match err {
            PhonebookError::SchemaViolation { table, field } => {
                assert_eq!(table, "people");
                assert_eq!(field, "nickname");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_validate_writable_rejects_timestamps() {
        let (_dir, db) = temp_db();
        setup(&db);
        let schema = introspect(&db, "people").unwrap();

        assert!(schema.validate_fields(["created_at"]).is_ok());
        assert!(schema.validate_writable(["name"]).is_ok());
        assert!(schema.validate_writable(["created_at"]).is_err());
        assert!(schema.validate_writable(["updated_at"]).is_err());
    }
}
