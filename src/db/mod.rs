//! SQLite access for the phonebook.
//!
//! [`Database`] owns a lazily opened connection to a single database file.
//! [`Crud`] layers table-agnostic writes and reads on top of it, and
//! [`ContactRepository`] specializes that for the `contacts` table.

use std::cell::{Ref, RefCell};
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, error, warn};
use rusqlite::{Connection, ToSql};

use crate::error::{DatabaseResultExt, PhonebookError, Result};

mod contacts;
mod crud;
mod record;
pub mod schema;

pub use contacts::{ContactRepository, CONTACTS_TABLE};
pub use crud::Crud;
pub use record::Record;
pub use schema::TableSchema;

pub struct Database {
    path: PathBuf,
    conn: RefCell<Option<Connection>>,
}

impl Database {
    /// Prepare a database at `path`. Parent directories are created now; the
    /// file itself is created on the first [`Database::connect`].
    pub fn open_at(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| PhonebookError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        Ok(Self {
            path,
            conn: RefCell::new(None),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Open the handle if it is not open yet.
    pub fn connect(&self) -> Result<()> {
        if self.conn.borrow().is_some() {
            return Ok(());
        }

        let conn = Connection::open(&self.path).db_context("open database")?;
        debug!("Opened database {}", self.path.display());
        *self.conn.borrow_mut() = Some(conn);
        Ok(())
    }

    pub fn is_connected(&self) -> bool {
        self.conn.borrow().is_some()
    }

    /// Release the handle. A later call reopens it.
    pub fn close(&self) {
        let Some(conn) = self.conn.borrow_mut().take() else {
            return;
        };
        if let Err((_, e)) = conn.close() {
            warn!("Database {} did not close cleanly: {}", self.path.display(), e);
        }
    }

    fn handle(&self) -> Result<Ref<'_, Connection>> {
        self.connect()?;
        Ref::filter_map(self.conn.borrow(), Option::as_ref).map_err(|_| PhonebookError::Io {
            path: self.path.clone(),
            source: io::Error::new(io::ErrorKind::NotConnected, "database handle is closed"),
        })
    }

    /// Run a mutating statement and return the number of affected rows.
    pub fn execute(&self, sql: &str, params: &[&dyn ToSql]) -> Result<usize> {
        self.handle()?.execute(sql, params).db_context("execute")
    }

    pub fn execute_batch(&self, sql: &str) -> Result<()> {
        self.handle()?.execute_batch(sql).db_context("execute batch")
    }

    pub fn fetch_all(&self, sql: &str, params: &[&dyn ToSql]) -> Result<Vec<Record>> {
        let conn = self.handle()?;
        let mut stmt = conn.prepare(sql).db_context("prepare query")?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

        let records = stmt
            .query_map(params, |row| Record::from_row(row, &columns))
            .db_context("fetch rows")?
            .collect::<rusqlite::Result<Vec<_>>>()
            .db_context("fetch rows")?;

        Ok(records)
    }

    pub fn fetch_one(&self, sql: &str, params: &[&dyn ToSql]) -> Result<Option<Record>> {
        let conn = self.handle()?;
        let mut stmt = conn.prepare(sql).db_context("prepare query")?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

        let mut rows = stmt.query(params).db_context("fetch row")?;
        let record = match rows.next().db_context("fetch row")? {
            Some(row) => Some(Record::from_row(row, &columns).db_context("fetch row")?),
            None => None,
        };

        Ok(record)
    }

    pub fn last_insert_rowid(&self) -> Result<i64> {
        Ok(self.handle()?.last_insert_rowid())
    }

    pub(crate) fn with_connection<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let conn = self.handle()?;
        f(&conn)
    }

    /// Run `body` inside `BEGIN`/`COMMIT`, rolling back on error. The handle is
    /// closed afterwards whatever the outcome.
    pub fn transaction<T>(
        &self,
        operation: &str,
        body: impl FnOnce(&Database) -> Result<T>,
    ) -> Result<T> {
        let result = self.run_in_transaction(operation, body);
        self.close();
        result
    }

    fn run_in_transaction<T>(
        &self,
        operation: &str,
        body: impl FnOnce(&Database) -> Result<T>,
    ) -> Result<T> {
        self.execute_batch("BEGIN TRANSACTION")
            .map_err(|e| e.in_operation(operation))?;

        let outcome = body(self).and_then(|value| {
            self.execute_batch("COMMIT")?;
            Ok(value)
        });

        match outcome {
            Ok(value) => Ok(value),
            Err(e) => {
                if let Err(rollback) = self.execute_batch("ROLLBACK") {
                    warn!("Rollback of {} failed: {}", operation, rollback);
                }
                let e = e.in_operation(operation);
                error!("{} rolled back: {:?}", operation, e);
                Err(e)
            }
        }
    }
}

impl Drop for Database {
    fn drop(&mut self) {
        self.close();
    }
}
