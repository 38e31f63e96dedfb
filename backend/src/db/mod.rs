//! SQLite persistence for imported sheets.
//!
//! `Database` knows where the database file lives and prepares the registry
//! table at startup. `SqliteBackend` is one open connection exposing the three
//! operations the ingestor needs (raw SQL, bulk row insert, registry insert)
//! through the `SheetBackend` trait, so the ingestor can also be driven by a
//! test double.

pub mod registry;

use common::model::sheet::SheetRegistryEntry;
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::schema::ddl::qualified_table_name;
use crate::schema::sanitize::quote_identifier;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// A row ready for insertion: column name and storage value, in column order.
/// Columns left out take their default.
pub type PreparedRow = Vec<(String, Value)>;

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("{0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// The database operations an import is built from.
pub trait SheetBackend {
    /// Runs arbitrary SQL (DDL during imports).
    fn execute_sql(&mut self, sql: &str) -> Result<(), BackendError>;

    /// Inserts every row into `table_name` as one unit: either all rows are
    /// stored or none are.
    fn insert_rows(&mut self, table_name: &str, rows: &[PreparedRow]) -> Result<usize, BackendError>;

    fn insert_registry_entry(&mut self, entry: &SheetRegistryEntry) -> Result<(), BackendError>;
}

#[derive(Debug, Clone)]
pub struct Database {
    path: PathBuf,
}

impl Database {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn open(&self) -> Result<Connection, BackendError> {
        let conn = Connection::open(&self.path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        Ok(conn)
    }

    /// Creates the registry table if this is a fresh database.
    pub fn initialize(&self) -> Result<(), BackendError> {
        let conn = self.open()?;
        registry::create_registry_table(&conn)?;
        Ok(())
    }

    pub fn backend(&self) -> Result<SqliteBackend, BackendError> {
        Ok(SqliteBackend::new(self.open()?))
    }
}

pub struct SqliteBackend {
    conn: Connection,
}

impl SqliteBackend {
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    #[cfg(test)]
    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

fn insert_statement(table_name: &str, row: &PreparedRow) -> String {
    if row.is_empty() {
        return format!("INSERT INTO {} DEFAULT VALUES", qualified_table_name(table_name));
    }
    let columns: Vec<String> = row.iter().map(|(name, _)| quote_identifier(name)).collect();
    let placeholders: Vec<String> = (1..=row.len()).map(|i| format!("?{i}")).collect();
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        qualified_table_name(table_name),
        columns.join(", "),
        placeholders.join(", ")
    )
}

impl SheetBackend for SqliteBackend {
    fn execute_sql(&mut self, sql: &str) -> Result<(), BackendError> {
        self.conn.execute_batch(sql)?;
        Ok(())
    }

    fn insert_rows(&mut self, table_name: &str, rows: &[PreparedRow]) -> Result<usize, BackendError> {
        let tx = self.conn.transaction()?;
        for row in rows {
            let mut stmt = tx.prepare_cached(&insert_statement(table_name, row))?;
            stmt.execute(params_from_iter(row.iter().map(|(_, value)| value)))?;
        }
        tx.commit()?;
        Ok(rows.len())
    }

    fn insert_registry_entry(&mut self, entry: &SheetRegistryEntry) -> Result<(), BackendError> {
        registry::insert_entry(&self.conn, entry)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_backend() -> SqliteBackend {
        let conn = Connection::open_in_memory().unwrap();
        registry::create_registry_table(&conn).unwrap();
        SqliteBackend::new(conn)
    }

    #[test]
    fn insert_statement_lists_only_given_columns() {
        let row: PreparedRow = vec![
            ("id".into(), Value::Text("x".into())),
            ("quantity".into(), Value::Integer(2)),
        ];
        assert_eq!(
            insert_statement("parts", &row),
            "INSERT INTO \"main\".\"parts\" (\"id\", \"quantity\") VALUES (?1, ?2)"
        );
        assert_eq!(
            insert_statement("parts", &Vec::new()),
            "INSERT INTO \"main\".\"parts\" DEFAULT VALUES"
        );
    }

    #[test]
    fn failed_bulk_insert_stores_nothing() {
        let mut backend = memory_backend();
        backend
            .execute_sql("CREATE TABLE \"main\".\"parts\" (\"id\" TEXT PRIMARY KEY NOT NULL, \"name\" TEXT);")
            .unwrap();

        let rows: Vec<PreparedRow> = vec![
            vec![("id".into(), Value::Text("a".into())), ("name".into(), Value::Text("Bolt".into()))],
            vec![("id".into(), Value::Text("a".into())), ("name".into(), Value::Text("Nut".into()))],
        ];
        assert!(backend.insert_rows("parts", &rows).is_err());

        let count: i64 = backend
            .connection()
            .query_row("SELECT COUNT(*) FROM \"parts\"", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn registry_rejects_duplicate_table_names() {
        let mut backend = memory_backend();
        let entry = SheetRegistryEntry::new("Parts", "parts");
        backend.insert_registry_entry(&entry).unwrap();
        let err = backend.insert_registry_entry(&entry).unwrap_err();
        assert!(err.to_string().contains("UNIQUE"), "{err}");
    }
}
