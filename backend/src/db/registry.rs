use common::model::sheet::SheetRegistryEntry;
use rusqlite::types::Value;
use rusqlite::{params, Connection, OptionalExtension};

use crate::schema::ddl::qualified_table_name;

pub const REGISTRY_TABLE: &str = "uploaded_sheets";

pub fn create_registry_table(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(&format!(
        "CREATE TABLE IF NOT EXISTS {} (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            display_name TEXT NOT NULL,
            table_name TEXT NOT NULL UNIQUE,
            created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now'))
        );",
        qualified_table_name(REGISTRY_TABLE)
    ))
}

pub fn insert_entry(conn: &Connection, entry: &SheetRegistryEntry) -> rusqlite::Result<()> {
    conn.execute(
        &format!(
            "INSERT INTO {} (display_name, table_name) VALUES (?1, ?2)",
            qualified_table_name(REGISTRY_TABLE)
        ),
        params![entry.display_name, entry.table_name],
    )?;
    Ok(())
}

/// All registered sheets, newest first.
pub fn list_entries(conn: &Connection) -> rusqlite::Result<Vec<SheetRegistryEntry>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT display_name, table_name, created_at FROM {} ORDER BY id DESC",
        qualified_table_name(REGISTRY_TABLE)
    ))?;
    let entries = stmt
        .query_map([], |row| {
            Ok(SheetRegistryEntry {
                display_name: row.get(0)?,
                table_name: row.get(1)?,
                created_at: row.get(2)?,
            })
        })?
        .collect();
    entries
}

pub fn find_entry(conn: &Connection, table_name: &str) -> rusqlite::Result<Option<SheetRegistryEntry>> {
    conn.query_row(
        &format!(
            "SELECT display_name, table_name, created_at FROM {} WHERE table_name = ?1",
            qualified_table_name(REGISTRY_TABLE)
        ),
        params![table_name],
        |row| {
            Ok(SheetRegistryEntry {
                display_name: row.get(0)?,
                table_name: row.get(1)?,
                created_at: row.get(2)?,
            })
        },
    )
    .optional()
}

/// A column of a stored sheet with its declared SQL type.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredColumn {
    pub name: String,
    pub declared_type: Option<String>,
}

impl StoredColumn {
    pub fn is_boolean(&self) -> bool {
        self.declared_type
            .as_deref()
            .is_some_and(|t| t.eq_ignore_ascii_case("BOOLEAN"))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableContents {
    pub columns: Vec<StoredColumn>,
    pub rows: Vec<Vec<Value>>,
}

/// Reads every row of an imported table in insertion order.
///
/// `table_name` must come from the registry; it is quoted but not checked here.
pub fn read_table(conn: &Connection, table_name: &str) -> rusqlite::Result<TableContents> {
    let mut stmt = conn.prepare(&format!(
        "SELECT * FROM {} ORDER BY rowid",
        qualified_table_name(table_name)
    ))?;
    let columns: Vec<StoredColumn> = stmt
        .columns()
        .iter()
        .map(|c| StoredColumn {
            name: c.name().to_string(),
            declared_type: c.decl_type().map(str::to_string),
        })
        .collect();
    let width = columns.len();
    let rows = stmt
        .query_map([], |row| {
            (0..width)
                .map(|i| row.get::<_, Value>(i))
                .collect::<rusqlite::Result<Vec<Value>>>()
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(TableContents { columns, rows })
}
