//! Column model and schema synthesis for imported sheets.
//!
//! A sheet arrives as loosely typed rows. This module turns the first row into
//! a `TableSchema`: recognized business columns get a fixed type from the
//! `catalog`, everything else is typed from its value (`infer`). The schema is
//! rendered to DDL by `ddl` and every cell is converted to its column's storage
//! value by `coerce` before insertion.

pub mod catalog;
pub mod cell;
pub mod coerce;
pub mod ddl;
pub mod infer;
pub mod sanitize;

pub use cell::CellValue;
pub use infer::synthesize_schema;
pub use sanitize::table_name_for;

/// Schema namespace every imported table is created under.
pub const SCHEMA_NAMESPACE: &str = "main";

pub const ID_COLUMN: &str = "id";
pub const CREATED_AT_COLUMN: &str = "created_at";
pub const UPDATED_AT_COLUMN: &str = "updated_at";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlType {
    UuidPrimaryKey,
    Integer,
    Numeric,
    Boolean,
    Timestamp,
    Text,
}

impl SqlType {
    /// Declared SQLite type of a column holding this kind of value.
    pub fn declared_type(self) -> &'static str {
        match self {
            SqlType::UuidPrimaryKey | SqlType::Text => "TEXT",
            SqlType::Integer => "INTEGER",
            SqlType::Numeric => "NUMERIC",
            SqlType::Boolean => "BOOLEAN",
            SqlType::Timestamp => "TIMESTAMP",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSpec {
    pub name: String,
    pub sql_type: SqlType,
    /// Recognized through the core column catalog.
    pub is_core: bool,
    /// Column defaults to the insertion time when a row leaves it empty.
    pub defaults_to_now: bool,
    /// Header in the uploaded sheet this column came from. `None` for columns
    /// added during synthesis.
    pub source_key: Option<String>,
}

impl ColumnSpec {
    pub fn synthesized_primary_key() -> Self {
        Self {
            name: ID_COLUMN.to_string(),
            sql_type: SqlType::UuidPrimaryKey,
            is_core: true,
            defaults_to_now: false,
            source_key: None,
        }
    }

    pub fn synthesized_timestamp(name: &str) -> Self {
        Self {
            name: name.to_string(),
            sql_type: SqlType::Timestamp,
            is_core: true,
            defaults_to_now: true,
            source_key: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableSchema {
    pub table_name: String,
    pub columns: Vec<ColumnSpec>,
}

impl TableSchema {
    pub fn column(&self, name: &str) -> Option<&ColumnSpec> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Column that cells under the spreadsheet header `key` belong to.
    pub fn column_for_key(&self, key: &str) -> Option<&ColumnSpec> {
        self.columns
            .iter()
            .find(|c| c.source_key.as_deref() == Some(key))
    }

    pub fn primary_key(&self) -> Option<&ColumnSpec> {
        self.columns
            .iter()
            .find(|c| c.sql_type == SqlType::UuidPrimaryKey)
    }
}

impl std::fmt::Display for SqlType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            SqlType::UuidPrimaryKey => "uuid",
            SqlType::Integer => "integer",
            SqlType::Numeric => "numeric",
            SqlType::Boolean => "boolean",
            SqlType::Timestamp => "timestamp",
            SqlType::Text => "text",
        })
    }
}
