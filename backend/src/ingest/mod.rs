//! Sheet import: from loosely typed spreadsheet rows to a registered table.
//!
//! An import runs as a short saga against a `SheetBackend`:
//!
//! 1. derive the table name from the display name and synthesize the schema
//!    from the first row;
//! 2. `CREATE TABLE` (state `TableCreated`);
//! 3. re-key and coerce every row, then insert them in one transaction
//!    (state `RowsInserted`);
//! 4. record `{display name, table name}` in the registry
//!    (state `RegistryRecorded`, then `Done`).
//!
//! Nothing is retried. When step 3 or 4 fails the new table is dropped with
//! `DROP TABLE IF EXISTS` before the error is returned; if the drop itself
//! fails the table is left behind and only logged.

use common::model::sheet::SheetRegistryEntry;
use common::requests::{ImportSheetRequest, RawRow};
use log::{debug, error, info, warn};
use rusqlite::types::Value;
use std::collections::HashMap;
use uuid::Uuid;

use crate::db::{BackendError, PreparedRow, SheetBackend};
use crate::error::IngestError;
use crate::schema::coerce::{coerce, CoerceError};
use crate::schema::ddl::{render_create_table, render_drop_table};
use crate::schema::{synthesize_schema, table_name_for, CellValue, SqlType, TableSchema};

/// One spreadsheet row with keys in header order.
pub type Row = Vec<(String, CellValue)>;

#[derive(Debug, Clone, PartialEq)]
pub struct ImportRequest {
    display_name: String,
    rows: Vec<Row>,
}

impl ImportRequest {
    /// Validates a display name and a non-empty set of rows.
    pub fn new(display_name: &str, rows: Vec<Row>) -> Result<Self, IngestError> {
        let display_name = display_name.trim();
        if display_name.is_empty() {
            return Err(IngestError::invalid_import("sheetDisplayName is blank"));
        }
        if rows.is_empty() {
            return Err(IngestError::invalid_import("jsonData has no rows"));
        }
        Ok(Self {
            display_name: display_name.to_string(),
            rows,
        })
    }

    pub fn from_payload(payload: ImportSheetRequest) -> Result<Self, IngestError> {
        let display_name = payload
            .sheet_display_name
            .ok_or_else(|| IngestError::invalid_import("sheetDisplayName is missing"))?;
        let raw_rows = payload
            .json_data
            .ok_or_else(|| IngestError::invalid_import("jsonData is missing"))?;
        let rows = raw_rows
            .iter()
            .map(row_from_json)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| IngestError::invalid_import(e.to_string()))?;
        Self::new(&display_name, rows)
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn first_row(&self) -> &[(String, CellValue)] {
        self.rows.first().map(Vec::as_slice).unwrap_or_default()
    }
}

fn row_from_json(raw: &RawRow) -> Result<Row, crate::schema::cell::NotScalar> {
    raw.iter()
        .map(|(key, value)| CellValue::from_json(key, value).map(|cell| (key.clone(), cell)))
        .collect()
}

/// Why the rows could not be stored.
#[derive(Debug, thiserror::Error)]
pub enum InsertError {
    #[error("column \"{key}\" of row {row} does not exist in the new table")]
    UnknownColumn { row: usize, key: String },

    #[error("row {row}, column \"{column}\": {source}")]
    Coerce {
        row: usize,
        column: String,
        #[source]
        source: CoerceError,
    },

    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Re-keys every row through the schema's header mapping and converts each
/// cell to its column type.
///
/// Null cells are left out so column defaults apply. Rows without a primary
/// key value get a fresh UUID. Rows are numbered from 1 in errors.
pub fn prepare_rows(schema: &TableSchema, rows: &[Row]) -> Result<Vec<PreparedRow>, InsertError> {
    rows.iter()
        .enumerate()
        .map(|(index, row)| {
            let row_number = index + 1;
            let mut cells: HashMap<&str, &CellValue> = HashMap::with_capacity(row.len());
            for (key, value) in row {
                if schema.column_for_key(key).is_none() {
                    return Err(InsertError::UnknownColumn {
                        row: row_number,
                        key: key.clone(),
                    });
                }
                cells.insert(key.as_str(), value);
            }

            let mut prepared = PreparedRow::with_capacity(schema.columns.len());
            for column in &schema.columns {
                let cell = column
                    .source_key
                    .as_deref()
                    .and_then(|key| cells.get(key).copied())
                    .filter(|cell| !cell.is_null());
                let value = match cell {
                    Some(cell) => coerce(cell, column.sql_type).map_err(|source| {
                        InsertError::Coerce {
                            row: row_number,
                            column: column.name.clone(),
                            source,
                        }
                    })?,
                    None if column.sql_type == SqlType::UuidPrimaryKey => {
                        Value::Text(Uuid::new_v4().to_string())
                    }
                    None => continue,
                };
                prepared.push((column.name.clone(), value));
            }
            Ok(prepared)
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportState {
    Idle,
    TableCreated,
    RowsInserted,
    RegistryRecorded,
    Done,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportOutcome {
    pub table_name: String,
    pub rows_inserted: usize,
}

/// Drives one import against a backend. Use a fresh `Ingestor` per import.
pub struct Ingestor<'a, B: SheetBackend> {
    backend: &'a mut B,
    state: ImportState,
}

impl<'a, B: SheetBackend> Ingestor<'a, B> {
    pub fn new(backend: &'a mut B) -> Self {
        Self {
            backend,
            state: ImportState::Idle,
        }
    }

    pub fn state(&self) -> ImportState {
        self.state
    }

    fn advance(&mut self, table_name: &str, next: ImportState) {
        debug!("import of {table_name}: {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    /// Drops the table created by this import. Failures are logged only.
    fn compensate(&mut self, table_name: &str) {
        match self.backend.execute_sql(&render_drop_table(table_name)) {
            Ok(()) => warn!("dropped table {table_name} after a failed import"),
            Err(e) => error!("could not drop table {table_name} after a failed import: {e}"),
        }
    }

    pub fn run(&mut self, request: &ImportRequest) -> Result<ImportOutcome, IngestError> {
        let table_name = table_name_for(request.display_name());
        let schema = synthesize_schema(&table_name, request.first_row());
        let ddl = render_create_table(&schema);
        debug!("{ddl}");

        if let Err(e) = self.backend.execute_sql(&ddl) {
            error!("error creating table {table_name}: {e}");
            return Err(IngestError::CreateTable(e));
        }
        self.advance(&table_name, ImportState::TableCreated);

        let inserted = prepare_rows(&schema, request.rows()).and_then(|rows| {
            self.backend
                .insert_rows(&table_name, &rows)
                .map_err(InsertError::from)
        });
        let rows_inserted = match inserted {
            Ok(count) => count,
            Err(e) => {
                error!("error inserting data into {table_name}: {e}");
                self.compensate(&table_name);
                return Err(IngestError::InsertRows(e));
            }
        };
        self.advance(&table_name, ImportState::RowsInserted);

        let entry = SheetRegistryEntry::new(request.display_name(), table_name.as_str());
        if let Err(e) = self.backend.insert_registry_entry(&entry) {
            error!("error saving sheet metadata for {table_name}: {e}");
            self.compensate(&table_name);
            return Err(IngestError::SaveRegistry(e));
        }
        self.advance(&table_name, ImportState::RegistryRecorded);

        let recognized = schema.columns.iter().filter(|c| c.is_core).count();
        info!(
            "imported sheet '{}' into {table_name}: {rows_inserted} rows, {} columns ({recognized} recognized)",
            request.display_name(),
            schema.columns.len()
        );
        self.advance(&table_name, ImportState::Done);
        Ok(ImportOutcome {
            table_name,
            rows_inserted,
        })
    }
}
