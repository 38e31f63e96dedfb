//! `GET /api/sheets/{table_name}/rows`: reads an imported table back.

use actix_web::{web, HttpResponse};
use rusqlite::types::Value;
use serde_json::{Map, Value as JsonValue};

use crate::db::registry::{self, StoredColumn, TableContents};
use crate::db::Database;
use crate::error::SheetError;

pub(crate) async fn process(
    db: web::Data<Database>,
    table_name: web::Path<String>,
) -> Result<HttpResponse, SheetError> {
    let contents = load_sheet(db, table_name.into_inner()).await?;
    let rows: Vec<JsonValue> = contents
        .rows
        .iter()
        .map(|row| JsonValue::Object(row_to_json(&contents.columns, row)))
        .collect();
    Ok(HttpResponse::Ok().json(rows))
}

/// Reads a registered sheet. Tables that are not in the registry are never
/// read, whatever exists in the database.
pub(crate) async fn load_sheet(
    db: web::Data<Database>,
    table_name: String,
) -> Result<TableContents, SheetError> {
    let database = db.get_ref().clone();
    tokio::task::spawn_blocking(move || -> Result<TableContents, SheetError> {
        let conn = database.open()?;
        if registry::find_entry(&conn, &table_name)?.is_none() {
            return Err(SheetError::NotFound(table_name));
        }
        Ok(registry::read_table(&conn, &table_name)?)
    })
    .await
    .map_err(|e| SheetError::Unexpected(format!("join error: {}", e)))?
}

pub(crate) fn cell_to_json(column: &StoredColumn, value: &Value) -> JsonValue {
    match value {
        Value::Null => JsonValue::Null,
        Value::Integer(i) if column.is_boolean() => JsonValue::Bool(*i != 0),
        Value::Integer(i) => JsonValue::from(*i),
        Value::Real(f) => serde_json::Number::from_f64(*f)
            .map(JsonValue::Number)
            .unwrap_or(JsonValue::Null),
        Value::Text(s) => JsonValue::String(s.clone()),
        Value::Blob(bytes) => JsonValue::String(String::from_utf8_lossy(bytes).into_owned()),
    }
}

fn row_to_json(columns: &[StoredColumn], row: &[Value]) -> Map<String, JsonValue> {
    columns
        .iter()
        .zip(row)
        .map(|(column, value)| (column.name.clone(), cell_to_json(column, value)))
        .collect()
}
