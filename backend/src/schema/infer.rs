use super::catalog;
use super::cell::CellValue;
use super::sanitize::sanitize_identifier;
use super::{ColumnSpec, SqlType, TableSchema, CREATED_AT_COLUMN, UPDATED_AT_COLUMN};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d %B %Y",
    "%d %b %Y",
    "%B %d, %Y",
    "%b %d, %Y",
];

/// Parses the date notations spreadsheets commonly export. Values without an
/// offset are taken as UTC.
pub fn parse_date(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(naive.and_utc());
        }
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
        }
    }
    None
}

/// Names SQLite resolves to the implicit row id unless a real column takes them.
const ROWID_ALIASES: &[&str] = &["rowid", "oid", "_rowid_"];

/// Column name for a header outside the catalog. Headers that would shadow the
/// row id get a `_col` suffix so rows keep reading back in insertion order.
fn column_name(sanitized: String) -> String {
    if ROWID_ALIASES.contains(&sanitized.as_str()) {
        format!("{sanitized}_col")
    } else {
        sanitized
    }
}

/// Type of a column outside the catalog, judged from a sample cell.
pub fn infer_type(value: &CellValue) -> SqlType {
    match value {
        CellValue::Integer(_) | CellValue::Float(_) => SqlType::Numeric,
        CellValue::Bool(_) => SqlType::Boolean,
        CellValue::Text(s) if parse_date(s).is_some() => SqlType::Timestamp,
        CellValue::Text(_) | CellValue::Null => SqlType::Text,
    }
}

/// Resolves the column for one header of the first row.
fn resolve_column(key: &str, sample: &CellValue) -> ColumnSpec {
    let sanitized = sanitize_identifier(key);
    match catalog::lookup(&sanitized) {
        Some(core) => ColumnSpec {
            name: core.name.to_string(),
            sql_type: core.sql_type,
            is_core: true,
            defaults_to_now: core.defaults_to_now,
            source_key: Some(key.to_string()),
        },
        None => ColumnSpec {
            name: column_name(sanitized),
            sql_type: infer_type(sample),
            is_core: false,
            defaults_to_now: false,
            source_key: Some(key.to_string()),
        },
    }
}

/// Builds the table schema from the first row of a sheet.
///
/// Columns keep the row's key order. A UUID primary key `id` is prepended when
/// no header resolved to one, and `created_at`/`updated_at` are appended when
/// missing. Later rows are not inspected.
pub fn synthesize_schema(table_name: &str, first_row: &[(String, CellValue)]) -> TableSchema {
    let mut schema = TableSchema {
        table_name: table_name.to_string(),
        columns: first_row
            .iter()
            .map(|(key, value)| resolve_column(key, value))
            .collect(),
    };

    if schema.primary_key().is_none() {
        schema.columns.insert(0, ColumnSpec::synthesized_primary_key());
    }
    for name in [CREATED_AT_COLUMN, UPDATED_AT_COLUMN] {
        if schema.column(name).is_none() {
            schema.columns.push(ColumnSpec::synthesized_timestamp(name));
        }
    }
    schema
}
