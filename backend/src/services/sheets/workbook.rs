//! `.xlsx` and `.xls` uploads: the first worksheet becomes the sheet rows.

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use std::io::Cursor;

use super::upload::{keyed_row, validate_headers};
use crate::error::IngestError;
use crate::ingest::Row;
use crate::schema::coerce::{format_timestamp, from_serial_date, integral};
use crate::schema::CellValue;

/// Converts a worksheet cell. Whole numbers become integers since workbooks
/// store every number as a float. Date cells become RFC 3339 text and error
/// cells are empty.
fn cell_value(cell: &Data) -> CellValue {
    match cell {
        Data::Empty | Data::Error(_) => CellValue::Null,
        Data::Bool(b) => CellValue::Bool(*b),
        Data::Int(i) => CellValue::Integer(*i),
        Data::Float(f) => integral(*f).map_or(CellValue::Float(*f), CellValue::Integer),
        Data::String(s) if s.trim().is_empty() => CellValue::Null,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::DateTime(dt) if dt.is_datetime() => from_serial_date(dt.as_f64())
            .map_or(CellValue::Float(dt.as_f64()), |ts| {
                CellValue::Text(format_timestamp(ts))
            }),
        Data::DateTime(dt) => CellValue::Float(dt.as_f64()),
        other => CellValue::Text(other.to_string()),
    }
}

/// Reads the first worksheet of a workbook. Its first row is the header and
/// rows with only empty cells are skipped.
pub(super) fn parse_workbook(bytes: Vec<u8>) -> Result<Vec<Row>, IngestError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|e| IngestError::invalid_upload(format!("unreadable workbook: {e}")))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| IngestError::invalid_upload("the workbook has no worksheet"))?
        .map_err(|e| IngestError::invalid_upload(format!("unreadable worksheet: {e}")))?;

    let mut lines = range.rows();
    let headers: Vec<String> = lines
        .next()
        .map(|cells| cells.iter().map(|c| c.to_string().trim().to_string()).collect())
        .unwrap_or_default();
    validate_headers(&headers)?;

    Ok(lines
        .filter_map(|cells| keyed_row(&headers, cells.iter().map(cell_value)))
        .collect())
}
