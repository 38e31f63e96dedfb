use actix_multipart::{Field, Multipart};
use actix_web::{web, HttpResponse};
use futures_util::StreamExt;
use log::{debug, warn};

use super::import::{run_import, success};
use super::workbook::parse_workbook;
use crate::config::Config;
use crate::db::Database;
use crate::error::IngestError;
use crate::ingest::{ImportRequest, Row};
use crate::schema::CellValue;

const DELIMITERS: [u8; 4] = [b',', b';', b'\t', b'|'];

/// Accepted upload formats, by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileKind {
    Csv,
    Workbook,
}

impl FileKind {
    fn from_filename(filename: &str) -> Option<Self> {
        let lowered = filename.to_ascii_lowercase();
        match lowered.rsplit_once('.').map(|(_, extension)| extension) {
            Some("csv") => Some(FileKind::Csv),
            Some("xlsx" | "xls") => Some(FileKind::Workbook),
            _ => None,
        }
    }

    fn parse(self, bytes: Vec<u8>) -> Result<Vec<Row>, IngestError> {
        match self {
            FileKind::Csv => parse_csv(&bytes),
            FileKind::Workbook => parse_workbook(bytes),
        }
    }
}

struct Upload {
    display_name: String,
    kind: FileKind,
    bytes: Vec<u8>,
}

/// HTTP handler for `POST /api/sheets/import/file`.
///
/// Expects a multipart form with a `displayName` text field and a `file` field
/// holding the sheet as `.csv`, `.xlsx` or `.xls`. The first line (or the
/// first row of the first worksheet) is the header. The rows then go through
/// the same import as the JSON endpoint and the response has the same shape.
pub(crate) async fn process(
    db: web::Data<Database>,
    config: web::Data<Config>,
    payload: Multipart,
) -> Result<HttpResponse, IngestError> {
    let request = read_request(payload, config.payload_limit)
        .await
        .inspect_err(|e| {
            if let IngestError::InvalidInput(_, reason) = e {
                warn!("rejected sheet upload: {reason}");
            }
        })?;
    let outcome = run_import(db, request).await?;
    Ok(success(outcome))
}

async fn read_field(field: &mut Field, limit: usize) -> Result<Vec<u8>, IngestError> {
    let mut bytes = Vec::new();
    while let Some(chunk) = field.next().await {
        let chunk = chunk.map_err(|e| IngestError::invalid_upload(e.to_string()))?;
        if bytes.len() + chunk.len() > limit {
            return Err(IngestError::invalid_upload(format!(
                "upload exceeds {limit} bytes"
            )));
        }
        bytes.extend_from_slice(&chunk);
    }
    Ok(bytes)
}

async fn read_upload(mut payload: Multipart, limit: usize) -> Result<Upload, IngestError> {
    let mut display_name: Option<String> = None;
    let mut file: Option<(FileKind, Vec<u8>)> = None;

    while let Some(item) = payload.next().await {
        let mut field = item.map_err(|e| IngestError::invalid_upload(e.to_string()))?;
        let field_name = field
            .content_disposition()
            .and_then(|cd| cd.get_name().map(|n| n.to_string()));

        match field_name.as_deref() {
            Some("displayName") => {
                let bytes = read_field(&mut field, limit).await?;
                let name = String::from_utf8(bytes)
                    .map_err(|_| IngestError::invalid_upload("displayName is not valid UTF-8"))?;
                display_name = Some(name);
            }
            Some("file") => {
                let filename = field
                    .content_disposition()
                    .and_then(|cd| cd.get_filename().map(|f| f.to_string()))
                    .unwrap_or_default();
                let kind = FileKind::from_filename(&filename).ok_or_else(|| {
                    IngestError::invalid_upload(format!(
                        "'{filename}' is not a .csv, .xlsx or .xls file"
                    ))
                })?;
                file = Some((kind, read_field(&mut field, limit).await?));
            }
            _ => {
                read_field(&mut field, limit).await?;
            }
        }
    }

    let display_name = display_name
        .filter(|name| !name.trim().is_empty())
        .ok_or_else(|| IngestError::invalid_upload("displayName is missing"))?;
    let (kind, bytes) = file.ok_or_else(|| IngestError::invalid_upload("file is missing"))?;
    Ok(Upload {
        display_name,
        kind,
        bytes,
    })
}

async fn read_request(payload: Multipart, limit: usize) -> Result<ImportRequest, IngestError> {
    let upload = read_upload(payload, limit).await?;
    let kind = upload.kind;
    debug!("parsing {kind:?} upload of {} bytes", upload.bytes.len());

    let rows = tokio::task::spawn_blocking(move || kind.parse(upload.bytes))
        .await
        .map_err(|e| IngestError::Unexpected(format!("join error: {}", e)))??;
    if rows.is_empty() {
        return Err(IngestError::invalid_upload("the file has no data rows"));
    }
    ImportRequest::new(&upload.display_name, rows)
}

/// Picks the delimiter that occurs most often in the header line. Ties go to
/// the earlier candidate, and a header without any candidate is comma-separated.
fn detect_delimiter(header_line: &str) -> u8 {
    let mut best = (b',', 0);
    for delimiter in DELIMITERS {
        let count = header_line.bytes().filter(|b| *b == delimiter).count();
        if count > best.1 {
            best = (delimiter, count);
        }
    }
    best.0
}

/// Header cells must not be empty.
pub(super) fn validate_headers(headers: &[String]) -> Result<(), IngestError> {
    if headers.is_empty() {
        return Err(IngestError::invalid_upload("the file has no header"));
    }
    if let Some(position) = headers.iter().position(|h| h.is_empty()) {
        return Err(IngestError::invalid_upload(format!(
            "header cell {} is empty",
            position + 1
        )));
    }
    Ok(())
}

/// Keys one line of cells by header. Lines with only empty cells give `None`.
pub(super) fn keyed_row(headers: &[String], cells: impl Iterator<Item = CellValue>) -> Option<Row> {
    let row: Row = headers.iter().cloned().zip(cells).collect();
    (!row.iter().all(|(_, cell)| cell.is_null())).then_some(row)
}

/// Parses CSV text into rows keyed by header. Blank lines and rows with only
/// empty cells are skipped.
fn parse_csv(bytes: &[u8]) -> Result<Vec<Row>, IngestError> {
    let text = std::str::from_utf8(bytes)
        .map_err(|_| IngestError::invalid_upload("the file is not valid UTF-8"))?;
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let delimiter = detect_delimiter(text.lines().next().unwrap_or_default());

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .from_reader(text.as_bytes());
    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| IngestError::invalid_upload(e.to_string()))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    validate_headers(&headers)?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| IngestError::invalid_upload(e.to_string()))?;
        rows.extend(keyed_row(&headers, record.iter().map(CellValue::from_csv_field)));
    }
    Ok(rows)
}
