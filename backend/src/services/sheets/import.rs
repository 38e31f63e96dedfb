//! `POST /api/sheets/import`: creates a table from spreadsheet rows sent as JSON.

use actix_web::{web, HttpResponse};
use common::requests::ImportSheetRequest;
use common::responses::ImportSheetResponse;
use log::{debug, warn};

use crate::db::Database;
use crate::error::IngestError;
use crate::ingest::{ImportOutcome, ImportRequest, Ingestor};

pub const SUCCESS_MESSAGE: &str = "Sheet created and data imported successfully.";

pub(crate) async fn process(
    db: web::Data<Database>,
    body: web::Bytes,
) -> Result<HttpResponse, IngestError> {
    let request = parse_request(&body).inspect_err(|e| {
        if let IngestError::InvalidInput(_, reason) = e {
            warn!("rejected sheet import: {reason}");
        }
    })?;
    let outcome = run_import(db, request).await?;
    Ok(success(outcome))
}

/// A body that is not JSON at all is an unexpected error; JSON of the wrong
/// shape is invalid input.
fn parse_request(body: &[u8]) -> Result<ImportRequest, IngestError> {
    let value: serde_json::Value =
        serde_json::from_slice(body).map_err(|e| IngestError::Unexpected(e.to_string()))?;
    let payload: ImportSheetRequest =
        serde_json::from_value(value).map_err(|e| IngestError::invalid_import(e.to_string()))?;
    ImportRequest::from_payload(payload)
}

pub(crate) fn success(outcome: ImportOutcome) -> HttpResponse {
    HttpResponse::Ok().json(ImportSheetResponse {
        message: SUCCESS_MESSAGE.to_string(),
        table_name: outcome.table_name,
    })
}

/// Runs the ingestor on the blocking pool with its own connection.
pub(crate) async fn run_import(
    db: web::Data<Database>,
    request: ImportRequest,
) -> Result<ImportOutcome, IngestError> {
    let database = db.get_ref().clone();
    tokio::task::spawn_blocking(move || -> Result<ImportOutcome, IngestError> {
        let mut backend = database
            .backend()
            .map_err(|e| IngestError::Unexpected(e.to_string()))?;
        Ingestor::new(&mut backend).run(&request)
    })
    .await
    .map_err(|e| IngestError::Unexpected(format!("join error: {}", e)))?
    .inspect(|outcome| {
        debug!(
            "{} rows stored in {}",
            outcome.rows_inserted, outcome.table_name
        )
    })
}
