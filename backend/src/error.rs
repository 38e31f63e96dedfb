//! Error types surfaced over HTTP.
//!
//! Every failure becomes a JSON body `{ "error": ..., "details": ... }`. The
//! `error` text is fixed per failure kind; `details` carries the underlying
//! database message when there is one.

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use common::responses::ErrorResponse;
use log::error;

use crate::db::BackendError;
use crate::ingest::InsertError;

pub const INVALID_IMPORT_INPUT: &str =
    "Invalid input: sheetDisplayName and jsonData (array with content) are required.";
pub const INVALID_UPLOAD_INPUT: &str =
    "Invalid input: displayName and a .csv, .xlsx or .xls file with at least one data row are required.";

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// The request was rejected before anything was written. The first field
    /// is the client-facing message, the second the specific reason.
    #[error("{0}")]
    InvalidInput(&'static str, String),

    #[error("Failed to create table.")]
    CreateTable(#[source] BackendError),

    #[error("Failed to insert data into new table.")]
    InsertRows(#[source] InsertError),

    #[error("Failed to save sheet metadata.")]
    SaveRegistry(#[source] BackendError),

    #[error("An unexpected error occurred.")]
    Unexpected(String),
}

impl IngestError {
    pub fn invalid_import(reason: impl Into<String>) -> Self {
        IngestError::InvalidInput(INVALID_IMPORT_INPUT, reason.into())
    }

    pub fn invalid_upload(reason: impl Into<String>) -> Self {
        IngestError::InvalidInput(INVALID_UPLOAD_INPUT, reason.into())
    }

    pub fn details(&self) -> Option<String> {
        match self {
            IngestError::InvalidInput(..) => None,
            IngestError::CreateTable(e) | IngestError::SaveRegistry(e) => Some(e.to_string()),
            IngestError::InsertRows(e) => Some(e.to_string()),
            IngestError::Unexpected(details) => Some(details.clone()),
        }
    }
}

impl ResponseError for IngestError {
    fn status_code(&self) -> StatusCode {
        match self {
            IngestError::InvalidInput(..) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorResponse {
            error: self.to_string(),
            details: self.details(),
        })
    }
}

/// Errors of the read-only sheet endpoints (listing, rows, export).
#[derive(Debug, thiserror::Error)]
pub enum SheetError {
    #[error("Sheet not found.")]
    NotFound(String),

    #[error("Failed to read sheet data.")]
    Backend(#[from] BackendError),

    #[error("An unexpected error occurred.")]
    Unexpected(String),
}

impl From<rusqlite::Error> for SheetError {
    fn from(e: rusqlite::Error) -> Self {
        SheetError::Backend(BackendError::from(e))
    }
}

impl ResponseError for SheetError {
    fn status_code(&self) -> StatusCode {
        match self {
            SheetError::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let details = match self {
            SheetError::NotFound(table) => Some(format!("no sheet is registered as '{table}'")),
            SheetError::Backend(e) => Some(e.to_string()),
            SheetError::Unexpected(details) => Some(details.clone()),
        };
        if !matches!(self, SheetError::NotFound(_)) {
            error!("{self}: {}", details.as_deref().unwrap_or_default());
        }
        HttpResponse::build(self.status_code()).json(ErrorResponse {
            error: self.to_string(),
            details,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    async fn body_of(err: &dyn ResponseError) -> ErrorResponse {
        let bytes = to_bytes(err.error_response().into_body()).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[actix_web::test]
    async fn invalid_input_has_no_details() {
        let err = IngestError::invalid_import("jsonData is empty");
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        let body = body_of(&err).await;
        assert_eq!(body.error, INVALID_IMPORT_INPUT);
        assert!(body.details.is_none());
    }

    #[actix_web::test]
    async fn backend_failures_carry_the_database_message() {
        let cause = rusqlite::Connection::open_in_memory()
            .unwrap()
            .execute_batch("CREATE TABLE t (a); CREATE TABLE t (a);")
            .unwrap_err();
        let err = IngestError::CreateTable(cause.into());
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_of(&err).await;
        assert_eq!(body.error, "Failed to create table.");
        assert!(body.details.unwrap().contains("already exists"));
    }

    #[actix_web::test]
    async fn missing_sheet_is_404() {
        let err = SheetError::NotFound("lathe".into());
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(body_of(&err).await.error, "Sheet not found.");
    }
}
