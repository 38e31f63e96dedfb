//! HTTP API for sheet imports and the tables they create.
//!
//! Routes under `/api/sheets`:
//! - `POST /import`: JSON import. Body `{ sheetDisplayName, jsonData }`, where
//!   `jsonData` is the array of row objects a spreadsheet parser produces. Runs
//!   the ingestor and answers `{ message, tableName }`.
//! - `POST /import/file`: the same import from a multipart upload with a
//!   `displayName` field and a `.csv`, `.xlsx` or `.xls` `file` field.
//! - `GET /`: the sheet registry, newest first.
//! - `GET /{table_name}/rows`: rows of an imported table as JSON objects.
//! - `GET /{table_name}/export`: the same rows as a CSV download.
//!
//! Both import routes answer CORS preflight requests and reject every other
//! method with `405`. Every response carries `Access-Control-Allow-Origin: *`
//! through `cors_headers`.

use actix_web::http::Method;
use actix_web::middleware::DefaultHeaders;
use actix_web::web::{self, get, post, resource, scope};
use actix_web::{HttpResponse, Resource, Scope};
use common::responses::ErrorResponse;

mod export;
mod import;
mod list;
mod rows;
mod upload;
mod workbook;

const API_PATH: &str = "/api/sheets";

const ALLOWED_HEADERS: &str = "authorization, x-client-info, apikey, content-type";

/// Adds the CORS origin header to every response, errors included.
pub fn cors_headers() -> DefaultHeaders {
    DefaultHeaders::new().add(("Access-Control-Allow-Origin", "*"))
}

async fn preflight() -> HttpResponse {
    HttpResponse::Ok()
        .insert_header(("Access-Control-Allow-Origin", "*"))
        .insert_header(("Access-Control-Allow-Headers", ALLOWED_HEADERS))
        .insert_header(("Access-Control-Allow-Methods", "POST"))
        .body("ok")
}

async fn method_not_allowed() -> HttpResponse {
    HttpResponse::MethodNotAllowed().json(ErrorResponse {
        error: "Method Not Allowed".to_string(),
        details: None,
    })
}

/// A POST-only resource that also answers preflight requests.
fn post_endpoint(path: &str) -> Resource {
    resource(path)
        .route(web::method(Method::OPTIONS).to(preflight))
        .default_service(web::route().to(method_not_allowed))
}

/// Configures and returns the Actix scope for sheet routes.
pub fn configure_routes() -> Scope {
    scope(API_PATH)
        // Registry of imported sheets.
        .route("", get().to(list::process))
        .service(post_endpoint("/import").route(post().to(import::process)))
        .service(post_endpoint("/import/file").route(post().to(upload::process)))
        .route("/{table_name}/rows", get().to(rows::process))
        .route("/{table_name}/export", get().to(export::process))
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::config::Config;
    use crate::db::Database;
    use actix_web::web;
    use tempfile::TempDir;

    /// A database in a fresh temporary directory. Keep the `TempDir` alive
    /// for as long as the database is used.
    pub fn temp_database() -> (TempDir, web::Data<Database>) {
        let dir = tempfile::tempdir().unwrap();
        let database = Database::new(dir.path().join("sheets.sqlite"));
        database.initialize().unwrap();
        (dir, web::Data::new(database))
    }

    pub fn config() -> web::Data<Config> {
        web::Data::new(Config::default())
    }

    fn escape(text: &str) -> String {
        text.replace('&', "&amp;")
            .replace('<', "&lt;")
            .replace('>', "&gt;")
    }

    /// A string cell stored inline, e.g. `inline_string("A1", "Part Name")`.
    pub fn inline_string(cell: &str, text: &str) -> String {
        format!(
            r#"<c r="{cell}" t="inlineStr"><is><t xml:space="preserve">{}</t></is></c>"#,
            escape(text)
        )
    }

    pub fn number(cell: &str, value: &str) -> String {
        format!(r#"<c r="{cell}"><v>{value}</v></c>"#)
    }

    pub fn boolean(cell: &str, value: bool) -> String {
        format!(r#"<c r="{cell}" t="b"><v>{}</v></c>"#, u8::from(value))
    }

    /// A minimal single-sheet `.xlsx` file. Each entry of `rows` holds the cell
    /// XML of one row, starting at row 1.
    pub fn xlsx(rows: &[Vec<String>]) -> Vec<u8> {
        use std::io::{Cursor, Write};
        use zip::write::SimpleFileOptions;
        use zip::{CompressionMethod, ZipWriter};

        let sheet_data: String = rows
            .iter()
            .enumerate()
            .map(|(i, cells)| format!(r#"<row r="{}">{}</row>"#, i + 1, cells.concat()))
            .collect();
        let parts = [
            (
                "[Content_Types].xml",
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/></Types>"#
                    .to_string(),
            ),
            (
                "_rels/.rels",
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#
                    .to_string(),
            ),
            (
                "xl/workbook.xml",
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets><sheet name="Sheet1" sheetId="1" r:id="rId1"/></sheets></workbook>"#
                    .to_string(),
            ),
            (
                "xl/_rels/workbook.xml.rels",
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/></Relationships>"#
                    .to_string(),
            ),
            (
                "xl/worksheets/sheet1.xml",
                format!(
                    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>{sheet_data}</sheetData></worksheet>"#
                ),
            ),
        ];

        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
        for (name, content) in parts {
            zip.start_file(name, options).unwrap();
            zip.write_all(content.as_bytes()).unwrap();
        }
        zip.finish().unwrap().into_inner()
    }
}
