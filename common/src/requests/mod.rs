use serde::Deserialize;
use serde_json::{Map, Value};

/// A spreadsheet row as sent by the client: header text mapped to the cell
/// value. Key order follows the spreadsheet's column order.
pub type RawRow = Map<String, Value>;

/// Request payload for `POST /api/sheets/import`.
///
/// Both fields are optional at the serde level so that a missing field is
/// reported as invalid input instead of a deserialization failure.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSheetRequest {
    pub sheet_display_name: Option<String>,
    pub json_data: Option<Vec<RawRow>>,
}
