use serde::{Deserialize, Serialize};

/// Body of a successful import.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSheetResponse {
    pub message: String,
    pub table_name: String,
}

/// Body of every failed request. `details` carries the underlying database
/// message when there is one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}
