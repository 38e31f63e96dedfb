use serde::{Deserialize, Serialize};

/// A row of the sheet registry: one dynamically created table and the name the
/// user gave it when importing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetRegistryEntry {
    pub display_name: String,
    /// Sanitized identifier of the created table. Unique across the registry.
    pub table_name: String,
    /// Creation time as stored by the database (RFC 3339, UTC). `None` before
    /// the entry has been persisted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl SheetRegistryEntry {
    pub fn new(display_name: impl Into<String>, table_name: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            table_name: table_name.into(),
            created_at: None,
        }
    }
}
