use serde_json::Value;
use std::fmt;

/// A single spreadsheet cell. Only scalars are representable.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

/// A JSON value that is not a spreadsheet scalar (array or object).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("cell '{0}' is not a scalar value")]
pub struct NotScalar(pub String);

impl CellValue {
    /// Converts a JSON cell from the import payload.
    pub fn from_json(key: &str, value: &Value) -> Result<Self, NotScalar> {
        match value {
            Value::Null => Ok(CellValue::Null),
            Value::Bool(b) => Ok(CellValue::Bool(*b)),
            Value::Number(n) => Ok(match n.as_i64() {
                Some(i) => CellValue::Integer(i),
                None => CellValue::Float(n.as_f64().unwrap_or(f64::NAN)),
            }),
            Value::String(s) => Ok(CellValue::Text(s.clone())),
            Value::Array(_) | Value::Object(_) => Err(NotScalar(key.to_string())),
        }
    }

    /// Reads a CSV field the way a spreadsheet parser types cells: empty is
    /// null, `true`/`false` are booleans, numbers are numbers, anything else is
    /// text.
    pub fn from_csv_field(field: &str) -> Self {
        let trimmed = field.trim();
        if trimmed.is_empty() {
            return CellValue::Null;
        }
        if trimmed.eq_ignore_ascii_case("true") {
            return CellValue::Bool(true);
        }
        if trimmed.eq_ignore_ascii_case("false") {
            return CellValue::Bool(false);
        }
        if let Ok(i) = trimmed.parse::<i64>() {
            return CellValue::Integer(i);
        }
        match trimmed.parse::<f64>() {
            Ok(f) if f.is_finite() => CellValue::Float(f),
            _ => CellValue::Text(field.to_string()),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Null => Ok(()),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(x) => write!(f, "{x}"),
            CellValue::Text(s) => f.write_str(s),
        }
    }
}
