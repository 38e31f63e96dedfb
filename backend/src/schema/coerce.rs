use super::cell::CellValue;
use super::infer::parse_date;
use super::SqlType;
use chrono::{DateTime, Duration, NaiveDate, SecondsFormat, Utc};
use rusqlite::types::Value;

/// Largest spreadsheet serial day number (9999-12-31).
const MAX_SERIAL_DAY: f64 = 2_958_465.0;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("invalid input value for type {expected}: \"{value}\"")]
pub struct CoerceError {
    pub value: String,
    pub expected: SqlType,
}

fn reject(value: &CellValue, expected: SqlType) -> CoerceError {
    CoerceError {
        value: value.to_string(),
        expected,
    }
}

/// Storage form of timestamps: RFC 3339 in UTC.
pub fn format_timestamp(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Converts a spreadsheet serial date (days since 1899-12-30, fraction is the
/// time of day) to a UTC timestamp.
pub fn from_serial_date(serial: f64) -> Option<DateTime<Utc>> {
    if !serial.is_finite() || !(0.0..=MAX_SERIAL_DAY).contains(&serial) {
        return None;
    }
    let days = serial.trunc() as i64;
    let seconds = ((serial - serial.trunc()) * 86_400.0).round() as i64;
    // Lotus 1-2-3 treated 1900 as a leap year, so serials before March 1900 are off by one.
    let days = if days < 60 { days + 1 } else { days };
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let naive = epoch + Duration::days(days) + Duration::seconds(seconds);
    Some(naive.and_utc())
}

fn parse_boolean(text: &str) -> Option<bool> {
    match text.trim().to_ascii_lowercase().as_str() {
        "true" | "t" | "yes" | "y" | "on" | "1" => Some(true),
        "false" | "f" | "no" | "n" | "off" | "0" => Some(false),
        _ => None,
    }
}

pub(crate) fn integral(f: f64) -> Option<i64> {
    (f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64).then_some(f as i64)
}

/// Converts a cell to the value stored in a column of type `target`.
pub fn coerce(value: &CellValue, target: SqlType) -> Result<Value, CoerceError> {
    if value.is_null() {
        return Ok(Value::Null);
    }
    let converted = match (target, value) {
        (SqlType::UuidPrimaryKey, CellValue::Text(s)) => uuid::Uuid::parse_str(s.trim())
            .ok()
            .map(|id| Value::Text(id.hyphenated().to_string())),

        (SqlType::Integer, CellValue::Integer(i)) => Some(Value::Integer(*i)),
        (SqlType::Integer, CellValue::Float(f)) => integral(*f).map(Value::Integer),
        (SqlType::Integer, CellValue::Text(s)) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(integral))
                .map(Value::Integer)
        }

        (SqlType::Numeric, CellValue::Integer(i)) => Some(Value::Integer(*i)),
        (SqlType::Numeric, CellValue::Float(f)) => f.is_finite().then_some(Value::Real(*f)),
        (SqlType::Numeric, CellValue::Text(s)) => {
            let s = s.trim();
            match s.parse::<i64>() {
                Ok(i) => Some(Value::Integer(i)),
                Err(_) => s
                    .parse::<f64>()
                    .ok()
                    .filter(|f| f.is_finite())
                    .map(Value::Real),
            }
        }

        (SqlType::Boolean, CellValue::Bool(b)) => Some(Value::Integer(i64::from(*b))),
        (SqlType::Boolean, CellValue::Text(s)) => {
            parse_boolean(s).map(|b| Value::Integer(i64::from(b)))
        }

        (SqlType::Timestamp, CellValue::Text(s)) => {
            parse_date(s).map(|dt| Value::Text(format_timestamp(dt)))
        }
        (SqlType::Timestamp, CellValue::Integer(i)) => {
            from_serial_date(*i as f64).map(|dt| Value::Text(format_timestamp(dt)))
        }
        (SqlType::Timestamp, CellValue::Float(f)) => {
            from_serial_date(*f).map(|dt| Value::Text(format_timestamp(dt)))
        }

        (SqlType::Text, CellValue::Text(s)) => Some(Value::Text(s.clone())),
        (SqlType::Text, other) => Some(Value::Text(other.to_string())),

        _ => None,
    };
    converted.ok_or_else(|| reject(value, target))
}
