//! Loosely-typed cell values
//!
//! Callers hand the service string-keyed, heterogeneous JSON rows and
//! parameter maps. Everything is normalised into [`CellValue`] before it
//! reaches a template, so the engine never sees raw JSON.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Format used when a date is rendered as text
pub const DATE_TEXT_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// The kind of a column, inferred from the first row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    Text,
    Integer,
    Number,
    Decimal,
    Date,
    Boolean,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Text => "text",
            ValueKind::Integer => "integer",
            ValueKind::Number => "number",
            ValueKind::Decimal => "decimal",
            ValueKind::Date => "date",
            ValueKind::Boolean => "boolean",
        };
        f.write_str(name)
    }
}

/// A single typed value (or null) in a row or parameter set
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    #[default]
    Null,
    Text(String),
    Integer(i64),
    Number(f64),
    Decimal(Decimal),
    Date(NaiveDateTime),
    Boolean(bool),
}

impl CellValue {
    /// Kind of this value, `None` for null
    pub fn kind(&self) -> Option<ValueKind> {
        match self {
            CellValue::Null => None,
            CellValue::Text(_) => Some(ValueKind::Text),
            CellValue::Integer(_) => Some(ValueKind::Integer),
            CellValue::Number(_) => Some(ValueKind::Number),
            CellValue::Decimal(_) => Some(ValueKind::Decimal),
            CellValue::Date(_) => Some(ValueKind::Date),
            CellValue::Boolean(_) => Some(ValueKind::Boolean),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// Convert a JSON value as received from a caller.
    ///
    /// Integers stay integers, other numbers become [`CellValue::Number`],
    /// ISO-8601 date strings become dates, and nested arrays/objects are
    /// carried as their JSON text.
    pub fn from_json(json: &serde_json::Value) -> Self {
        match Self::from_json_literal(json) {
            CellValue::Text(s) => match parse_date_text(&s) {
                Some(date) => CellValue::Date(date),
                None => CellValue::Text(s),
            },
            other => other,
        }
    }

    /// Like [`CellValue::from_json`], but strings always stay text
    pub fn from_json_literal(json: &serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => CellValue::Null,
            serde_json::Value::Bool(b) => CellValue::Boolean(*b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    CellValue::Integer(i)
                } else if let Some(u) = n.as_u64() {
                    CellValue::Decimal(Decimal::from(u))
                } else {
                    CellValue::Number(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            serde_json::Value::String(s) => CellValue::Text(s.clone()),
            other => CellValue::Text(other.to_string()),
        }
    }

    /// Convert back to JSON. Decimals and dates are emitted as strings.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            CellValue::Null => serde_json::Value::Null,
            CellValue::Text(s) => serde_json::Value::String(s.clone()),
            CellValue::Integer(i) => serde_json::Value::from(*i),
            CellValue::Number(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            CellValue::Decimal(d) => serde_json::Value::String(d.to_string()),
            CellValue::Date(d) => serde_json::Value::String(d.format(DATE_TEXT_FORMAT).to_string()),
            CellValue::Boolean(b) => serde_json::Value::Bool(*b),
        }
    }

    /// Numeric view of integer, number and decimal values
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Integer(i) => Some(*i as f64),
            CellValue::Number(f) => Some(*f),
            CellValue::Decimal(d) => d.to_f64(),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDateTime> {
        match self {
            CellValue::Date(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            CellValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Null => Ok(()),
            CellValue::Text(s) => f.write_str(s),
            CellValue::Integer(i) => write!(f, "{}", i),
            CellValue::Number(n) => write!(f, "{}", n),
            CellValue::Decimal(d) => write!(f, "{}", d),
            CellValue::Date(d) => write!(f, "{}", d.format(DATE_TEXT_FORMAT)),
            CellValue::Boolean(b) => write!(f, "{}", b),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

impl From<i64> for CellValue {
    fn from(i: i64) -> Self {
        CellValue::Integer(i)
    }
}

impl From<i32> for CellValue {
    fn from(i: i32) -> Self {
        CellValue::Integer(i.into())
    }
}

impl From<f64> for CellValue {
    fn from(f: f64) -> Self {
        CellValue::Number(f)
    }
}

impl From<Decimal> for CellValue {
    fn from(d: Decimal) -> Self {
        CellValue::Decimal(d)
    }
}

impl From<NaiveDateTime> for CellValue {
    fn from(d: NaiveDateTime) -> Self {
        CellValue::Date(d)
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Boolean(b)
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(CellValue::Null)
    }
}

impl Serialize for CellValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for CellValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let json = serde_json::Value::deserialize(deserializer)?;
        Ok(CellValue::from_json(&json))
    }
}

/// Parse ISO-8601 date or date-time text.
///
/// Accepts `YYYY-MM-DD`, `YYYY-MM-DDTHH:MM:SS[.fff]` and RFC 3339 with a
/// zone designator. Zoned values keep the clock time as written.
pub fn parse_date_text(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    let bytes = text.as_bytes();
    if bytes.len() < 10 || !bytes[..4].iter().all(u8::is_ascii_digit) || bytes[4] != b'-' {
        return None;
    }

    if bytes.len() == 10 {
        return NaiveDate::parse_from_str(text, "%Y-%m-%d")
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0));
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_local());
    }

    NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f").ok()
}

/// Parse numeric text into a decimal, falling back to a float
pub fn parse_numeric_text(text: &str) -> Option<CellValue> {
    let text = text.trim();
    if let Ok(i) = text.parse::<i64>() {
        return Some(CellValue::Integer(i));
    }
    if let Ok(d) = Decimal::from_str(text) {
        return Some(CellValue::Decimal(d));
    }
    text.parse::<f64>()
        .ok()
        .filter(|f| f.is_finite())
        .map(CellValue::Number)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_scalars() {
        assert_eq!(CellValue::from_json(&json!(null)), CellValue::Null);
        assert_eq!(CellValue::from_json(&json!(true)), CellValue::Boolean(true));
        assert_eq!(CellValue::from_json(&json!(42)), CellValue::Integer(42));
        assert_eq!(CellValue::from_json(&json!(19.5)), CellValue::Number(19.5));
        assert_eq!(
            CellValue::from_json(&json!("John Doe")),
            CellValue::Text("John Doe".to_string())
        );
    }

    #[test]
    fn test_from_json_detects_dates() {
        let value = CellValue::from_json(&json!("2024-03-15T10:30:00"));
        assert_eq!(value.kind(), Some(ValueKind::Date));

        let value = CellValue::from_json(&json!("2024-03-15"));
        let date = value.as_date().unwrap();
        assert_eq!(date.format("%Y-%m-%d").to_string(), "2024-03-15");

        let value = CellValue::from_json(&json!("2024-03-15T10:30:00+02:00"));
        assert_eq!(
            value.as_date().unwrap().format("%H:%M").to_string(),
            "10:30"
        );
    }

    #[test]
    fn test_date_like_text_stays_text() {
        assert_eq!(
            CellValue::from_json(&json!("2024 Q1")),
            CellValue::Text("2024 Q1".to_string())
        );
        assert_eq!(
            CellValue::from_json(&json!("2024-13-45")),
            CellValue::Text("2024-13-45".to_string())
        );
    }

    #[test]
    fn test_from_json_literal_keeps_iso_text() {
        assert_eq!(
            CellValue::from_json_literal(&json!("2024-06-30")),
            CellValue::from("2024-06-30")
        );
        assert_eq!(CellValue::from_json_literal(&json!(7)), CellValue::Integer(7));
    }

    #[test]
    fn test_nested_json_carried_as_text() {
        let value = CellValue::from_json(&json!({"a": 1}));
        assert_eq!(value, CellValue::Text(r#"{"a":1}"#.to_string()));
    }

    #[test]
    fn test_parse_numeric_text() {
        assert_eq!(parse_numeric_text("12"), Some(CellValue::Integer(12)));
        assert_eq!(
            parse_numeric_text("15.50"),
            Some(CellValue::Decimal(Decimal::new(1550, 2)))
        );
        assert_eq!(parse_numeric_text("abc"), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(CellValue::Null.to_string(), "");
        assert_eq!(CellValue::Decimal(Decimal::new(3275, 2)).to_string(), "32.75");
        let date = NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(3, 4, 5)
            .unwrap();
        assert_eq!(CellValue::Date(date).to_string(), "2024-01-02T03:04:05");
    }

    #[test]
    fn test_serde_roundtrip_through_json() {
        let parsed: CellValue = serde_json::from_str("\"hello\"").unwrap();
        assert_eq!(parsed, CellValue::from("hello"));
        assert_eq!(serde_json::to_string(&CellValue::Integer(7)).unwrap(), "7");
    }
}
