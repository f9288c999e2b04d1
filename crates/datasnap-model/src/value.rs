//! Scalar values, records and tables.
//!
//! A [`Record`] maps column names to [`Value`]s. An absent key and
//! [`Value::Null`] both mean "missing"; so does the empty string.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::{NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::types::NativeType;

/// One row: column name to scalar value.
pub type Record = BTreeMap<String, Value>;

/// An ordered sequence of records. The column set is the union of the keys.
pub type Table = Vec<Record>;

/// A single cell value.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Missing value.
    #[default]
    Null,
    /// Native boolean.
    Bool(bool),
    /// Native number (always stored as `f64`).
    Number(f64),
    /// Text.
    String(String),
    /// Native date or timestamp.
    Date(NaiveDateTime),
}

impl Value {
    /// Build a string value.
    pub fn text(value: impl Into<String>) -> Self {
        Self::String(value.into())
    }

    /// True for `Null` and for the empty string.
    pub fn is_missing(&self) -> bool {
        match self {
            Value::Null => true,
            Value::String(s) => s.is_empty(),
            _ => false,
        }
    }

    /// Borrow the text of a string value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric reading of the value.
    ///
    /// Numbers pass through, strings are trimmed and parsed. Only finite
    /// results are returned; booleans and dates are not numeric.
    pub fn as_f64(&self) -> Option<f64> {
        let parsed = match self {
            Value::Number(n) => Some(*n),
            Value::String(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    trimmed.parse::<f64>().ok()
                }
            }
            _ => None,
        };
        parsed.filter(|n| n.is_finite())
    }

    /// Runtime type of the value, independent of any inference.
    pub fn native_type(&self) -> NativeType {
        match self {
            Value::Null => NativeType::Unknown,
            Value::Bool(_) => NativeType::Boolean,
            Value::Number(_) => NativeType::Number,
            Value::String(_) => NativeType::String,
            Value::Date(_) => NativeType::Date,
        }
    }

    /// String coercion used for display, hashing of categories and regex tests.
    pub fn to_display_string(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => format_numeric(*n),
            Value::String(s) => s.clone(),
            Value::Date(dt) => {
                if dt.time() == NaiveTime::MIN {
                    dt.format("%Y-%m-%d").to_string()
                } else {
                    dt.format("%Y-%m-%dT%H:%M:%S").to_string()
                }
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_display_string())
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Number(value as f64)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(value: NaiveDateTime) -> Self {
        Value::Date(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

/// Union of the column names of all rows, in first-seen order.
pub fn table_columns(rows: &[Record]) -> Vec<String> {
    let mut seen = BTreeSet::new();
    let mut columns = Vec::new();
    for row in rows {
        for key in row.keys() {
            if seen.insert(key.as_str()) {
                columns.push(key.clone());
            }
        }
    }
    columns
}

/// Formats a floating-point number as a string without trailing zeros after decimal.
///
/// Integer-valued floats like 40.0 are formatted as "40", not "4".
///
/// # Examples
///
/// ```
/// use datasnap_model::format_numeric;
///
/// assert_eq!(format_numeric(1.0), "1");
/// assert_eq!(format_numeric(1.50), "1.5");
/// assert_eq!(format_numeric(40.0), "40");
/// assert_eq!(format_numeric(-0.25), "-0.25");
/// ```
pub fn format_numeric(v: f64) -> String {
    let s = format!("{v}");
    if s.contains('.') {
        let trimmed = s.trim_end_matches('0').trim_end_matches('.');
        if trimmed.is_empty() || trimmed == "-" {
            "0".to_string()
        } else {
            trimmed.to_string()
        }
    } else {
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_missing_values() {
        assert!(Value::Null.is_missing());
        assert!(Value::text("").is_missing());
        assert!(!Value::text(" ").is_missing());
        assert!(!Value::Number(0.0).is_missing());
    }

    #[test]
    fn test_as_f64_trims_and_rejects_non_finite() {
        assert_eq!(Value::text(" 42 ").as_f64(), Some(42.0));
        assert_eq!(Value::text("inf").as_f64(), None);
        assert_eq!(Value::Number(f64::NAN).as_f64(), None);
        assert_eq!(Value::Bool(true).as_f64(), None);
    }

    #[test]
    fn test_display_string() {
        assert_eq!(Value::Number(3.0).to_display_string(), "3");
        assert_eq!(Value::Bool(false).to_display_string(), "false");
        let date = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(Value::Date(date).to_display_string(), "2024-03-01");
    }

    #[test]
    fn test_table_columns_union() {
        let mut a = Record::new();
        a.insert("b".into(), Value::Null);
        a.insert("a".into(), Value::Null);
        let mut b = Record::new();
        b.insert("c".into(), Value::Null);
        b.insert("a".into(), Value::Null);
        assert_eq!(table_columns(&[a, b]), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_untagged_serialization() {
        let mut row = Record::new();
        row.insert("n".into(), Value::Number(1.5));
        row.insert("s".into(), Value::text("x"));
        row.insert("z".into(), Value::Null);
        let json = serde_json::to_string(&row).unwrap();
        assert_eq!(json, r#"{"n":1.5,"s":"x","z":null}"#);
    }
}
