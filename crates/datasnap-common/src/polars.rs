//! Polars interop.
//!
//! Converts between Polars `DataFrame`s and the row-set [`Table`] model, and
//! provides helpers for working with `AnyValue`.

use chrono::{DateTime, NaiveDate};
use datasnap_model::{Record, Table, Value, format_numeric};
use polars::prelude::*;

use crate::error::Result;

/// Converts a Polars `AnyValue` to a row-set [`Value`].
///
/// Integers and floats become numbers, booleans stay booleans, dates and
/// datetimes become [`Value::Date`]. Anything else is kept as its text.
pub fn any_to_value(value: AnyValue<'_>) -> Value {
    match value {
        AnyValue::Null => Value::Null,
        AnyValue::Boolean(b) => Value::Bool(b),
        AnyValue::Int8(v) => Value::Number(f64::from(v)),
        AnyValue::Int16(v) => Value::Number(f64::from(v)),
        AnyValue::Int32(v) => Value::Number(f64::from(v)),
        AnyValue::Int64(v) => Value::Number(v as f64),
        AnyValue::UInt8(v) => Value::Number(f64::from(v)),
        AnyValue::UInt16(v) => Value::Number(f64::from(v)),
        AnyValue::UInt32(v) => Value::Number(f64::from(v)),
        AnyValue::UInt64(v) => Value::Number(v as f64),
        AnyValue::Float32(v) => Value::Number(f64::from(v)),
        AnyValue::Float64(v) => Value::Number(v),
        AnyValue::String(s) => Value::String(s.to_string()),
        AnyValue::StringOwned(s) => Value::String(s.to_string()),
        AnyValue::Date(days) => NaiveDate::from_ymd_opt(1970, 1, 1)
            .and_then(|epoch| epoch.checked_add_signed(chrono::Duration::days(i64::from(days))))
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map_or(Value::Null, Value::Date),
        AnyValue::Datetime(v, unit, _) => {
            let parsed = match unit {
                TimeUnit::Milliseconds => DateTime::from_timestamp_millis(v),
                TimeUnit::Microseconds => DateTime::from_timestamp_micros(v),
                TimeUnit::Nanoseconds => Some(DateTime::from_timestamp_nanos(v)),
            };
            parsed.map_or(Value::Null, |dt| Value::Date(dt.naive_utc()))
        }
        other => Value::String(any_to_string(other)),
    }
}

/// Converts a Polars `AnyValue` to a `String` representation.
///
/// Returns an empty string for `Null` and formats numbers without trailing
/// zeros.
///
/// # Examples
///
/// ```
/// use polars::prelude::AnyValue;
/// use datasnap_common::any_to_string;
///
/// assert_eq!(any_to_string(AnyValue::Null), "");
/// assert_eq!(any_to_string(AnyValue::Int32(42)), "42");
/// assert_eq!(any_to_string(AnyValue::Float64(2.50)), "2.5");
/// ```
pub fn any_to_string(value: AnyValue<'_>) -> String {
    match value {
        AnyValue::Null => String::new(),
        AnyValue::Float32(v) => format_numeric(f64::from(v)),
        AnyValue::Float64(v) => format_numeric(v),
        AnyValue::String(s) => s.to_string(),
        AnyValue::StringOwned(s) => s.to_string(),
        AnyValue::Boolean(b) => b.to_string(),
        other => {
            let s = other.to_string();
            // Strip surrounding quotes that might come from formatting
            if s.starts_with('"') && s.ends_with('"') && s.len() >= 2 {
                s[1..s.len() - 1].to_string()
            } else {
                s
            }
        }
    }
}

/// Converts a `DataFrame` into a row-set table.
///
/// Every record carries every column of the frame; null cells become
/// [`Value::Null`].
pub fn dataframe_to_table(df: &DataFrame) -> Result<Table> {
    let height = df.height();
    let mut rows: Table = vec![Record::new(); height];
    for column in df.get_columns() {
        let name = column.name().to_string();
        for (idx, row) in rows.iter_mut().enumerate() {
            row.insert(name.clone(), any_to_value(column.get(idx)?));
        }
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_any_to_value_numbers() {
        assert_eq!(any_to_value(AnyValue::Int32(42)), Value::Number(42.0));
        assert_eq!(any_to_value(AnyValue::Float64(1.5)), Value::Number(1.5));
        assert_eq!(any_to_value(AnyValue::Null), Value::Null);
    }

    #[test]
    fn test_any_to_value_strings_and_bools() {
        assert_eq!(any_to_value(AnyValue::String("x")), Value::text("x"));
        assert_eq!(any_to_value(AnyValue::Boolean(true)), Value::Bool(true));
    }

    #[test]
    fn test_any_to_string_boolean() {
        assert_eq!(any_to_string(AnyValue::Boolean(true)), "true");
    }

    #[test]
    fn test_dataframe_to_table() {
        let df = df! {
            "id" => &[1i64, 2],
            "name" => &["Ada", "Linus"],
        }
        .unwrap();
        let table = dataframe_to_table(&df).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table[0]["id"], Value::Number(1.0));
        assert_eq!(table[1]["name"], Value::text("Linus"));
    }

    #[test]
    fn test_dataframe_to_table_keeps_null_cells() {
        let df = df! {
            "a" => &[Some("1"), Some("2")],
            "b" => &[None::<&str>, Some("x")],
        }
        .unwrap();
        let table = dataframe_to_table(&df).unwrap();
        assert_eq!(table[0]["b"], Value::Null);
        assert_eq!(table[1]["b"], Value::text("x"));
    }
}
