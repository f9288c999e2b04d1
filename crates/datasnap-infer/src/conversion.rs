//! Value conversion to a semantic type.

use chrono::DateTime;
use datasnap_model::{SemanticType, Value};

use crate::dates::parse_datetime;
use crate::patterns::{FLOAT_PREFIX, INTEGER_PREFIX};

const TRUE_WORDS: &[&str] = &["true", "yes", "y", "1"];
const FALSE_WORDS: &[&str] = &["false", "no", "n", "0"];

/// Convert a value to the given semantic type.
///
/// Returns `None` when the value cannot be converted. Missing values always
/// fail. Types without a dedicated conversion map to the display string.
///
/// - integer: leading integer prefix of the text, numbers truncated
/// - float: leading decimal prefix of the text
/// - boolean: `true/yes/y/1` and `false/no/n/0`, numbers by non-zero
/// - date, datetime: native dates, parsed strings, numbers as epoch millis
pub fn convert_value(value: &Value, target: SemanticType) -> Option<Value> {
    if value.is_missing() {
        return None;
    }
    match target {
        SemanticType::Integer => to_integer(value),
        SemanticType::Float => to_float(value),
        SemanticType::Boolean => to_boolean(value),
        SemanticType::Date | SemanticType::Datetime => to_datetime(value),
        _ => Some(Value::String(value.to_display_string())),
    }
}

fn to_integer(value: &Value) -> Option<Value> {
    match value {
        Value::Number(n) if n.is_finite() => Some(Value::Number(n.trunc())),
        Value::String(s) => {
            let digits = INTEGER_PREFIX.find(s.trim())?.as_str();
            match digits.parse::<i64>() {
                Ok(n) => Some(Value::from(n)),
                // Beyond i64: keep the magnitude as a whole float.
                Err(_) => digits
                    .parse::<f64>()
                    .ok()
                    .filter(|n| n.is_finite())
                    .map(|n| Value::Number(n.trunc())),
            }
        }
        _ => None,
    }
}

fn to_float(value: &Value) -> Option<Value> {
    match value {
        Value::Number(n) if n.is_finite() => Some(Value::Number(*n)),
        Value::String(s) => FLOAT_PREFIX
            .find(s.trim())
            .and_then(|m| m.as_str().parse::<f64>().ok())
            .filter(|n| n.is_finite())
            .map(Value::Number),
        _ => None,
    }
}

fn to_boolean(value: &Value) -> Option<Value> {
    match value {
        Value::Bool(b) => Some(Value::Bool(*b)),
        Value::Number(n) => Some(Value::Bool(*n != 0.0)),
        Value::String(s) => {
            let lower = s.trim().to_lowercase();
            if TRUE_WORDS.contains(&lower.as_str()) {
                Some(Value::Bool(true))
            } else if FALSE_WORDS.contains(&lower.as_str()) {
                Some(Value::Bool(false))
            } else {
                None
            }
        }
        _ => None,
    }
}

fn to_datetime(value: &Value) -> Option<Value> {
    match value {
        Value::Date(dt) => Some(Value::Date(*dt)),
        Value::String(s) => parse_datetime(s).map(Value::Date),
        Value::Number(n) if n.is_finite() => DateTime::from_timestamp_millis(*n as i64)
            .map(|dt| Value::Date(dt.naive_utc())),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_uses_leading_digits() {
        assert_eq!(
            convert_value(&Value::text("42abc"), SemanticType::Integer),
            Some(Value::Number(42.0))
        );
        assert_eq!(
            convert_value(&Value::Number(3.9), SemanticType::Integer),
            Some(Value::Number(3.0))
        );
        assert_eq!(convert_value(&Value::text("abc"), SemanticType::Integer), None);
    }

    #[test]
    fn test_integer_beyond_i64_range() {
        assert_eq!(
            convert_value(&Value::text("123456789012345678901234"), SemanticType::Integer),
            Some(Value::Number(123456789012345678901234.0))
        );
        assert_eq!(
            convert_value(&Value::text("-99999999999999999999"), SemanticType::Integer),
            Some(Value::Number(-99999999999999999999.0))
        );
    }

    #[test]
    fn test_float_prefix() {
        assert_eq!(
            convert_value(&Value::text(" 3.5kg"), SemanticType::Float),
            Some(Value::Number(3.5))
        );
        assert_eq!(convert_value(&Value::text("kg"), SemanticType::Float), None);
    }

    #[test]
    fn test_boolean_words() {
        assert_eq!(
            convert_value(&Value::text("Yes"), SemanticType::Boolean),
            Some(Value::Bool(true))
        );
        assert_eq!(
            convert_value(&Value::text(" N "), SemanticType::Boolean),
            Some(Value::Bool(false))
        );
        assert_eq!(
            convert_value(&Value::Number(2.0), SemanticType::Boolean),
            Some(Value::Bool(true))
        );
        assert_eq!(convert_value(&Value::text("maybe"), SemanticType::Boolean), None);
    }

    #[test]
    fn test_dates() {
        let converted = convert_value(&Value::text("2024-03-01"), SemanticType::Date).unwrap();
        assert_eq!(converted.to_display_string(), "2024-03-01");
        let epoch = convert_value(&Value::Number(0.0), SemanticType::Datetime).unwrap();
        assert_eq!(epoch.to_display_string(), "1970-01-01");
        assert_eq!(convert_value(&Value::text("soon"), SemanticType::Date), None);
    }

    #[test]
    fn test_missing_never_converts() {
        assert_eq!(convert_value(&Value::Null, SemanticType::String), None);
        assert_eq!(convert_value(&Value::text(""), SemanticType::String), None);
    }

    #[test]
    fn test_other_types_use_display_string() {
        assert_eq!(
            convert_value(&Value::Number(7.0), SemanticType::Email),
            Some(Value::text("7"))
        );
    }
}
