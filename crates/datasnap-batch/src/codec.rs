//! CSV and JSON text import/export for row sets.

use std::fmt;

use datasnap_model::{Record, Table, Value, table_columns};
use serde::{Deserialize, Serialize};

use crate::error::{BatchError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataFormat {
    Csv,
    Json,
}

impl DataFormat {
    /// Parse a format name or file extension.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().trim_start_matches('.').to_lowercase().as_str() {
            "csv" => Some(Self::Csv),
            "json" => Some(Self::Json),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
        }
    }
}

impl fmt::Display for DataFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parse rows from text.
///
/// CSV needs a header row; every cell is read as text and empty cells are
/// kept as empty strings. JSON must be an array of flat objects.
pub fn import_rows(text: &str, format: DataFormat) -> Result<Table> {
    match format {
        DataFormat::Csv => import_csv(text),
        DataFormat::Json => Ok(serde_json::from_str(text)?),
    }
}

fn import_csv(text: &str) -> Result<Table> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::Headers)
        .from_reader(text.as_bytes());
    let headers = reader.headers()?.clone();
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let row: Record = headers
            .iter()
            .zip(record.iter())
            .map(|(h, v)| (h.to_string(), Value::text(v)))
            .collect();
        rows.push(row);
    }
    Ok(rows)
}

/// Serialize rows to text.
///
/// CSV columns are the union of keys in first-seen order; missing values are
/// written as empty cells.
pub fn export_rows(rows: &[Record], format: DataFormat) -> Result<String> {
    match format {
        DataFormat::Csv => export_csv(rows),
        DataFormat::Json => Ok(serde_json::to_string_pretty(rows)?),
    }
}

fn export_csv(rows: &[Record]) -> Result<String> {
    let columns = table_columns(rows);
    let mut writer = csv::Writer::from_writer(Vec::new());
    if !columns.is_empty() {
        writer.write_record(&columns)?;
    }
    for row in rows {
        writer.write_record(
            columns
                .iter()
                .map(|c| row.get(c).map(Value::to_display_string).unwrap_or_default()),
        )?;
    }
    let bytes = writer.into_inner().map_err(|e| BatchError::Codec {
        format: "csv",
        message: e.to_string(),
    })?;
    String::from_utf8(bytes).map_err(|e| BatchError::Codec {
        format: "csv",
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csv_import() {
        let rows = import_rows("name, age\nAda,36\nAlan,\n", DataFormat::Csv).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["age"], Value::text("36"));
        assert!(rows[1]["age"].is_missing());
    }

    #[test]
    fn test_json_import_keeps_native_types() {
        let rows = import_rows(r#"[{"a": 1, "b": true, "c": null, "d": "x"}]"#, DataFormat::Json)
            .unwrap();
        assert_eq!(rows[0]["a"], Value::Number(1.0));
        assert_eq!(rows[0]["b"], Value::Bool(true));
        assert_eq!(rows[0]["c"], Value::Null);
        assert_eq!(rows[0]["d"], Value::text("x"));
    }

    #[test]
    fn test_json_import_rejects_nested_values() {
        let err = import_rows(r#"[{"a": {"nested": 1}}]"#, DataFormat::Json).unwrap_err();
        assert!(matches!(err, BatchError::Codec { format: "json", .. }));
    }

    #[test]
    fn test_csv_export_fills_missing_cells() {
        let rows = vec![
            Record::from([("a".to_string(), Value::Number(1.5))]),
            Record::from([
                ("a".to_string(), Value::Null),
                ("b".to_string(), Value::Bool(false)),
            ]),
        ];
        let text = export_rows(&rows, DataFormat::Csv).unwrap();
        assert_eq!(text, "a,b\n1.5,\n,false\n");
    }

    #[test]
    fn test_format_parse() {
        assert_eq!(DataFormat::parse(".CSV"), Some(DataFormat::Csv));
        assert_eq!(DataFormat::parse("xlsx"), None);
    }
}
