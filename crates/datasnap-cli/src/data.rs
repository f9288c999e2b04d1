//! Reading and writing the files the commands work on.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use datasnap_batch::{DataFormat, export_rows};
use datasnap_common::dataframe_to_table;
use datasnap_model::{Record, Table};
use polars::prelude::{CsvReadOptions, SerReader};
use serde::de::DeserializeOwned;
use tracing::debug;

/// Read a CSV file with a header row.
///
/// Every cell is read as text so that type inference sees the raw values.
/// Empty cells become `Value::Null` under their header column.
pub fn read_csv_table(path: &Path) -> Result<Table> {
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .with_context(|| format!("open {}", path.display()))?
        .finish()
        .with_context(|| format!("parse {}", path.display()))?;
    let rows = dataframe_to_table(&df).context("convert CSV rows")?;
    debug!(path = %path.display(), rows = rows.len(), columns = df.width(), "Read CSV");
    Ok(rows)
}

/// Write rows as CSV; columns appear in first-seen order.
pub fn write_csv_table(path: &Path, rows: &[Record]) -> Result<()> {
    let text = export_rows(rows, DataFormat::Csv).context("serialize rows")?;
    fs::write(path, text).with_context(|| format!("write {}", path.display()))?;
    debug!(path = %path.display(), rows = rows.len(), "Wrote CSV");
    Ok(())
}

/// Read a JSON document (rules, steps) from a file.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("parse {}", path.display()))
}
