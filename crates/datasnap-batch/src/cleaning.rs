//! Chunked data cleaning with a quality report.
//!
//! Missing values are imputed with the column mode, strings are trimmed,
//! mostly numeric columns are promoted to numbers, and exact duplicate rows
//! are dropped (first occurrence wins).

use std::collections::{BTreeMap, HashMap, HashSet};

use datasnap_common::row_fingerprint;
use datasnap_model::{Record, Table, Value, table_columns};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::BatchConfig;
use crate::progress::{BatchProgress, ProgressTracker};

/// Rows between progress callbacks.
pub const PROGRESS_EVERY_ROWS: usize = 100;

/// Share of numeric values above which a column is promoted to numbers.
const NUMERIC_PROMOTION_RATIO: f64 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueCategory {
    MissingValues,
    Duplicates,
    TypeConversion,
    Whitespace,
}

impl IssueCategory {
    pub fn label(&self) -> &'static str {
        match self {
            Self::MissingValues => "Missing values",
            Self::Duplicates => "Duplicate rows",
            Self::TypeConversion => "Type conversion",
            Self::Whitespace => "Whitespace",
        }
    }
}

/// A counted data-quality finding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityIssue {
    pub category: IssueCategory,
    /// `None` for row-level findings.
    pub column: Option<String>,
    pub count: usize,
    pub description: String,
}

/// Outcome of a cleaning run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityReport {
    pub total_rows: usize,
    pub valid_rows: usize,
    pub invalid_rows: usize,
    pub duplicates_removed: usize,
    pub nulls_handled: usize,
    pub type_conversions: usize,
    /// `valid_rows / total_rows * 100`.
    pub quality_score: f64,
    pub issues: Vec<QualityIssue>,
}

/// Cleaned rows plus their report.
#[derive(Debug, Clone, PartialEq)]
pub struct CleaningResult {
    pub rows: Table,
    pub report: QualityReport,
}

/// Clean `rows` chunk by chunk.
///
/// `on_progress` fires every [`PROGRESS_EVERY_ROWS`] rows and once at the end.
pub fn process_data_cleaning(
    rows: &[Record],
    config: &BatchConfig,
    mut on_progress: impl FnMut(&BatchProgress),
) -> CleaningResult {
    let mut cleaner = DataCleaner::new(rows, config);
    let mut cleaned = Vec::with_capacity(rows.len());
    for chunk in rows.chunks(config.effective_chunk_size()) {
        cleaned.extend(cleaner.clean_chunk(chunk, &mut on_progress));
    }
    let (report, last) = cleaner.finish(cleaned.len());
    on_progress(&last);
    CleaningResult {
        rows: cleaned,
        report,
    }
}

/// Cleaning state shared across the chunks of one run.
#[derive(Debug)]
pub struct DataCleaner {
    impute: bool,
    modes: HashMap<String, Value>,
    numeric_columns: HashSet<String>,
    seen: HashSet<[u8; 32]>,
    tracker: ProgressTracker,
    total_rows: usize,
    processed: usize,
    duplicates: usize,
    counts: BTreeMap<(IssueCategory, String), usize>,
}

impl DataCleaner {
    /// Compute column modes and numeric columns over the full dataset.
    pub fn new(rows: &[Record], config: &BatchConfig) -> Self {
        let columns = table_columns(rows);
        let modes = columns
            .iter()
            .filter_map(|c| column_mode(rows, c).map(|m| (c.clone(), m)))
            .collect();
        let numeric_columns = columns
            .into_iter()
            .filter(|c| is_mostly_numeric(rows, c))
            .collect();
        Self {
            impute: config.validation_enabled,
            modes,
            numeric_columns,
            seen: HashSet::new(),
            tracker: ProgressTracker::new(rows.len(), vec!["clean".to_string()]),
            total_rows: rows.len(),
            processed: 0,
            duplicates: 0,
            counts: BTreeMap::new(),
        }
    }

    /// Clean one chunk; duplicates of any earlier row are dropped.
    pub fn clean_chunk(
        &mut self,
        chunk: &[Record],
        on_progress: &mut dyn FnMut(&BatchProgress),
    ) -> Vec<Record> {
        let mut out = Vec::with_capacity(chunk.len());
        for row in chunk {
            let cleaned = self.clean_row(row);
            if self.seen.insert(row_fingerprint(&cleaned)) {
                out.push(cleaned);
            } else {
                self.duplicates += 1;
            }
            self.processed += 1;
            if self.processed % PROGRESS_EVERY_ROWS == 0 {
                on_progress(self.tracker.rows(self.processed));
            }
        }
        out
    }

    fn clean_row(&mut self, row: &Record) -> Record {
        let mut out = Record::new();
        for (column, value) in row {
            let mut value = value.clone();

            if value.is_missing() && self.impute {
                self.count(IssueCategory::MissingValues, column);
                if let Some(mode) = self.modes.get(column) {
                    value = mode.clone();
                }
            }

            if let Value::String(s) = &value {
                let trimmed = s.trim();
                if trimmed.len() != s.len() {
                    self.count(IssueCategory::Whitespace, column);
                    value = Value::text(trimmed);
                }
            }

            if self.numeric_columns.contains(column)
                && matches!(value, Value::String(_))
                && let Some(n) = value.as_f64()
            {
                self.count(IssueCategory::TypeConversion, column);
                value = Value::Number(n);
            }

            out.insert(column.clone(), value);
        }
        out
    }

    fn count(&mut self, category: IssueCategory, column: &str) {
        *self
            .counts
            .entry((category, column.to_string()))
            .or_default() += 1;
    }

    /// Build the report for `valid_rows` output rows, plus the final progress.
    pub fn finish(mut self, valid_rows: usize) -> (QualityReport, BatchProgress) {
        let mut issues: Vec<QualityIssue> = self
            .counts
            .iter()
            .map(|((category, column), count)| QualityIssue {
                category: *category,
                column: Some(column.clone()),
                count: *count,
                description: format!("{}: {count} values in '{column}'", category.label()),
            })
            .collect();
        if self.duplicates > 0 {
            issues.push(QualityIssue {
                category: IssueCategory::Duplicates,
                column: None,
                count: self.duplicates,
                description: format!("{} duplicate rows removed", self.duplicates),
            });
        }

        let total_of = |category: IssueCategory| -> usize {
            self.counts
                .iter()
                .filter(|((c, _), _)| *c == category)
                .map(|(_, n)| n)
                .sum()
        };

        let report = QualityReport {
            total_rows: self.total_rows,
            valid_rows,
            invalid_rows: self.total_rows - valid_rows,
            duplicates_removed: self.duplicates,
            nulls_handled: total_of(IssueCategory::MissingValues),
            type_conversions: total_of(IssueCategory::TypeConversion),
            quality_score: if self.total_rows == 0 {
                100.0
            } else {
                valid_rows as f64 / self.total_rows as f64 * 100.0
            },
            issues,
        };
        debug!(
            total_rows = report.total_rows,
            duplicates = report.duplicates_removed,
            nulls_handled = report.nulls_handled,
            "Cleaning finished"
        );
        let last = self.tracker.complete().clone();
        (report, last)
    }
}

/// Most frequent non-missing value, first seen wins ties.
///
/// Strings are tallied by their trimmed text, the form cleaning writes back.
fn column_mode(rows: &[Record], column: &str) -> Option<Value> {
    let mut counts: Vec<(Value, usize)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    for value in rows.iter().filter_map(|r| r.get(column)) {
        let value = match value {
            Value::String(s) => Value::text(s.trim()),
            other => other.clone(),
        };
        if value.is_missing() {
            continue;
        }
        let key = value.to_display_string();
        match index.get(&key) {
            Some(&slot) => counts[slot].1 += 1,
            None => {
                index.insert(key, counts.len());
                counts.push((value, 1));
            }
        }
    }
    let mut best: Option<&(Value, usize)> = None;
    for entry in &counts {
        if best.is_none_or(|b| entry.1 > b.1) {
            best = Some(entry);
        }
    }
    best.map(|(value, _)| value.clone())
}

/// More than 80% of the non-missing values parse as numbers.
fn is_mostly_numeric(rows: &[Record], column: &str) -> bool {
    let values: Vec<&Value> = rows
        .iter()
        .filter_map(|r| r.get(column))
        .filter(|v| !v.is_missing())
        .collect();
    if values.is_empty() {
        return false;
    }
    let numeric = values.iter().filter(|v| v.as_f64().is_some()).count();
    numeric as f64 / values.len() as f64 > NUMERIC_PROMOTION_RATIO
}
