//! Per-column descriptive profiles with IQR anomaly detection.

use std::collections::HashMap;

use datasnap_common::stats;
use datasnap_model::{Record, Value, table_columns};
use serde::{Deserialize, Serialize};

/// Multiplier of the interquartile range used for anomaly bounds.
pub const ANOMALY_IQR_THRESHOLD: f64 = 1.5;

/// Categories reported per column.
pub const TOP_CATEGORIES: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    Numeric,
    Categorical,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryCount {
    pub value: String,
    pub count: usize,
    pub percentage: f64,
}

/// A value outside the IQR bounds of its column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anomaly {
    pub row: usize,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericProfile {
    pub mean: f64,
    /// Sample standard deviation, `None` with fewer than two values.
    pub std_dev: Option<f64>,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
    pub skewness: Option<f64>,
    pub kurtosis: Option<f64>,
    pub lower_bound: f64,
    pub upper_bound: f64,
    pub anomalies: Vec<Anomaly>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnProfile {
    pub column: String,
    pub kind: ColumnKind,
    /// Non-missing values.
    pub count: usize,
    pub missing: usize,
    pub unique: usize,
    pub numeric: Option<NumericProfile>,
    /// Most frequent values, ties in first-seen order.
    pub top_categories: Vec<CategoryCount>,
}

impl ColumnProfile {
    pub fn missing_percentage(&self) -> f64 {
        let total = self.count + self.missing;
        if total == 0 {
            0.0
        } else {
            self.missing as f64 / total as f64 * 100.0
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetProfile {
    pub row_count: usize,
    pub column_count: usize,
    pub columns: Vec<ColumnProfile>,
}

impl DatasetProfile {
    pub fn column(&self, name: &str) -> Option<&ColumnProfile> {
        self.columns.iter().find(|c| c.column == name)
    }
}

/// Profile every column of the table.
pub fn profile_table(rows: &[Record]) -> DatasetProfile {
    let columns: Vec<ColumnProfile> = table_columns(rows)
        .iter()
        .map(|c| profile_column(rows, c))
        .collect();
    DatasetProfile {
        row_count: rows.len(),
        column_count: columns.len(),
        columns,
    }
}

/// Profile one column. A column is numeric when every present value parses
/// as a number.
pub fn profile_column(rows: &[Record], column: &str) -> ColumnProfile {
    let present: Vec<(usize, &Value)> = rows
        .iter()
        .enumerate()
        .filter_map(|(i, r)| r.get(column).map(|v| (i, v)))
        .filter(|(_, v)| !v.is_missing())
        .collect();
    let numbers: Vec<(usize, f64)> = present
        .iter()
        .filter_map(|(i, v)| v.as_f64().map(|n| (*i, n)))
        .collect();

    let (unique, top_categories) = categories(present.iter().map(|(_, v)| *v));
    let numeric = (!numbers.is_empty() && numbers.len() == present.len())
        .then(|| numeric_profile(&numbers))
        .flatten();

    ColumnProfile {
        column: column.to_string(),
        kind: if numeric.is_some() {
            ColumnKind::Numeric
        } else {
            ColumnKind::Categorical
        },
        count: present.len(),
        missing: rows.len() - present.len(),
        unique,
        numeric,
        top_categories,
    }
}

fn numeric_profile(indexed: &[(usize, f64)]) -> Option<NumericProfile> {
    let values: Vec<f64> = indexed.iter().map(|(_, v)| *v).collect();
    let outliers = stats::iqr_outliers(&values, ANOMALY_IQR_THRESHOLD)?;
    Some(NumericProfile {
        mean: stats::mean(&values)?,
        std_dev: stats::sample_std_dev(&values),
        min: values.iter().copied().fold(f64::INFINITY, f64::min),
        q1: stats::quantile(&values, 0.25)?,
        median: stats::median(&values)?,
        q3: stats::quantile(&values, 0.75)?,
        max: values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        skewness: stats::skewness(&values),
        kurtosis: stats::kurtosis(&values),
        lower_bound: outliers.lower_bound,
        upper_bound: outliers.upper_bound,
        anomalies: outliers
            .indexes
            .into_iter()
            .map(|i| Anomaly {
                row: indexed[i].0,
                value: indexed[i].1,
            })
            .collect(),
    })
}

fn categories<'a>(values: impl Iterator<Item = &'a Value>) -> (usize, Vec<CategoryCount>) {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut counts: Vec<(String, usize)> = Vec::new();
    let mut total = 0usize;
    for value in values {
        total += 1;
        let key = value.to_display_string();
        match index.get(&key) {
            Some(&slot) => counts[slot].1 += 1,
            None => {
                index.insert(key.clone(), counts.len());
                counts.push((key, 1));
            }
        }
    }
    let unique = counts.len();
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    let top = counts
        .into_iter()
        .take(TOP_CATEGORIES)
        .map(|(value, count)| CategoryCount {
            value,
            count,
            percentage: count as f64 / total as f64 * 100.0,
        })
        .collect();
    (unique, top)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(values: &[Option<&str>]) -> Vec<Record> {
        values
            .iter()
            .map(|v| Record::from([("x".to_string(), Value::from(*v))]))
            .collect()
    }

    #[test]
    fn test_numeric_profile_with_anomaly() {
        let rows = table(&[
            Some("10"),
            Some("12"),
            Some("11"),
            None,
            Some("13"),
            Some("100"),
        ]);
        let profile = profile_column(&rows, "x");
        assert_eq!(profile.kind, ColumnKind::Numeric);
        assert_eq!(profile.count, 5);
        assert_eq!(profile.missing, 1);
        let numeric = profile.numeric.unwrap();
        assert_eq!(numeric.median, 12.0);
        assert_eq!(numeric.anomalies, vec![Anomaly { row: 5, value: 100.0 }]);
        assert!((profile_column(&rows, "x").missing_percentage() - 100.0 / 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_categorical_profile() {
        let rows = table(&[Some("b"), Some("a"), Some("b"), Some("7")]);
        let profile = profile_column(&rows, "x");
        assert_eq!(profile.kind, ColumnKind::Categorical);
        assert!(profile.numeric.is_none());
        assert_eq!(profile.unique, 3);
        assert_eq!(profile.top_categories[0].value, "b");
        assert_eq!(profile.top_categories[0].count, 2);
    }

    #[test]
    fn test_profile_table_columns() {
        let mut rows = table(&[Some("1"), Some("2")]);
        rows[1].insert("y".into(), Value::text("late"));
        let profile = profile_table(&rows);
        assert_eq!(profile.column_count, 2);
        assert_eq!(profile.column("y").unwrap().missing, 1);
    }
}
