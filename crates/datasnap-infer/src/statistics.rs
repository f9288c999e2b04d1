//! Per-column statistical properties.
//!
//! Computed once per column from the sampled, non-missing values and shared
//! by every scorer.

use std::collections::HashMap;

use datasnap_common::stats;
use datasnap_model::Value;
use serde::{Deserialize, Serialize};

/// How many of the most frequent values are reported.
pub const TOP_VALUES: usize = 10;

/// Share of numeric-parseable values required before numeric stats are filled.
pub const NUMERIC_STATS_THRESHOLD: f64 = 0.8;

/// A frequent value with its count and share of the non-missing values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueFrequency {
    pub value: String,
    pub count: usize,
    /// Percentage in `[0, 100]`.
    pub percentage: f64,
}

/// Coarse distribution shape derived from skewness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Distribution {
    /// All values are equal.
    Constant,
    Normal,
    RightSkewed,
    LeftSkewed,
}

impl Distribution {
    fn from_skewness(std_dev: f64, skewness: f64) -> Self {
        if std_dev == 0.0 {
            Self::Constant
        } else if skewness >= 0.5 {
            Self::RightSkewed
        } else if skewness <= -0.5 {
            Self::LeftSkewed
        } else {
            Self::Normal
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StringLengthStats {
    pub avg: f64,
    pub min: usize,
    pub max: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericStats {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub median: f64,
    /// Population standard deviation.
    pub std_dev: f64,
    /// Every parsed value is a whole number.
    pub is_integer: bool,
    /// At least one parsed value has a fractional part.
    pub has_decimals: bool,
    pub has_negatives: bool,
    pub distribution: Distribution,
}

/// Statistics of one column's sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatisticalProperties {
    /// Sampled rows where the value was missing.
    pub null_count: usize,
    /// Non-missing values in the sample.
    pub value_count: usize,
    /// Distinct non-missing values (by string representation).
    pub unique_count: usize,
    pub top_values: Vec<ValueFrequency>,
    /// Present only when the sample contains strings.
    pub string_lengths: Option<StringLengthStats>,
    /// Present only when at least 80% of the values are numeric.
    pub numeric: Option<NumericStats>,
}

impl StatisticalProperties {
    /// Statistics of a column without any usable values.
    pub fn empty(null_count: usize) -> Self {
        Self {
            null_count,
            value_count: 0,
            unique_count: 0,
            top_values: Vec::new(),
            string_lengths: None,
            numeric: None,
        }
    }

    /// Distinct values over non-missing values, `0.0` for an empty column.
    pub fn uniqueness_ratio(&self) -> f64 {
        if self.value_count == 0 {
            0.0
        } else {
            self.unique_count as f64 / self.value_count as f64
        }
    }
}

/// Compute the statistics of a column sample.
///
/// `values` are the non-missing sampled values, `null_count` the number of
/// sampled rows where the column was missing.
pub fn compute_statistics(values: &[&Value], null_count: usize) -> StatisticalProperties {
    if values.is_empty() {
        return StatisticalProperties::empty(null_count);
    }

    let (unique_count, top_values) = frequencies(values);

    StatisticalProperties {
        null_count,
        value_count: values.len(),
        unique_count,
        top_values,
        string_lengths: string_length_stats(values),
        numeric: numeric_stats(values),
    }
}

/// Distinct count plus the most frequent values, ties in first-seen order.
fn frequencies(values: &[&Value]) -> (usize, Vec<ValueFrequency>) {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut counts: Vec<(String, usize)> = Vec::new();
    for value in values {
        let key = value.to_display_string();
        match index.get(&key) {
            Some(&slot) => counts[slot].1 += 1,
            None => {
                index.insert(key.clone(), counts.len());
                counts.push((key, 1));
            }
        }
    }
    let unique_count = counts.len();
    // Stable sort keeps first-seen order among equal counts.
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    let total = values.len() as f64;
    let top = counts
        .into_iter()
        .take(TOP_VALUES)
        .map(|(value, count)| ValueFrequency {
            value,
            count,
            percentage: count as f64 / total * 100.0,
        })
        .collect();
    (unique_count, top)
}

fn string_length_stats(values: &[&Value]) -> Option<StringLengthStats> {
    let lengths: Vec<usize> = values
        .iter()
        .filter_map(|v| v.as_str())
        .map(|s| s.chars().count())
        .collect();
    let min = *lengths.iter().min()?;
    let max = *lengths.iter().max()?;
    let avg = lengths.iter().sum::<usize>() as f64 / lengths.len() as f64;
    Some(StringLengthStats { avg, min, max })
}

fn numeric_stats(values: &[&Value]) -> Option<NumericStats> {
    let numbers: Vec<f64> = values.iter().filter_map(|v| v.as_f64()).collect();
    if (numbers.len() as f64) < values.len() as f64 * NUMERIC_STATS_THRESHOLD {
        return None;
    }
    let mean = stats::mean(&numbers)?;
    let std_dev = stats::std_dev(&numbers)?;
    let skewness = stats::skewness(&numbers)?;
    let has_decimals = numbers.iter().any(|n| n.fract() != 0.0);
    Some(NumericStats {
        min: numbers.iter().copied().fold(f64::INFINITY, f64::min),
        max: numbers.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        mean,
        median: stats::median(&numbers)?,
        std_dev,
        is_integer: !has_decimals,
        has_decimals,
        has_negatives: numbers.iter().any(|n| *n < 0.0),
        distribution: Distribution::from_skewness(std_dev, skewness),
    })
}
