//! Dataset summary and rule-based insights.
//!
//! Insights are heuristics over the column profiles; each carries a
//! confidence in `[0, 1]` and a priority used for ordering.

use datasnap_common::stats;
use datasnap_model::Record;
use serde::{Deserialize, Serialize};

use crate::charts::{ChartSuggestion, suggest_charts};
use crate::hypothesis::TestResult;
use crate::profiling::{ColumnKind, DatasetProfile, profile_table};

/// Minimum absolute Pearson coefficient reported as a correlation.
pub const CORRELATION_THRESHOLD: f64 = 0.7;

/// Minimum share (percent) of one category to be called dominant.
const DOMINANT_SHARE: f64 = 50.0;

/// Missing share (percent) above which missing data is high priority.
const MISSING_HIGH_PRIORITY: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightPriority {
    Critical,
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightKind {
    MissingData,
    Outliers,
    DominantCategory,
    Correlation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    pub kind: InsightKind,
    pub title: String,
    pub description: String,
    pub columns: Vec<String>,
    pub confidence: f64,
    pub priority: InsightPriority,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetSummary {
    pub rows: usize,
    pub columns: usize,
    pub total_missing: usize,
    pub numeric_columns: usize,
    pub categorical_columns: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub summary: DatasetSummary,
    /// Ordered by priority, most urgent first.
    pub insights: Vec<Insight>,
    /// Most confident first.
    pub chart_suggestions: Vec<ChartSuggestion>,
    /// Results of the hypothesis tests the job asked for, in request order.
    pub tests: Vec<TestResult>,
}

/// Profile the table and derive insights.
pub fn analyze_table(rows: &[Record]) -> AnalysisReport {
    let profile = profile_table(rows);
    analyze_profile(rows, &profile)
}

/// Derive the summary and insights from an existing profile.
pub fn analyze_profile(rows: &[Record], profile: &DatasetProfile) -> AnalysisReport {
    let summary = DatasetSummary {
        rows: profile.row_count,
        columns: profile.column_count,
        total_missing: profile.columns.iter().map(|c| c.missing).sum(),
        numeric_columns: profile
            .columns
            .iter()
            .filter(|c| c.kind == ColumnKind::Numeric)
            .count(),
        categorical_columns: profile
            .columns
            .iter()
            .filter(|c| c.kind == ColumnKind::Categorical)
            .count(),
    };

    let mut insights = Vec::new();
    insights.extend(missing_data(&summary, profile));
    insights.extend(outliers(profile));
    insights.extend(dominant_categories(profile));
    insights.extend(correlations(rows, profile));
    insights.sort_by_key(|i| i.priority);

    AnalysisReport {
        summary,
        insights,
        chart_suggestions: suggest_charts(profile),
        tests: Vec::new(),
    }
}

fn missing_data(summary: &DatasetSummary, profile: &DatasetProfile) -> Option<Insight> {
    let cells = summary.rows * summary.columns;
    if summary.total_missing == 0 || cells == 0 {
        return None;
    }
    let pct = summary.total_missing as f64 / cells as f64 * 100.0;
    Some(Insight {
        kind: InsightKind::MissingData,
        title: "Missing values detected".to_string(),
        description: format!(
            "{} missing values ({pct:.1}% of all cells)",
            summary.total_missing
        ),
        columns: profile
            .columns
            .iter()
            .filter(|c| c.missing > 0)
            .map(|c| c.column.clone())
            .collect(),
        confidence: 0.95,
        priority: if pct > MISSING_HIGH_PRIORITY {
            InsightPriority::High
        } else {
            InsightPriority::Medium
        },
    })
}

fn outliers(profile: &DatasetProfile) -> Vec<Insight> {
    profile
        .columns
        .iter()
        .filter_map(|c| {
            let numeric = c.numeric.as_ref()?;
            let n = numeric.anomalies.len();
            if n == 0 {
                return None;
            }
            let share = n as f64 / c.count as f64;
            Some(Insight {
                kind: InsightKind::Outliers,
                title: format!("Outliers in '{}'", c.column),
                description: format!(
                    "{n} values fall outside [{:.2}, {:.2}]",
                    numeric.lower_bound, numeric.upper_bound
                ),
                columns: vec![c.column.clone()],
                confidence: 0.8,
                priority: if share > 0.05 {
                    InsightPriority::High
                } else {
                    InsightPriority::Medium
                },
            })
        })
        .collect()
}

fn dominant_categories(profile: &DatasetProfile) -> Vec<Insight> {
    profile
        .columns
        .iter()
        .filter(|c| c.kind == ColumnKind::Categorical && c.unique > 1)
        .filter_map(|c| {
            let top = c.top_categories.first()?;
            (top.percentage >= DOMINANT_SHARE).then(|| Insight {
                kind: InsightKind::DominantCategory,
                title: format!("'{}' dominates '{}'", top.value, c.column),
                description: format!("{:.1}% of values are '{}'", top.percentage, top.value),
                columns: vec![c.column.clone()],
                confidence: top.percentage / 100.0,
                priority: InsightPriority::Low,
            })
        })
        .collect()
}

fn correlations(rows: &[Record], profile: &DatasetProfile) -> Vec<Insight> {
    let numeric: Vec<&str> = profile
        .columns
        .iter()
        .filter(|c| c.kind == ColumnKind::Numeric)
        .map(|c| c.column.as_str())
        .collect();

    let mut insights = Vec::new();
    for (i, a) in numeric.iter().enumerate() {
        for b in &numeric[i + 1..] {
            let (xs, ys): (Vec<f64>, Vec<f64>) = rows
                .iter()
                .filter_map(|r| Some((r.get(*a)?.as_f64()?, r.get(*b)?.as_f64()?)))
                .unzip();
            let Some(r) = stats::pearson(&xs, &ys) else {
                continue;
            };
            if r.abs() < CORRELATION_THRESHOLD {
                continue;
            }
            let direction = if r > 0.0 { "positive" } else { "negative" };
            insights.push(Insight {
                kind: InsightKind::Correlation,
                title: format!("Strong {direction} correlation"),
                description: format!("'{a}' and '{b}' have r = {r:.2}"),
                columns: vec![(*a).to_string(), (*b).to_string()],
                confidence: r.abs().min(1.0),
                priority: if r.abs() >= 0.9 {
                    InsightPriority::High
                } else {
                    InsightPriority::Medium
                },
            });
        }
    }
    insights
}

#[cfg(test)]
mod tests {
    use datasnap_model::Value;

    use super::*;

    fn rows() -> Vec<Record> {
        (0..10)
            .map(|i| {
                let mut row = Record::new();
                row.insert("x".into(), Value::from(i as f64));
                row.insert("y".into(), Value::from(2.0 * i as f64 + 1.0));
                let segment = if i < 8 { "retail" } else { "wholesale" };
                row.insert("segment".into(), Value::text(segment));
                if i == 3 {
                    row.insert("note".into(), Value::Null);
                } else {
                    row.insert("note".into(), Value::text(format!("n{i}")));
                }
                row
            })
            .collect()
    }

    #[test]
    fn test_summary_counts() {
        let report = analyze_table(&rows());
        assert_eq!(report.summary.rows, 10);
        assert_eq!(report.summary.columns, 4);
        assert_eq!(report.summary.total_missing, 1);
        assert_eq!(report.summary.numeric_columns, 2);
        assert_eq!(report.summary.categorical_columns, 2);
    }

    #[test]
    fn test_insights_found_and_ordered() {
        let report = analyze_table(&rows());
        let kinds: Vec<InsightKind> = report.insights.iter().map(|i| i.kind).collect();
        assert_eq!(
            kinds,
            vec![
                InsightKind::Correlation,
                InsightKind::MissingData,
                InsightKind::DominantCategory
            ]
        );
        assert!(report.insights.iter().all(|i| (0.0..=1.0).contains(&i.confidence)));
        assert_eq!(report.insights[2].columns, vec!["segment"]);
    }

    #[test]
    fn test_empty_table_has_no_insights() {
        let report = analyze_table(&[]);
        assert_eq!(report.summary.rows, 0);
        assert!(report.insights.is_empty());
        assert!(report.chart_suggestions.is_empty());
    }

    #[test]
    fn test_report_carries_chart_suggestions() {
        let report = analyze_table(&rows());
        assert_eq!(report.chart_suggestions[0].required_columns, vec!["x", "y"]);
        assert!(report.tests.is_empty());
    }
}
