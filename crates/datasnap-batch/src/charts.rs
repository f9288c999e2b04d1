//! Rule-based chart suggestions from a dataset profile.

use serde::{Deserialize, Serialize};

use crate::profiling::{ColumnKind, DatasetProfile};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartType {
    Scatter,
    Histogram,
    Boxplot,
    Bar,
}

impl ChartType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scatter => "scatter",
            Self::Histogram => "histogram",
            Self::Boxplot => "boxplot",
            Self::Bar => "bar",
        }
    }
}

/// A chart worth drawing for this dataset, with the columns it needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSuggestion {
    pub chart_type: ChartType,
    pub confidence: f64,
    pub reason: String,
    pub required_columns: Vec<String>,
    pub optional_columns: Vec<String>,
}

/// Suggest charts, most confident first.
///
/// Equal confidences keep the order scatter, histogram, boxplot, bar.
pub fn suggest_charts(profile: &DatasetProfile) -> Vec<ChartSuggestion> {
    let columns_of = |kind: ColumnKind| -> Vec<String> {
        profile
            .columns
            .iter()
            .filter(|c| c.kind == kind)
            .map(|c| c.column.clone())
            .collect()
    };
    let numeric = columns_of(ColumnKind::Numeric);
    let categorical = columns_of(ColumnKind::Categorical);

    let mut suggestions = Vec::new();
    if numeric.len() >= 2 {
        suggestions.push(ChartSuggestion {
            chart_type: ChartType::Scatter,
            confidence: 0.9,
            reason: "Multiple numeric columns available for correlation analysis".to_string(),
            required_columns: numeric[..2].to_vec(),
            optional_columns: [&categorical[..], &numeric[2..]].concat(),
        });
    }
    if let Some(first) = numeric.first() {
        suggestions.push(ChartSuggestion {
            chart_type: ChartType::Histogram,
            confidence: 0.8,
            reason: "Numeric columns available for distribution analysis".to_string(),
            required_columns: vec![first.clone()],
            optional_columns: categorical.clone(),
        });

        let grouped = !categorical.is_empty();
        suggestions.push(ChartSuggestion {
            chart_type: ChartType::Boxplot,
            confidence: if grouped { 0.9 } else { 0.7 },
            reason: if grouped {
                "Numeric columns available for distribution analysis with categorical grouping available"
                    .to_string()
            } else {
                "Numeric columns available for distribution analysis".to_string()
            },
            required_columns: vec![first.clone()],
            optional_columns: categorical.clone(),
        });

        if let Some(group) = categorical.first() {
            suggestions.push(ChartSuggestion {
                chart_type: ChartType::Bar,
                confidence: 0.8,
                reason: "Categorical and numeric columns available for aggregated comparison"
                    .to_string(),
                required_columns: vec![group.clone(), first.clone()],
                optional_columns: [&categorical[1..], &numeric[1..]].concat(),
            });
        }
    }

    suggestions.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    suggestions
}
