//! Templated explanation attached to each inference.

use datasnap_model::SemanticType;

use crate::statistics::StatisticalProperties;

/// Reasoning for a column without usable values.
pub(crate) const NO_DATA: &str = "No valid data found for analysis";

/// Distinct ratio under which the column is described as low cardinality.
const LOW_CARDINALITY: f64 = 0.1;

/// Compose the explanation from the winning score, the number of values
/// that convert to the winning type, and the column statistics.
pub(crate) fn build_reasoning(
    semantic_type: SemanticType,
    confidence: f64,
    matched: usize,
    stats: &StatisticalProperties,
) -> String {
    let mut parts = vec![
        format!("{:.0}% confidence in {semantic_type}", confidence * 100.0),
        format!(
            "{matched} of {} sampled values match the pattern",
            stats.value_count
        ),
    ];

    let ratio = stats.uniqueness_ratio();
    if stats.value_count > 1 && stats.unique_count == stats.value_count {
        parts.push("all values are unique".to_string());
    } else if ratio < LOW_CARDINALITY {
        parts.push(format!(
            "low cardinality ({} distinct values)",
            stats.unique_count
        ));
    } else {
        parts.push(format!("{} distinct values", stats.unique_count));
    }

    if stats.null_count > 0 {
        parts.push(format!("{} missing values in sample", stats.null_count));
    } else {
        parts.push("no missing values".to_string());
    }

    parts.join("; ")
}

#[cfg(test)]
mod tests {
    use datasnap_model::Value;

    use super::*;
    use crate::statistics::compute_statistics;

    #[test]
    fn test_reasoning_template() {
        let owned: Vec<Value> = ["a", "b", "a"].iter().map(|v| Value::text(*v)).collect();
        let refs: Vec<&Value> = owned.iter().collect();
        let stats = compute_statistics(&refs, 2);
        insta::assert_snapshot!(
            build_reasoning(SemanticType::Categorical, 0.6, 3, &stats),
            @"60% confidence in categorical; 3 of 3 sampled values match the pattern; 2 distinct values; 2 missing values in sample"
        );
    }
}
