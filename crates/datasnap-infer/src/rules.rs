//! Validation rules inferred from a column's winning type and statistics.

use datasnap_model::{RuleKind, SemanticType, Severity, ValidationRule, format_numeric};

use crate::patterns;
use crate::statistics::StatisticalProperties;

/// Minimum sample size before an all-distinct column earns a uniqueness rule.
const UNIQUENESS_MIN_VALUES: usize = 10;

/// Build the rules implied by the suggested type and observed statistics.
pub(crate) fn infer_rules(
    column: &str,
    semantic_type: SemanticType,
    stats: &StatisticalProperties,
) -> Vec<ValidationRule> {
    let mut rules = Vec::new();

    if let Some(kind) = type_rule(semantic_type, stats) {
        let (severity, message) = match &kind {
            RuleKind::Range { min, max } => (
                Severity::Warning,
                format!(
                    "Values should be between {} and {}",
                    format_numeric(*min),
                    format_numeric(*max)
                ),
            ),
            RuleKind::Length { min, max } => (
                Severity::Warning,
                format!("Length should be between {min} and {max} characters"),
            ),
            RuleKind::Enum { values } => (
                Severity::Warning,
                format!("Value should be one of {} known categories", values.len()),
            ),
            _ => (
                Severity::Error,
                format!("Value should be a valid {semantic_type}"),
            ),
        };
        rules.push(ValidationRule::new(column, kind, severity, message));
    }

    if stats.null_count == 0 && stats.value_count > 0 {
        rules.push(ValidationRule::new(
            column,
            RuleKind::Required,
            Severity::Warning,
            "No missing values were observed",
        ));
    }

    if stats.value_count >= UNIQUENESS_MIN_VALUES && stats.unique_count == stats.value_count {
        rules.push(ValidationRule::new(
            column,
            RuleKind::Uniqueness,
            Severity::Info,
            "Every observed value is distinct",
        ));
    }

    rules
}

fn type_rule(semantic_type: SemanticType, stats: &StatisticalProperties) -> Option<RuleKind> {
    match semantic_type {
        t if t.is_numeric() => stats.numeric.as_ref().map(|n| RuleKind::Range {
            min: n.min,
            max: n.max,
        }),
        SemanticType::String => stats.string_lengths.as_ref().map(|l| RuleKind::Length {
            min: l.min,
            max: l.max,
        }),
        SemanticType::Categorical | SemanticType::Ordinal if !stats.top_values.is_empty() => {
            Some(RuleKind::Enum {
                values: stats.top_values.iter().map(|f| f.value.clone()).collect(),
            })
        }
        SemanticType::Email => Some(format_rule(&patterns::EMAIL)),
        SemanticType::Url => Some(format_rule(&patterns::URL)),
        SemanticType::Phone => Some(format_rule(&patterns::PHONE)),
        SemanticType::Uuid => Some(format_rule(&patterns::UUID)),
        _ => None,
    }
}

fn format_rule(regex: &regex::Regex) -> RuleKind {
    RuleKind::Format {
        pattern: regex.as_str().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use datasnap_model::Value;

    use super::*;
    use crate::statistics::compute_statistics;

    fn stats_for(values: &[&str], nulls: usize) -> StatisticalProperties {
        let owned: Vec<Value> = values.iter().map(|v| Value::text(*v)).collect();
        let refs: Vec<&Value> = owned.iter().collect();
        compute_statistics(&refs, nulls)
    }

    #[test]
    fn test_integer_gets_range_and_required() {
        let stats = stats_for(&["3", "10", "7"], 0);
        let rules = infer_rules("qty", SemanticType::Integer, &stats);
        assert_eq!(rules[0].kind, RuleKind::Range { min: 3.0, max: 10.0 });
        assert_eq!(rules[0].message, "Values should be between 3 and 10");
        assert_eq!(rules[1].kind, RuleKind::Required);
        assert_eq!(rules.len(), 2);
    }

    #[test]
    fn test_string_length_without_required_when_nulls_seen() {
        let stats = stats_for(&["ab", "abcd"], 1);
        let rules = infer_rules("name", SemanticType::String, &stats);
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].kind, RuleKind::Length { min: 2, max: 4 });
    }

    #[test]
    fn test_email_format_is_error() {
        let stats = stats_for(&["a@b.co"], 1);
        let rules = infer_rules("mail", SemanticType::Email, &stats);
        assert_eq!(rules[0].severity, Severity::Error);
        assert!(matches!(rules[0].kind, RuleKind::Format { .. }));
    }

    #[test]
    fn test_uniqueness_needs_ten_values() {
        let ids: Vec<String> = (0..10).map(|i| format!("id-{i}")).collect();
        let refs: Vec<&str> = ids.iter().map(String::as_str).collect();
        let stats = stats_for(&refs, 0);
        let rules = infer_rules("id", SemanticType::String, &stats);
        assert!(rules.iter().any(|r| r.kind == RuleKind::Uniqueness));

        let stats = stats_for(&refs[..9], 0);
        let rules = infer_rules("id", SemanticType::String, &stats);
        assert!(!rules.iter().any(|r| r.kind == RuleKind::Uniqueness));
    }
}
