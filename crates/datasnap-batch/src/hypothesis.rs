//! Hypothesis tests over numeric columns.
//!
//! t-tests (one-sample, independent with pooled variance, paired) and
//! one-way ANOVA. p-values are two-sided for t-tests. Distributions come
//! from `statrs`.

use std::collections::BTreeMap;

use datasnap_common::stats;
use datasnap_model::Record;
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, FisherSnedecor, StudentsT};

use crate::error::{BatchError, Result};

/// Significance level used when a request does not name one.
pub const DEFAULT_ALPHA: f64 = 0.05;

fn default_alpha() -> f64 {
    DEFAULT_ALPHA
}

/// A requested test, as read from a job's input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "test", rename_all = "snake_case")]
pub enum HypothesisTest {
    OneSampleT {
        column: String,
        test_value: f64,
        #[serde(default = "default_alpha")]
        alpha: f64,
    },
    IndependentT {
        column: String,
        group_column: String,
        #[serde(default = "default_alpha")]
        alpha: f64,
    },
    PairedT {
        first: String,
        second: String,
        #[serde(default = "default_alpha")]
        alpha: f64,
    },
    OneWayAnova {
        column: String,
        group_column: String,
        #[serde(default = "default_alpha")]
        alpha: f64,
    },
}

/// Outcome of one test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    pub test_name: String,
    /// t for t-tests, F for ANOVA.
    pub statistic: f64,
    /// Between-groups degrees of freedom for ANOVA.
    pub degrees_of_freedom: f64,
    pub p_value: f64,
    /// Interval for the mean difference; absent for ANOVA.
    pub confidence_interval: Option<(f64, f64)>,
    /// Cohen's d for t-tests, eta squared for ANOVA.
    pub effect_size: f64,
    pub interpretation: String,
    pub sample_size: usize,
    pub group_statistics: BTreeMap<String, f64>,
}

impl TestResult {
    pub fn is_significant(&self, alpha: f64) -> bool {
        self.p_value < alpha
    }
}

/// Run a test against the rows.
pub fn run_test(rows: &[Record], test: &HypothesisTest) -> Result<TestResult> {
    match test {
        HypothesisTest::OneSampleT {
            column,
            test_value,
            alpha,
        } => one_sample_t_test(&numbers(rows, column), *test_value, *alpha),
        HypothesisTest::IndependentT {
            column,
            group_column,
            alpha,
        } => {
            let groups = grouped_numbers(rows, column, group_column);
            if groups.len() != 2 {
                return Err(insufficient(format!(
                    "independent t-test requires exactly 2 groups, found {}",
                    groups.len()
                )));
            }
            independent_t_test(&groups[0], &groups[1], *alpha)
        }
        HypothesisTest::PairedT {
            first,
            second,
            alpha,
        } => {
            let (xs, ys): (Vec<f64>, Vec<f64>) = rows
                .iter()
                .filter_map(|r| Some((r.get(first)?.as_f64()?, r.get(second)?.as_f64()?)))
                .unzip();
            paired_t_test(first, &xs, second, &ys, *alpha)
        }
        HypothesisTest::OneWayAnova {
            column,
            group_column,
            alpha,
        } => one_way_anova(&grouped_numbers(rows, column, group_column), *alpha),
    }
}

/// A labelled group of numeric values.
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub label: String,
    pub values: Vec<f64>,
}

pub fn one_sample_t_test(values: &[f64], test_value: f64, alpha: f64) -> Result<TestResult> {
    let n = require_at_least(values, 2, "need at least 2 valid values")?;
    let mean = mean_of(values)?;
    let sd = sample_sd(values)?;
    let df = n - 1.0;
    let se = sd / n.sqrt();
    let t = (mean - test_value) / se;
    let d = (mean - test_value) / sd;
    let p_value = two_sided_p(t, df)?;
    let margin = t_critical(alpha, df)? * se;
    let diff = mean - test_value;

    Ok(TestResult {
        test_name: "One-Sample t-Test".to_string(),
        statistic: t,
        degrees_of_freedom: df,
        p_value,
        confidence_interval: Some((diff - margin, diff + margin)),
        effect_size: d,
        interpretation: interpret(p_value, alpha, "one-sample t-test", Some(d)),
        sample_size: values.len(),
        group_statistics: BTreeMap::from([
            ("sample_mean".to_string(), mean),
            ("sample_std".to_string(), sd),
            ("test_value".to_string(), test_value),
        ]),
    })
}

/// Student's t-test with pooled variance.
pub fn independent_t_test(first: &Group, second: &Group, alpha: f64) -> Result<TestResult> {
    let n1 = require_at_least(&first.values, 2, "each group must have at least 2 valid values")?;
    let n2 = require_at_least(&second.values, 2, "each group must have at least 2 valid values")?;
    let (m1, m2) = (mean_of(&first.values)?, mean_of(&second.values)?);
    let s1 = stats::sample_std_dev(&first.values).unwrap_or(0.0);
    let s2 = stats::sample_std_dev(&second.values).unwrap_or(0.0);
    let df = n1 + n2 - 2.0;
    let pooled_var = ((n1 - 1.0) * s1.powi(2) + (n2 - 1.0) * s2.powi(2)) / df;
    if pooled_var == 0.0 {
        return Err(insufficient("both groups have zero variance"));
    }
    let se = (pooled_var * (1.0 / n1 + 1.0 / n2)).sqrt();
    let diff = m1 - m2;
    let t = diff / se;
    let d = diff / pooled_var.sqrt();
    let p_value = two_sided_p(t, df)?;
    let margin = t_critical(alpha, df)? * se;

    let mut group_statistics = BTreeMap::new();
    for (group, mean, sd) in [(first, m1, s1), (second, m2, s2)] {
        group_statistics.insert(format!("group_{}_mean", group.label), mean);
        group_statistics.insert(format!("group_{}_std", group.label), sd);
        group_statistics.insert(format!("group_{}_n", group.label), group.values.len() as f64);
    }

    Ok(TestResult {
        test_name: "Independent Samples t-Test".to_string(),
        statistic: t,
        degrees_of_freedom: df,
        p_value,
        confidence_interval: Some((diff - margin, diff + margin)),
        effect_size: d,
        interpretation: interpret(p_value, alpha, "independent samples t-test", Some(d)),
        sample_size: first.values.len() + second.values.len(),
        group_statistics,
    })
}

pub fn paired_t_test(
    first_name: &str,
    first: &[f64],
    second_name: &str,
    second: &[f64],
    alpha: f64,
) -> Result<TestResult> {
    let differences: Vec<f64> = first.iter().zip(second).map(|(a, b)| a - b).collect();
    let n = require_at_least(&differences, 2, "need at least 2 complete pairs")?;
    let mean_diff = mean_of(&differences)?;
    let sd_diff = sample_sd(&differences)?;
    let df = n - 1.0;
    let se = sd_diff / n.sqrt();
    let t = mean_diff / se;
    let d = mean_diff / sd_diff;
    let p_value = two_sided_p(t, df)?;
    let margin = t_critical(alpha, df)? * se;

    let mut group_statistics = BTreeMap::from([
        ("difference_mean".to_string(), mean_diff),
        ("difference_std".to_string(), sd_diff),
    ]);
    for (name, values) in [(first_name, first), (second_name, second)] {
        group_statistics.insert(format!("{name}_mean"), mean_of(values)?);
        group_statistics.insert(format!("{name}_std"), stats::sample_std_dev(values).unwrap_or(0.0));
    }

    Ok(TestResult {
        test_name: "Paired Samples t-Test".to_string(),
        statistic: t,
        degrees_of_freedom: df,
        p_value,
        confidence_interval: Some((mean_diff - margin, mean_diff + margin)),
        effect_size: d,
        interpretation: interpret(p_value, alpha, "paired samples t-test", Some(d)),
        sample_size: differences.len(),
        group_statistics,
    })
}

pub fn one_way_anova(groups: &[Group], alpha: f64) -> Result<TestResult> {
    if groups.len() < 2 {
        return Err(insufficient("ANOVA requires at least 2 groups"));
    }
    let mut group_statistics = BTreeMap::new();
    for group in groups {
        if group.values.len() < 2 {
            return Err(insufficient(format!(
                "group '{}' has fewer than 2 valid values",
                group.label
            )));
        }
        group_statistics.insert(format!("group_{}_mean", group.label), mean_of(&group.values)?);
        group_statistics.insert(
            format!("group_{}_std", group.label),
            stats::sample_std_dev(&group.values).unwrap_or(0.0),
        );
        group_statistics.insert(format!("group_{}_n", group.label), group.values.len() as f64);
    }

    let all: Vec<f64> = groups.iter().flat_map(|g| g.values.iter().copied()).collect();
    let grand_mean = mean_of(&all)?;
    let ss_total: f64 = all.iter().map(|v| (v - grand_mean).powi(2)).sum();
    let mut ss_between = 0.0;
    for group in groups {
        ss_between += group.values.len() as f64 * (mean_of(&group.values)? - grand_mean).powi(2);
    }
    let ss_within = ss_total - ss_between;
    let df_between = (groups.len() - 1) as f64;
    let df_within = (all.len() - groups.len()) as f64;
    if ss_within <= 0.0 {
        return Err(insufficient("no variance within groups"));
    }
    let f = (ss_between / df_between) / (ss_within / df_within);
    let distribution = FisherSnedecor::new(df_between, df_within)
        .map_err(|e| BatchError::Statistics(e.to_string()))?;
    let p_value = distribution.sf(f);
    let eta_squared = if ss_total > 0.0 { ss_between / ss_total } else { 0.0 };

    Ok(TestResult {
        test_name: "One-Way ANOVA".to_string(),
        statistic: f,
        degrees_of_freedom: df_between,
        p_value,
        confidence_interval: None,
        effect_size: eta_squared,
        interpretation: interpret(p_value, alpha, "one-way ANOVA", Some(eta_squared)),
        sample_size: all.len(),
        group_statistics,
    })
}

/// Plain-language reading of a result.
pub fn interpret(p_value: f64, alpha: f64, test_name: &str, effect_size: Option<f64>) -> String {
    let significant = p_value < alpha;
    let mut text = format!(
        "The {test_name} {} statistically significant at the α = {alpha} level (p = {p_value:.4}).",
        if significant { "is" } else { "is not" }
    );
    if !significant {
        text.push_str(" We fail to reject the null hypothesis.");
        return text;
    }
    text.push_str(" We reject the null hypothesis.");
    if let Some(d) = effect_size {
        let magnitude = if d.abs() < 0.2 {
            "small"
        } else if d.abs() < 0.8 {
            "medium"
        } else {
            "large"
        };
        text.push_str(&format!(" The effect size is {magnitude} (d = {d:.3})."));
    }
    text
}

fn numbers(rows: &[Record], column: &str) -> Vec<f64> {
    rows.iter()
        .filter_map(|r| r.get(column)?.as_f64())
        .collect()
}

/// Numeric values split by group label, groups in first-seen order.
fn grouped_numbers(rows: &[Record], column: &str, group_column: &str) -> Vec<Group> {
    let mut groups: Vec<Group> = Vec::new();
    for row in rows {
        let Some(label) = row.get(group_column).filter(|v| !v.is_missing()) else {
            continue;
        };
        let label = label.to_display_string();
        let slot = match groups.iter().position(|g| g.label == label) {
            Some(slot) => slot,
            None => {
                groups.push(Group {
                    label,
                    values: Vec::new(),
                });
                groups.len() - 1
            }
        };
        if let Some(n) = row.get(column).and_then(|v| v.as_f64()) {
            groups[slot].values.push(n);
        }
    }
    groups
}

fn insufficient(message: impl Into<String>) -> BatchError {
    BatchError::Statistics(message.into())
}

fn require_at_least(values: &[f64], min: usize, message: &str) -> Result<f64> {
    if values.len() < min {
        return Err(insufficient(format!("{message}, got {}", values.len())));
    }
    Ok(values.len() as f64)
}

fn mean_of(values: &[f64]) -> Result<f64> {
    stats::mean(values).ok_or_else(|| insufficient("no values"))
}

fn sample_sd(values: &[f64]) -> Result<f64> {
    match stats::sample_std_dev(values) {
        Some(sd) if sd > 0.0 => Ok(sd),
        _ => Err(insufficient("values have zero variance")),
    }
}

fn students_t(df: f64) -> Result<StudentsT> {
    StudentsT::new(0.0, 1.0, df).map_err(|e| BatchError::Statistics(e.to_string()))
}

fn two_sided_p(t: f64, df: f64) -> Result<f64> {
    Ok((2.0 * students_t(df)?.sf(t.abs())).min(1.0))
}

fn t_critical(alpha: f64, df: f64) -> Result<f64> {
    Ok(students_t(df)?.inverse_cdf(1.0 - alpha / 2.0))
}

#[cfg(test)]
mod tests {
    use datasnap_model::Value;

    use super::*;

    fn close(a: f64, b: f64, tolerance: f64) -> bool {
        (a - b).abs() < tolerance
    }

    fn group(label: &str, values: &[f64]) -> Group {
        Group {
            label: label.to_string(),
            values: values.to_vec(),
        }
    }

    #[test]
    fn test_one_sample() {
        let result = one_sample_t_test(&[5.1, 4.9, 5.6, 5.8, 6.0, 5.5], 5.0, 0.05).unwrap();
        // mean 5.4833, sd 0.4167, t = 0.4833 / (0.4167 / sqrt 6)
        assert!(close(result.statistic, 2.841, 1e-2));
        assert_eq!(result.degrees_of_freedom, 5.0);
        assert!(result.p_value > 0.02 && result.p_value < 0.05);
        let (low, high) = result.confidence_interval.unwrap();
        assert!(low > 0.0 && high > low);
        assert!(result.interpretation.contains("We reject the null hypothesis."));
        assert!(result.interpretation.contains("large"));
    }

    #[test]
    fn test_one_sample_needs_two_values() {
        let error = one_sample_t_test(&[1.0], 0.0, 0.05).unwrap_err();
        assert!(error.to_string().contains("at least 2"));
    }

    #[test]
    fn test_independent_pooled() {
        let a = group("a", &[1.0, 2.0, 3.0, 4.0, 5.0]);
        let b = group("b", &[3.0, 4.0, 5.0, 6.0, 7.0]);
        let result = independent_t_test(&a, &b, 0.05).unwrap();
        // pooled sd = sqrt(2.5), se = 1, t = -2
        assert!(close(result.statistic, -2.0, 1e-9));
        assert_eq!(result.degrees_of_freedom, 8.0);
        assert!(close(result.p_value, 0.0805, 1e-3));
        assert!(close(result.effect_size, -2.0 / 2.5_f64.sqrt(), 1e-9));
        assert!(!result.is_significant(0.05));
        assert!(result.interpretation.contains("fail to reject"));
        assert_eq!(result.group_statistics["group_a_n"], 5.0);
    }

    #[test]
    fn test_paired() {
        let before = [10.0, 12.0, 9.0, 11.0];
        let after = [11.0, 14.0, 10.0, 13.0];
        let result = paired_t_test("before", &before, "after", &after, 0.05).unwrap();
        // differences -1, -2, -1, -2: mean -1.5, sd 0.5774
        assert!(close(result.statistic, -5.196, 1e-3));
        assert_eq!(result.sample_size, 4);
        assert!(result.p_value < 0.05);
        assert_eq!(result.group_statistics["before_mean"], 10.5);
    }

    #[test]
    fn test_anova() {
        let groups = [
            group("a", &[1.0, 2.0, 3.0]),
            group("b", &[4.0, 5.0, 6.0]),
            group("c", &[7.0, 8.0, 9.0]),
        ];
        let result = one_way_anova(&groups, 0.05).unwrap();
        // ss_between 54, ss_within 6: F = 27 / 1
        assert!(close(result.statistic, 27.0, 1e-9));
        assert_eq!(result.degrees_of_freedom, 2.0);
        assert!(close(result.effect_size, 0.9, 1e-9));
        assert!(result.p_value < 0.01);
        assert!(result.confidence_interval.is_none());
    }

    #[test]
    fn test_tests_read_from_rows() {
        let rows: Vec<Record> = [("x", 1.0), ("y", 2.0), ("x", 2.0), ("y", 4.0), ("x", 3.0), ("y", 5.0)]
            .iter()
            .map(|(g, v)| {
                Record::from([
                    ("group".to_string(), Value::text(*g)),
                    ("score".to_string(), Value::text(v.to_string())),
                ])
            })
            .collect();
        let test: HypothesisTest = serde_json::from_str(
            r#"{"test": "independent_t", "column": "score", "group_column": "group"}"#,
        )
        .unwrap();
        let result = run_test(&rows, &test).unwrap();
        assert_eq!(result.sample_size, 6);
        assert!(result.group_statistics.contains_key("group_x_mean"));

        let many_groups = HypothesisTest::IndependentT {
            column: "score".to_string(),
            group_column: "score".to_string(),
            alpha: DEFAULT_ALPHA,
        };
        assert!(matches!(run_test(&rows, &many_groups), Err(BatchError::Statistics(_))));
    }

    #[test]
    fn test_interpretation_text() {
        assert_eq!(
            interpret(0.2, 0.05, "one-way ANOVA", Some(0.1)),
            "The one-way ANOVA is not statistically significant at the α = 0.05 level (p = 0.2000). \
             We fail to reject the null hypothesis."
        );
        assert!(interpret(0.01, 0.05, "paired samples t-test", Some(0.5)).ends_with("medium (d = 0.500)."));
    }
}
