//! Row-by-row evaluation of validation rules.

use std::collections::{BTreeSet, HashSet};

use datasnap_model::{Record, RuleKind, Severity, ValidationRule, Value};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{BatchError, Result};

/// One rule violation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationIssue {
    /// Zero-based row index in the input.
    pub row: usize,
    pub column: String,
    pub rule: String,
    pub severity: Severity,
    pub message: String,
    pub value: Value,
}

/// Violation count of one rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSummary {
    pub column: String,
    pub rule: String,
    pub severity: Severity,
    pub violations: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub total_rows: usize,
    /// Rows without error-severity violations.
    pub valid_rows: usize,
    pub invalid_rows: usize,
    pub issues: Vec<ValidationIssue>,
    pub rules: Vec<RuleSummary>,
}

/// Evaluate `rules` against every row.
///
/// # Errors
///
/// Returns [`BatchError::Processing`] when a format rule holds an invalid regex.
pub fn validate_rows(rows: &[Record], rules: &[ValidationRule]) -> Result<ValidationReport> {
    let mut validator = Validator::new(rules)?;
    validator.validate_chunk(rows);
    Ok(validator.finish())
}

/// Compiled rules plus the state carried between chunks.
#[derive(Debug)]
pub struct Validator {
    rules: Vec<CompiledRule>,
    next_row: usize,
    invalid: BTreeSet<usize>,
    issues: Vec<ValidationIssue>,
}

#[derive(Debug)]
struct CompiledRule {
    rule: ValidationRule,
    regex: Option<Regex>,
    seen: HashSet<String>,
    violations: usize,
}

impl Validator {
    pub fn new(rules: &[ValidationRule]) -> Result<Self> {
        let rules = rules
            .iter()
            .map(|rule| {
                let regex = match &rule.kind {
                    RuleKind::Format { pattern } => Some(Regex::new(pattern).map_err(|e| {
                        BatchError::Processing(format!(
                            "invalid format rule for '{}': {e}",
                            rule.column
                        ))
                    })?),
                    _ => None,
                };
                Ok(CompiledRule {
                    rule: rule.clone(),
                    regex,
                    seen: HashSet::new(),
                    violations: 0,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            rules,
            next_row: 0,
            invalid: BTreeSet::new(),
            issues: Vec::new(),
        })
    }

    /// Validate the next rows; row indexes continue from the previous chunk.
    pub fn validate_chunk(&mut self, chunk: &[Record]) {
        for row in chunk {
            let index = self.next_row;
            self.next_row += 1;
            for compiled in &mut self.rules {
                let value = row.get(&compiled.rule.column).cloned().unwrap_or_default();
                if let Some(message) = compiled.check(&value) {
                    compiled.violations += 1;
                    if compiled.rule.severity == Severity::Error {
                        self.invalid.insert(index);
                    }
                    self.issues.push(ValidationIssue {
                        row: index,
                        column: compiled.rule.column.clone(),
                        rule: compiled.rule.kind.name().to_string(),
                        severity: compiled.rule.severity,
                        message,
                        value,
                    });
                }
            }
        }
    }

    pub fn finish(self) -> ValidationReport {
        let total_rows = self.next_row;
        ValidationReport {
            total_rows,
            valid_rows: total_rows - self.invalid.len(),
            invalid_rows: self.invalid.len(),
            issues: self.issues,
            rules: self
                .rules
                .into_iter()
                .map(|c| RuleSummary {
                    column: c.rule.column,
                    rule: c.rule.kind.name().to_string(),
                    severity: c.rule.severity,
                    violations: c.violations,
                })
                .collect(),
        }
    }
}

impl CompiledRule {
    /// Violation message, or `None` when the value passes.
    fn check(&mut self, value: &Value) -> Option<String> {
        if value.is_missing() {
            return matches!(self.rule.kind, RuleKind::Required)
                .then(|| format!("'{}' is required", self.rule.column));
        }
        let text = value.to_display_string();
        match &self.rule.kind {
            RuleKind::Range { min, max } => match value.as_f64() {
                Some(n) if n >= *min && n <= *max => None,
                Some(n) => Some(format!("{n} is outside [{min}, {max}]")),
                None => Some(format!("'{text}' is not a number")),
            },
            RuleKind::Format { .. } => match &self.regex {
                Some(re) if !re.is_match(&text) => {
                    Some(format!("'{text}' does not match the expected format"))
                }
                _ => None,
            },
            RuleKind::Enum { values } => (!values.contains(&text))
                .then(|| format!("'{text}' is not an allowed value")),
            RuleKind::Length { min, max } => {
                let len = text.chars().count();
                (len < *min || len > *max)
                    .then(|| format!("length {len} is outside [{min}, {max}]"))
            }
            RuleKind::Required => None,
            RuleKind::Uniqueness => (!self.seen.insert(text.clone()))
                .then(|| format!("'{text}' is a duplicate")),
        }
    }
}
