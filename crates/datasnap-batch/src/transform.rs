//! Row-set transformation steps: filter, map, sort, aggregate.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use datasnap_model::{Record, Table, Value};
use serde::{Deserialize, Serialize};

use crate::progress::{BatchProgress, ProgressTracker};

/// One configured step of a transformation job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformStep {
    pub id: String,
    pub name: String,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    #[serde(flatten)]
    pub kind: StepKind,
}

fn enabled_by_default() -> bool {
    true
}

impl TransformStep {
    pub fn new(name: impl Into<String>, kind: StepKind) -> Self {
        let name = name.into();
        Self {
            id: name.to_lowercase().replace(' ', "_"),
            name,
            enabled: true,
            kind,
        }
    }

    #[must_use]
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StepKind {
    /// Keep rows where `column <operator> value` holds.
    Filter {
        column: String,
        operator: FilterOperator,
        value: Value,
    },
    /// Rename fields; unmapped fields pass through.
    Map { mapping: BTreeMap<String, String> },
    /// Stable single-column sort, missing values last.
    Sort {
        column: String,
        #[serde(default)]
        direction: SortDirection,
    },
    /// Group rows and compute one output field per aggregation.
    Aggregate {
        group_by: Vec<String>,
        aggregations: Vec<Aggregation>,
    },
    /// A step kind this pipeline does not know; rows pass through.
    #[serde(other)]
    Unsupported,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOperator {
    Equals,
    NotEquals,
    Greater,
    Less,
    Contains,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregateFunction {
    Sum,
    Avg,
    Count,
    Min,
    Max,
}

impl AggregateFunction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sum => "sum",
            Self::Avg => "avg",
            Self::Count => "count",
            Self::Min => "min",
            Self::Max => "max",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Aggregation {
    pub column: String,
    pub function: AggregateFunction,
}

impl Aggregation {
    pub fn new(column: impl Into<String>, function: AggregateFunction) -> Self {
        Self {
            column: column.into(),
            function,
        }
    }

    /// Name of the output field, `<column>_<function>`.
    pub fn output_column(&self) -> String {
        format!("{}_{}", self.column, self.function.as_str())
    }
}

/// Apply the enabled steps in order, reporting once per step.
pub fn process_data_transformation(
    rows: Table,
    steps: &[TransformStep],
    mut on_progress: impl FnMut(&BatchProgress),
) -> Table {
    let enabled = enabled_steps(steps);
    let mut tracker = ProgressTracker::new(
        rows.len(),
        enabled.iter().map(|s| s.name.clone()).collect(),
    );
    let mut rows = rows;
    for step in enabled {
        on_progress(tracker.snapshot());
        rows = apply_step(rows, &step.kind);
        tracker.step();
    }
    on_progress(tracker.complete());
    rows
}

pub(crate) fn enabled_steps(steps: &[TransformStep]) -> Vec<&TransformStep> {
    steps.iter().filter(|s| s.enabled).collect()
}

/// Apply one step to the rows.
pub fn apply_step(rows: Table, kind: &StepKind) -> Table {
    match kind {
        StepKind::Filter {
            column,
            operator,
            value,
        } => rows
            .into_iter()
            .filter(|row| matches_filter(row.get(column).unwrap_or(&Value::Null), *operator, value))
            .collect(),
        StepKind::Map { mapping } => rows
            .into_iter()
            .map(|row| rename_fields(row, mapping))
            .collect(),
        StepKind::Sort { column, direction } => sort_rows(rows, column, *direction),
        StepKind::Aggregate {
            group_by,
            aggregations,
        } => aggregate(&rows, group_by, aggregations),
        StepKind::Unsupported => rows,
    }
}

fn matches_filter(actual: &Value, operator: FilterOperator, expected: &Value) -> bool {
    match operator {
        FilterOperator::Equals => compare(actual, expected) == Ordering::Equal,
        FilterOperator::NotEquals => compare(actual, expected) != Ordering::Equal,
        FilterOperator::Greater => compare(actual, expected) == Ordering::Greater,
        FilterOperator::Less => compare(actual, expected) == Ordering::Less,
        FilterOperator::Contains => actual
            .to_display_string()
            .contains(&expected.to_display_string()),
    }
}

/// Numeric order when both sides are numbers, text order otherwise.
fn compare(a: &Value, b: &Value) -> Ordering {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        _ => a.to_display_string().cmp(&b.to_display_string()),
    }
}

fn rename_fields(row: Record, mapping: &BTreeMap<String, String>) -> Record {
    row.into_iter()
        .map(|(key, value)| match mapping.get(&key) {
            Some(renamed) => (renamed.clone(), value),
            None => (key, value),
        })
        .collect()
}

fn sort_rows(mut rows: Table, column: &str, direction: SortDirection) -> Table {
    rows.sort_by(|a, b| {
        let a = a.get(column).filter(|v| !v.is_missing());
        let b = b.get(column).filter(|v| !v.is_missing());
        match (a, b) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Greater,
            (Some(_), None) => Ordering::Less,
            (Some(a), Some(b)) => match direction {
                SortDirection::Asc => compare(a, b),
                SortDirection::Desc => compare(b, a),
            },
        }
    });
    rows
}

fn aggregate(rows: &[Record], group_by: &[String], aggregations: &[Aggregation]) -> Table {
    let mut index: HashMap<Vec<String>, usize> = HashMap::new();
    let mut groups: Vec<Vec<&Record>> = Vec::new();
    for row in rows {
        let key: Vec<String> = group_by
            .iter()
            .map(|c| row.get(c).map(Value::to_display_string).unwrap_or_default())
            .collect();
        let slot = *index.entry(key).or_insert_with(|| {
            groups.push(Vec::new());
            groups.len() - 1
        });
        groups[slot].push(row);
    }

    groups
        .into_iter()
        .map(|members| {
            let mut out = Record::new();
            if let Some(first) = members.first() {
                for column in group_by {
                    out.insert(
                        column.clone(),
                        first.get(column).cloned().unwrap_or_default(),
                    );
                }
            }
            for aggregation in aggregations {
                out.insert(
                    aggregation.output_column(),
                    aggregate_column(&members, aggregation),
                );
            }
            out
        })
        .collect()
}

fn aggregate_column(members: &[&Record], aggregation: &Aggregation) -> Value {
    let present: Vec<&Value> = members
        .iter()
        .filter_map(|row| row.get(&aggregation.column))
        .filter(|v| !v.is_missing())
        .collect();
    let numbers: Vec<f64> = present.iter().filter_map(|v| v.as_f64()).collect();
    match aggregation.function {
        AggregateFunction::Count => Value::from(present.len() as i64),
        AggregateFunction::Sum => Value::Number(numbers.iter().sum()),
        AggregateFunction::Avg => datasnap_common::stats::mean(&numbers).into(),
        AggregateFunction::Min => numbers.iter().copied().reduce(f64::min).into(),
        AggregateFunction::Max => numbers.iter().copied().reduce(f64::max).into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, Value)]) -> Record {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect()
    }

    fn sales() -> Table {
        vec![
            row(&[("region", "north".into()), ("amount", 10.0.into())]),
            row(&[("region", "south".into()), ("amount", "5".into())]),
            row(&[("region", "north".into()), ("amount", 30.0.into())]),
            row(&[("region", "east".into())]),
        ]
    }

    #[test]
    fn test_filter_numeric_and_text() {
        let greater = StepKind::Filter {
            column: "amount".into(),
            operator: FilterOperator::Greater,
            value: Value::Number(9.0),
        };
        assert_eq!(apply_step(sales(), &greater).len(), 2);

        let contains = StepKind::Filter {
            column: "region".into(),
            operator: FilterOperator::Contains,
            value: Value::text("th"),
        };
        assert_eq!(apply_step(sales(), &contains).len(), 3);
    }

    #[test]
    fn test_map_renames_and_passes_through() {
        let step = StepKind::Map {
            mapping: BTreeMap::from([("amount".to_string(), "total".to_string())]),
        };
        let out = apply_step(sales(), &step);
        assert!(out[0].contains_key("total"));
        assert!(out[0].contains_key("region"));
        assert!(!out[0].contains_key("amount"));
    }

    #[test]
    fn test_sort_puts_missing_last() {
        let step = StepKind::Sort {
            column: "amount".into(),
            direction: SortDirection::Desc,
        };
        let out = apply_step(sales(), &step);
        let amounts: Vec<String> = out
            .iter()
            .map(|r| r.get("amount").map(Value::to_display_string).unwrap_or_default())
            .collect();
        assert_eq!(amounts, vec!["30", "10", "5", ""]);
    }

    #[test]
    fn test_aggregate_groups_in_first_seen_order() {
        let step = StepKind::Aggregate {
            group_by: vec!["region".into()],
            aggregations: vec![
                Aggregation::new("amount", AggregateFunction::Sum),
                Aggregation::new("amount", AggregateFunction::Count),
                Aggregation::new("amount", AggregateFunction::Avg),
            ],
        };
        let out = apply_step(sales(), &step);
        assert_eq!(out.len(), 3);
        assert_eq!(out[0]["region"], Value::text("north"));
        assert_eq!(out[0]["amount_sum"], Value::Number(40.0));
        assert_eq!(out[0]["amount_count"], Value::Number(2.0));
        assert_eq!(out[0]["amount_avg"], Value::Number(20.0));
        assert_eq!(out[2]["amount_avg"], Value::Null);
    }

    #[test]
    fn test_disabled_and_unsupported_steps_pass_through() {
        let steps = vec![
            TransformStep::new("drop all", StepKind::Filter {
                column: "region".into(),
                operator: FilterOperator::Equals,
                value: Value::text("nowhere"),
            })
            .disabled(),
            TransformStep::new("mystery", StepKind::Unsupported),
        ];
        let mut reports = Vec::new();
        let out = process_data_transformation(sales(), &steps, |p| reports.push(p.clone()));
        assert_eq!(out.len(), 4);
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].current_operation, "mystery");
        assert_eq!(reports[1].percentage, 100.0);
    }

    #[test]
    fn test_steps_deserialize_from_json() {
        let json = r#"[
            {"id": "f", "name": "Big", "type": "filter", "column": "amount", "operator": "greater", "value": 5},
            {"id": "x", "name": "Pivot", "type": "pivot"}
        ]"#;
        let steps: Vec<TransformStep> = serde_json::from_str(json).unwrap();
        assert!(steps[0].enabled);
        assert!(matches!(steps[0].kind, StepKind::Filter { .. }));
        assert_eq!(steps[1].kind, StepKind::Unsupported);
    }
}
