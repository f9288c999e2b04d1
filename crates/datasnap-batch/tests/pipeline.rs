//! Row-level pipelines used without a scheduler.

use datasnap_batch::{
    BatchConfig, DataFormat, InsightKind, StepKind, TransformStep, analyze_table, export_rows,
    import_rows, process_data_cleaning, process_data_transformation, profile_table, validate_rows,
};
use datasnap_model::{Record, RuleKind, Severity, ValidationRule, Value};

fn record(pairs: &[(&str, &str)]) -> Record {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), Value::text(*v)))
        .collect()
}

#[test]
fn cleaning_removes_duplicate_and_counts_nulls() {
    let rows = vec![record(&[("a", "1"), ("b", "")]), record(&[("a", "1"), ("b", "")])];
    let mut reports = 0;
    let result = process_data_cleaning(&rows, &BatchConfig::default(), |_| reports += 1);

    assert_eq!(result.rows.len(), 1);
    assert_eq!(result.report.duplicates_removed, 1);
    assert_eq!(result.report.nulls_handled, 2);
    assert_eq!(result.report.total_rows, 2);
    assert_eq!(result.report.valid_rows, 1);
    assert_eq!(reports, 1);
}

#[test]
fn transformation_steps_from_json() {
    let csv = "region,amount\nnorth,10\nsouth,5\nnorth,7\neast,1\n";
    let rows = import_rows(csv, DataFormat::Csv).unwrap();
    let steps: Vec<TransformStep> = serde_json::from_str(
        r#"[
            {"id": "1", "name": "drop small", "type": "filter",
             "column": "amount", "operator": "greater", "value": 2},
            {"id": "2", "name": "totals", "type": "aggregate",
             "group_by": ["region"],
             "aggregations": [{"column": "amount", "function": "sum"}]},
            {"id": "3", "name": "order", "type": "sort",
             "column": "amount_sum", "direction": "desc"}
        ]"#,
    )
    .unwrap();
    assert!(matches!(steps[0].kind, StepKind::Filter { .. }));

    let mut snapshots = Vec::new();
    let out = process_data_transformation(rows, &steps, |p| snapshots.push(p.percentage));

    assert_eq!(out.len(), 2);
    assert_eq!(out[0]["region"], Value::text("north"));
    assert_eq!(out[0]["amount_sum"], Value::Number(17.0));
    assert_eq!(snapshots.last(), Some(&100.0));
    assert_eq!(snapshots.len(), 4);
}

#[test]
fn validation_reports_rule_violations() {
    let rows = vec![
        record(&[("email", "a@example.com"), ("age", "30")]),
        record(&[("email", "broken"), ("age", "200")]),
        record(&[("email", ""), ("age", "41")]),
    ];
    let rules = vec![
        ValidationRule::new("age", RuleKind::Range { min: 0.0, max: 120.0 }, Severity::Error, "age"),
        ValidationRule::new("email", RuleKind::Required, Severity::Error, "required"),
    ];
    let report = validate_rows(&rows, &rules).unwrap();
    assert_eq!(report.total_rows, 3);
    assert_eq!(report.invalid_rows, 2);
    assert_eq!(report.valid_rows, 1);
}

#[test]
fn profile_and_insights_over_imported_csv() {
    let mut csv = String::from("score,grade\n");
    for i in 0..19 {
        let grade = if i < 15 { "A" } else { "B" };
        csv.push_str(&format!("{},{grade}\n", 10 + i % 3));
    }
    csv.push_str("500,\n");
    let rows = import_rows(&csv, DataFormat::Csv).unwrap();

    let profile = profile_table(&rows);
    assert_eq!(profile.row_count, 20);
    let score = profile.column("score").unwrap();
    let numeric = score.numeric.as_ref().unwrap();
    assert_eq!(numeric.anomalies.len(), 1);
    assert_eq!(numeric.anomalies[0].row, 19);

    let report = analyze_table(&rows);
    let kinds: Vec<InsightKind> = report.insights.iter().map(|i| i.kind).collect();
    assert!(kinds.contains(&InsightKind::MissingData));
    assert!(kinds.contains(&InsightKind::Outliers));
    assert!(kinds.contains(&InsightKind::DominantCategory));
}

#[test]
fn export_then_import_keeps_cells() {
    let rows = vec![record(&[("a", "1"), ("b", "x,y")]), record(&[("a", "2")])];
    let text = export_rows(&rows, DataFormat::Csv).unwrap();
    assert_eq!(text, "a,b\n1,\"x,y\"\n2,\n");
    let back = import_rows(&text, DataFormat::Csv).unwrap();
    assert_eq!(back[0]["b"], Value::text("x,y"));
    assert_eq!(back[1]["b"], Value::text(""));
}
