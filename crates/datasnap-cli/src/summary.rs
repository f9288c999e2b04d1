//! Terminal tables for command results.

use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use datasnap_batch::{
    AnalysisReport, ColumnKind, DatasetProfile, InsightPriority, QualityReport, ValidationReport,
};
use datasnap_infer::InferenceSession;
use datasnap_model::{Record, Severity, format_numeric, table_columns};

/// Validation issues listed before the table is cut off.
const MAX_ISSUE_ROWS: usize = 25;

/// Rows shown when printing a table preview.
const PREVIEW_ROWS: usize = 10;

pub fn print_inference(session: &InferenceSession) {
    println!("Dataset: {}", session.dataset_id);
    println!("Session: {} ({})", session.id, session.status);
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Column"),
        header_cell("Type"),
        header_cell("Confidence"),
        header_cell("Original"),
        header_cell("Convertible"),
        header_cell("Rules"),
        header_cell("Reasoning"),
    ]);
    apply_summary_table_style(&mut table);
    align_column(&mut table, 2, CellAlignment::Right);
    align_column(&mut table, 4, CellAlignment::Right);
    for inference in &session.inferences {
        let confidence = Cell::new(format!("{:.2}", inference.confidence));
        let confidence = if inference.needs_review {
            confidence.fg(Color::Yellow).add_attribute(Attribute::Bold)
        } else {
            confidence.fg(Color::Green)
        };
        let rules: Vec<&str> = inference
            .validation_rules
            .iter()
            .map(|rule| rule.kind.name())
            .collect();
        table.add_row(vec![
            Cell::new(&inference.column).fg(Color::Cyan),
            Cell::new(inference.suggested_type),
            confidence,
            dim_cell(inference.original_type),
            Cell::new(format!(
                "{:.0}%",
                inference.conversion_preview.conversion_rate * 100.0
            )),
            Cell::new(rules.join(", ")),
            Cell::new(&inference.reasoning),
        ]);
    }
    println!("{table}");
    let review = session.low_confidence_columns();
    if !review.is_empty() {
        println!("Needs review: {}", review.join(", "));
    }
}

pub fn print_quality(report: &QualityReport) {
    let mut table = key_value_table();
    table.add_row(vec![label_cell("Rows in"), Cell::new(report.total_rows)]);
    table.add_row(vec![label_cell("Rows out"), Cell::new(report.valid_rows)]);
    table.add_row(vec![
        label_cell("Duplicates removed"),
        count_cell(report.duplicates_removed, Color::Yellow),
    ]);
    table.add_row(vec![
        label_cell("Nulls handled"),
        count_cell(report.nulls_handled, Color::Yellow),
    ]);
    table.add_row(vec![
        label_cell("Type conversions"),
        Cell::new(report.type_conversions),
    ]);
    table.add_row(vec![
        label_cell("Quality score"),
        Cell::new(format!("{:.1}", report.quality_score)).add_attribute(Attribute::Bold),
    ]);
    println!("{table}");
    for issue in &report.issues {
        println!("- {}", issue.description);
    }
}

pub fn print_validation(report: &ValidationReport) {
    println!(
        "Rows: {} valid, {} invalid of {}",
        report.valid_rows, report.invalid_rows, report.total_rows
    );
    let mut rules = Table::new();
    rules.set_header(vec![
        header_cell("Column"),
        header_cell("Rule"),
        header_cell("Severity"),
        header_cell("Violations"),
    ]);
    apply_table_style(&mut rules);
    align_column(&mut rules, 3, CellAlignment::Right);
    for summary in &report.rules {
        rules.add_row(vec![
            Cell::new(&summary.column),
            Cell::new(&summary.rule),
            severity_cell(summary.severity),
            count_cell(summary.violations, Color::Red),
        ]);
    }
    println!("{rules}");

    if report.issues.is_empty() {
        return;
    }
    let mut issues = Table::new();
    issues.set_header(vec![
        header_cell("Row"),
        header_cell("Column"),
        header_cell("Severity"),
        header_cell("Message"),
    ]);
    apply_table_style(&mut issues);
    align_column(&mut issues, 0, CellAlignment::Right);
    for issue in report.issues.iter().take(MAX_ISSUE_ROWS) {
        issues.add_row(vec![
            Cell::new(issue.row + 1),
            Cell::new(&issue.column),
            severity_cell(issue.severity),
            Cell::new(&issue.message),
        ]);
    }
    println!();
    println!("Issues:");
    println!("{issues}");
    if report.issues.len() > MAX_ISSUE_ROWS {
        println!("... and {} more", report.issues.len() - MAX_ISSUE_ROWS);
    }
}

pub fn print_profile(profile: &DatasetProfile) {
    println!("Rows: {}  Columns: {}", profile.row_count, profile.column_count);
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Column"),
        header_cell("Kind"),
        header_cell("Count"),
        header_cell("Missing"),
        header_cell("Unique"),
        header_cell("Mean"),
        header_cell("Median"),
        header_cell("Min"),
        header_cell("Max"),
        header_cell("Anomalies"),
        header_cell("Top values"),
    ]);
    apply_summary_table_style(&mut table);
    for index in 2..=9 {
        align_column(&mut table, index, CellAlignment::Right);
    }
    for column in &profile.columns {
        let kind = match column.kind {
            ColumnKind::Numeric => "numeric",
            ColumnKind::Categorical => "categorical",
        };
        let number = |value: Option<f64>| value.map_or_else(|| dim_cell("-"), |v| Cell::new(format_numeric(round2(v))));
        let numeric = column.numeric.as_ref();
        let top: Vec<String> = column
            .top_categories
            .iter()
            .map(|c| format!("{} ({})", c.value, c.count))
            .collect();
        table.add_row(vec![
            Cell::new(&column.column).fg(Color::Cyan),
            Cell::new(kind),
            Cell::new(column.count),
            count_cell(column.missing, Color::Yellow),
            Cell::new(column.unique),
            number(numeric.map(|n| n.mean)),
            number(numeric.map(|n| n.median)),
            number(numeric.map(|n| n.min)),
            number(numeric.map(|n| n.max)),
            count_cell(numeric.map_or(0, |n| n.anomalies.len()), Color::Red),
            Cell::new(top.join(", ")),
        ]);
    }
    println!("{table}");
}

pub fn print_analysis(report: &AnalysisReport) {
    let summary = &report.summary;
    println!(
        "Rows: {}  Columns: {} ({} numeric, {} categorical)  Missing cells: {}",
        summary.rows,
        summary.columns,
        summary.numeric_columns,
        summary.categorical_columns,
        summary.total_missing
    );
    if report.insights.is_empty() {
        println!("No insights.");
    } else {
        print_insights(report);
    }
    print_chart_suggestions(report);
    print_test_results(report);
}

fn print_insights(report: &AnalysisReport) {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Priority"),
        header_cell("Insight"),
        header_cell("Columns"),
        header_cell("Confidence"),
        header_cell("Details"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 3, CellAlignment::Right);
    for insight in &report.insights {
        table.add_row(vec![
            priority_cell(insight.priority),
            Cell::new(&insight.title).add_attribute(Attribute::Bold),
            Cell::new(insight.columns.join(", ")),
            Cell::new(format!("{:.2}", insight.confidence)),
            Cell::new(&insight.description),
        ]);
    }
    println!("{table}");
}

fn print_chart_suggestions(report: &AnalysisReport) {
    if report.chart_suggestions.is_empty() {
        return;
    }
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Chart"),
        header_cell("Confidence"),
        header_cell("Columns"),
        header_cell("Reason"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    for suggestion in &report.chart_suggestions {
        table.add_row(vec![
            Cell::new(suggestion.chart_type.as_str()).add_attribute(Attribute::Bold),
            Cell::new(format!("{:.2}", suggestion.confidence)),
            Cell::new(suggestion.required_columns.join(", ")),
            dim_cell(&suggestion.reason),
        ]);
    }
    println!("{table}");
}

fn print_test_results(report: &AnalysisReport) {
    for result in &report.tests {
        let mut table = key_value_table();
        table.add_row(vec![label_cell("Test"), Cell::new(&result.test_name)]);
        table.add_row(vec![label_cell("Statistic"), Cell::new(format!("{:.4}", result.statistic))]);
        table.add_row(vec![
            label_cell("Degrees of freedom"),
            Cell::new(format_numeric(result.degrees_of_freedom)),
        ]);
        table.add_row(vec![label_cell("p-value"), Cell::new(format!("{:.4}", result.p_value))]);
        if let Some((low, high)) = result.confidence_interval {
            table.add_row(vec![
                label_cell("Confidence interval"),
                Cell::new(format!("[{low:.4}, {high:.4}]")),
            ]);
        }
        table.add_row(vec![label_cell("Effect size"), Cell::new(format!("{:.3}", result.effect_size))]);
        table.add_row(vec![label_cell("Sample size"), Cell::new(result.sample_size)]);
        println!("{table}");
        println!("{}", result.interpretation);
    }
}

/// First rows of a table, for commands run without `--output`.
pub fn print_rows(rows: &[Record]) {
    let columns = table_columns(rows);
    let mut table = Table::new();
    table.set_header(columns.iter().map(header_cell).collect::<Vec<_>>());
    apply_table_style(&mut table);
    for row in rows.iter().take(PREVIEW_ROWS) {
        table.add_row(
            columns
                .iter()
                .map(|c| row.get(c).map_or_else(|| dim_cell("-"), |v| Cell::new(v.to_display_string())))
                .collect::<Vec<_>>(),
        );
    }
    println!("{table}");
    if rows.len() > PREVIEW_ROWS {
        println!("... {} rows total", rows.len());
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn header_cell(text: impl ToString) -> Cell {
    Cell::new(text.to_string())
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn label_cell(text: &str) -> Cell {
    Cell::new(text).add_attribute(Attribute::Bold)
}

fn dim_cell(text: impl ToString) -> Cell {
    Cell::new(text.to_string())
        .fg(Color::DarkGrey)
        .add_attribute(Attribute::Dim)
}

fn count_cell(count: usize, color: Color) -> Cell {
    if count > 0 {
        Cell::new(count).fg(color).add_attribute(Attribute::Bold)
    } else {
        dim_cell(count)
    }
}

fn severity_cell(severity: Severity) -> Cell {
    let color = match severity {
        Severity::Error => Color::Red,
        Severity::Warning => Color::Yellow,
        Severity::Info => Color::Blue,
    };
    Cell::new(severity.label()).fg(color)
}

fn priority_cell(priority: InsightPriority) -> Cell {
    let (label, color) = match priority {
        InsightPriority::Critical => ("critical", Color::Red),
        InsightPriority::High => ("high", Color::Yellow),
        InsightPriority::Medium => ("medium", Color::Blue),
        InsightPriority::Low => ("low", Color::DarkGrey),
    };
    Cell::new(label).fg(color).add_attribute(Attribute::Bold)
}

fn key_value_table() -> Table {
    let mut table = Table::new();
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    table
}

fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::DynamicFullWidth)
        .set_width(165);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}
