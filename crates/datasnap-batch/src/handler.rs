//! One handler per job type.
//!
//! Handlers do the actual work of a job and call
//! [`JobContext::checkpoint`] between chunks, steps or columns, which is
//! where pause and cancel take effect.

use datasnap_model::{Table, table_columns};

use crate::analysis::analyze_profile;
use crate::cleaning::DataCleaner;
use crate::codec::{DataFormat, export_rows, import_rows};
use crate::config::BatchConfig;
use crate::control::JobContext;
use crate::error::{BatchError, Result};
use crate::hypothesis::run_test;
use crate::job::{BatchJobType, JobInput, JobOutput};
use crate::profiling::{DatasetProfile, profile_column};
use crate::progress::{BatchProgress, ProgressTracker};
use crate::transform::{apply_step, enabled_steps};
use crate::validation::Validator;

/// Run the handler registered for `job_type`.
pub(crate) async fn dispatch(
    job_type: BatchJobType,
    input: &JobInput,
    config: &BatchConfig,
    ctx: &mut JobContext,
) -> Result<JobOutput> {
    match job_type {
        BatchJobType::Cleaning => clean(input, config, ctx).await,
        BatchJobType::Transformation => transform(input, ctx).await,
        BatchJobType::Validation => validate(input, config, ctx).await,
        BatchJobType::Profiling => {
            let profile = profile(&input.rows, ctx).await?;
            Ok(JobOutput {
                profile: Some(profile),
                ..JobOutput::default()
            })
        }
        BatchJobType::Analysis => {
            let profile = profile(&input.rows, ctx).await?;
            let mut analysis = analyze_profile(&input.rows, &profile);
            for test in &input.tests {
                ctx.checkpoint().await?;
                analysis.tests.push(run_test(&input.rows, test)?);
            }
            Ok(JobOutput {
                profile: Some(profile),
                analysis: Some(analysis),
                ..JobOutput::default()
            })
        }
        BatchJobType::Import => import(input, ctx).await,
        BatchJobType::Export => export(input, ctx).await,
    }
}

async fn clean(input: &JobInput, config: &BatchConfig, ctx: &mut JobContext) -> Result<JobOutput> {
    let rows = &input.rows;
    let mut cleaner = DataCleaner::new(rows, config);
    let mut cleaned: Table = Vec::with_capacity(rows.len());
    for chunk in rows.chunks(config.effective_chunk_size()) {
        ctx.checkpoint().await?;
        cleaned.extend(cleaner.clean_chunk(chunk, &mut |p: &BatchProgress| ctx.report(p)));
    }
    let (report, last) = cleaner.finish(cleaned.len());
    ctx.report_now(&last);
    Ok(JobOutput {
        rows: Some(cleaned),
        quality_report: Some(report),
        ..JobOutput::default()
    })
}

async fn transform(input: &JobInput, ctx: &mut JobContext) -> Result<JobOutput> {
    let steps = enabled_steps(&input.steps);
    let mut tracker = ProgressTracker::new(
        input.rows.len(),
        steps.iter().map(|s| s.name.clone()).collect(),
    );
    let mut rows = input.rows.clone();
    for step in steps {
        ctx.checkpoint().await?;
        ctx.report(tracker.snapshot());
        rows = apply_step(rows, &step.kind);
        tracker.step();
    }
    ctx.report_now(tracker.complete());
    Ok(JobOutput {
        rows: Some(rows),
        ..JobOutput::default()
    })
}

async fn validate(input: &JobInput, config: &BatchConfig, ctx: &mut JobContext) -> Result<JobOutput> {
    let mut validator = Validator::new(&input.rules)?;
    let mut tracker = ProgressTracker::new(input.rows.len(), vec!["validate".to_string()]);
    let mut processed = 0;
    for chunk in input.rows.chunks(config.effective_chunk_size()) {
        ctx.checkpoint().await?;
        validator.validate_chunk(chunk);
        processed += chunk.len();
        ctx.report(tracker.rows(processed));
    }
    ctx.report_now(tracker.complete());
    Ok(JobOutput {
        validation: Some(validator.finish()),
        ..JobOutput::default()
    })
}

async fn profile(rows: &Table, ctx: &mut JobContext) -> Result<DatasetProfile> {
    let columns = table_columns(rows);
    let mut tracker = ProgressTracker::new(rows.len(), columns.clone());
    let mut profiles = Vec::with_capacity(columns.len());
    for column in &columns {
        ctx.checkpoint().await?;
        ctx.report(tracker.snapshot());
        profiles.push(profile_column(rows, column));
        tracker.step();
    }
    ctx.report_now(tracker.complete());
    Ok(DatasetProfile {
        row_count: rows.len(),
        column_count: profiles.len(),
        columns: profiles,
    })
}

async fn import(input: &JobInput, ctx: &mut JobContext) -> Result<JobOutput> {
    let text = input
        .source_text
        .as_deref()
        .ok_or_else(|| BatchError::Processing("import job has no source text".to_string()))?;
    ctx.checkpoint().await?;
    let rows = import_rows(text, input.format.unwrap_or(DataFormat::Csv))?;
    let mut tracker = ProgressTracker::new(rows.len(), vec!["import".to_string()]);
    ctx.report_now(tracker.complete());
    Ok(JobOutput {
        rows: Some(rows),
        ..JobOutput::default()
    })
}

async fn export(input: &JobInput, ctx: &mut JobContext) -> Result<JobOutput> {
    ctx.checkpoint().await?;
    let text = export_rows(&input.rows, input.format.unwrap_or(DataFormat::Csv))?;
    let mut tracker = ProgressTracker::new(input.rows.len(), vec!["export".to_string()]);
    ctx.report_now(tracker.complete());
    Ok(JobOutput {
        exported: Some(text),
        ..JobOutput::default()
    })
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use datasnap_model::{Record, RuleKind, Severity, ValidationRule, Value};

    use super::*;
    use crate::hypothesis::HypothesisTest;
    use crate::transform::{StepKind, TransformStep};

    fn rows() -> Table {
        (0..5)
            .map(|i| Record::from([("n".to_string(), Value::text(i.to_string()))]))
            .collect()
    }

    async fn run(job_type: BatchJobType, input: JobInput) -> (Result<JobOutput>, Vec<BatchProgress>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let mut ctx = JobContext::detached(Box::new(move |p| sink.lock().unwrap().push(p.clone())));
        let config = BatchConfig {
            chunk_size: 2,
            ..BatchConfig::default()
        };
        let result = dispatch(job_type, &input, &config, &mut ctx).await;
        let reports = seen.lock().unwrap().clone();
        (result, reports)
    }

    #[tokio::test]
    async fn test_every_job_type_has_a_handler() {
        for job_type in BatchJobType::all() {
            let input = JobInput::from_rows(rows()).with_format(DataFormat::Json);
            let input = if *job_type == BatchJobType::Import {
                JobInput::from_text("[]", DataFormat::Json)
            } else {
                input
            };
            let (result, reports) = run(*job_type, input).await;
            assert!(result.is_ok(), "{job_type} failed");
            assert_eq!(reports.last().map(|p| p.percentage), Some(100.0));
        }
    }

    #[tokio::test]
    async fn test_transformation_output() {
        let input = JobInput::from_rows(rows()).with_steps(vec![TransformStep::new(
            "small",
            StepKind::Filter {
                column: "n".into(),
                operator: crate::transform::FilterOperator::Less,
                value: Value::Number(2.0),
            },
        )]);
        let (result, _) = run(BatchJobType::Transformation, input).await;
        assert_eq!(result.unwrap().rows.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_validation_output() {
        let input = JobInput::from_rows(rows()).with_rules(vec![ValidationRule::new(
            "n",
            RuleKind::Range { min: 0.0, max: 3.0 },
            Severity::Error,
            "range",
        )]);
        let (result, _) = run(BatchJobType::Validation, input).await;
        let report = result.unwrap().validation.unwrap();
        assert_eq!(report.invalid_rows, 1);
    }

    #[tokio::test]
    async fn test_analysis_runs_requested_tests() {
        let input = JobInput::from_rows(rows()).with_tests(vec![HypothesisTest::OneSampleT {
            column: "n".into(),
            test_value: 0.0,
            alpha: 0.05,
        }]);
        let (result, _) = run(BatchJobType::Analysis, input).await;
        let analysis = result.unwrap().analysis.unwrap();
        assert_eq!(analysis.tests.len(), 1);
        assert_eq!(analysis.tests[0].sample_size, 5);
        assert!(!analysis.chart_suggestions.is_empty());
    }

    #[tokio::test]
    async fn test_analysis_fails_on_an_impossible_test() {
        let input = JobInput::from_rows(rows()).with_tests(vec![HypothesisTest::OneWayAnova {
            column: "n".into(),
            group_column: "missing".into(),
            alpha: 0.05,
        }]);
        let (result, _) = run(BatchJobType::Analysis, input).await;
        assert!(matches!(result, Err(BatchError::Statistics(_))));
    }

    #[tokio::test]
    async fn test_import_without_text_fails() {
        let (result, _) = run(BatchJobType::Import, JobInput::default()).await;
        assert!(matches!(result, Err(BatchError::Processing(_))));
    }

    #[tokio::test]
    async fn test_export_csv() {
        let input = JobInput::from_rows(rows()).with_format(DataFormat::Csv);
        let (result, _) = run(BatchJobType::Export, input).await;
        let text = result.unwrap().exported.unwrap();
        assert!(text.starts_with("n\n0\n1\n"));
    }
}
