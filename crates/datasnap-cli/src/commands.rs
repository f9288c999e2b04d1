use std::path::Path;

use anyhow::{Context, Result};
use datasnap_batch::{
    BatchConfigOverrides, BatchJobType, BatchScheduler, HypothesisTest, JobInput, SchedulerConfig,
    TransformStep,
};
use datasnap_infer::{InferenceOptions, TypeInferenceEngine, UserConfirmation};
use datasnap_model::ValidationRule;
use tokio::runtime::Handle;
use tracing::{info, info_span};

use datasnap_cli::data::{read_csv_table, read_json, write_csv_table};
use datasnap_cli::jobs::run_job;

use crate::cli::{AnalyzeArgs, CleanArgs, InferArgs, InputArgs, TransformArgs, ValidateArgs};
use crate::summary::{
    print_analysis, print_inference, print_profile, print_quality, print_rows, print_validation,
};

/// Scheduler from `--config`, or the defaults.
pub fn build_scheduler(config: Option<&Path>, runtime: Handle) -> Result<BatchScheduler> {
    let config = match config {
        Some(path) => SchedulerConfig::load_from(path)
            .with_context(|| format!("load config {}", path.display()))?,
        None => SchedulerConfig::default(),
    };
    Ok(BatchScheduler::new(config, runtime))
}

/// Returns the process exit code.
pub fn run_infer(args: &InferArgs) -> Result<i32> {
    let rows = read_csv_table(&args.input)?;
    let dataset_id = dataset_id(&args.input);
    let span = info_span!("infer", dataset = %dataset_id);
    let _guard = span.enter();

    let mut options = InferenceOptions::default().with_advanced_types(!args.basic_only);
    if let Some(size) = args.sample_size {
        options = options.with_sample_size(size);
    }
    if let Some(threshold) = args.threshold {
        options = options.with_confidence_threshold(threshold);
    }

    let mut engine = TypeInferenceEngine::new();
    let session = engine.analyze_data_types(&dataset_id, &rows, &options);
    if args.json {
        println!("{}", serde_json::to_string_pretty(&session)?);
    } else {
        print_inference(&session);
    }

    if let Some(output) = &args.output {
        let confirmations = session
            .inferences
            .iter()
            .map(UserConfirmation::accept)
            .collect();
        engine.confirm_types(session.id, confirmations)?;
        engine.apply_inferences(session.id)?;
        let converted = engine.coerce_table(session.id, &rows)?;
        write_csv_table(output, &converted)?;
        info!(path = %output.display(), "Wrote converted rows");
    }
    Ok(0)
}

pub async fn run_clean(scheduler: &BatchScheduler, args: &CleanArgs) -> Result<i32> {
    let rows = read_csv_table(&args.input)?;
    let overrides = BatchConfigOverrides {
        chunk_size: args.chunk_size,
        ..BatchConfigOverrides::default()
    }
    .with_validation(!args.no_impute);
    let job = run_job(
        scheduler,
        &format!("clean {}", dataset_id(&args.input)),
        BatchJobType::Cleaning,
        JobInput::from_rows(rows),
        Some(overrides),
    )
    .await?;

    let output = job.output.unwrap_or_default();
    if let Some(report) = &output.quality_report {
        print_quality(report);
    }
    if let (Some(path), Some(rows)) = (&args.output, &output.rows) {
        write_csv_table(path, rows)?;
        println!("Output: {}", path.display());
    }
    Ok(0)
}

/// Exits 1 when any row breaks an error-severity rule.
pub async fn run_validate(scheduler: &BatchScheduler, args: &ValidateArgs) -> Result<i32> {
    let rules: Vec<ValidationRule> = read_json(&args.rules)?;
    let rows = read_csv_table(&args.input)?;
    let job = run_job(
        scheduler,
        &format!("validate {}", dataset_id(&args.input)),
        BatchJobType::Validation,
        JobInput::from_rows(rows).with_rules(rules),
        None,
    )
    .await?;

    let Some(report) = job.output.and_then(|output| output.validation) else {
        return Ok(0);
    };
    print_validation(&report);
    Ok(i32::from(report.invalid_rows > 0))
}

pub async fn run_transform(scheduler: &BatchScheduler, args: &TransformArgs) -> Result<i32> {
    let steps: Vec<TransformStep> = read_json(&args.steps)?;
    let rows = read_csv_table(&args.input)?;
    let job = run_job(
        scheduler,
        &format!("transform {}", dataset_id(&args.input)),
        BatchJobType::Transformation,
        JobInput::from_rows(rows).with_steps(steps),
        None,
    )
    .await?;

    let rows = job.output.and_then(|output| output.rows).unwrap_or_default();
    match &args.output {
        Some(path) => {
            write_csv_table(path, &rows)?;
            println!("Wrote {} rows to {}", rows.len(), path.display());
        }
        None => print_rows(&rows),
    }
    Ok(0)
}

pub async fn run_profile(scheduler: &BatchScheduler, args: &InputArgs) -> Result<i32> {
    let rows = read_csv_table(&args.input)?;
    let job = run_job(
        scheduler,
        &format!("profile {}", dataset_id(&args.input)),
        BatchJobType::Profiling,
        JobInput::from_rows(rows),
        None,
    )
    .await?;
    if let Some(profile) = job.output.and_then(|output| output.profile) {
        print_profile(&profile);
    }
    Ok(0)
}

pub async fn run_analyze(scheduler: &BatchScheduler, args: &AnalyzeArgs) -> Result<i32> {
    let rows = read_csv_table(&args.input)?;
    let tests: Vec<HypothesisTest> = match &args.tests {
        Some(path) => read_json(path)?,
        None => Vec::new(),
    };
    let job = run_job(
        scheduler,
        &format!("analyze {}", dataset_id(&args.input)),
        BatchJobType::Analysis,
        JobInput::from_rows(rows).with_tests(tests),
        None,
    )
    .await?;
    if let Some(analysis) = job.output.and_then(|output| output.analysis) {
        print_analysis(&analysis);
    }
    Ok(0)
}

/// File stem of the input, used to name sessions and jobs.
fn dataset_id(path: &Path) -> String {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("dataset")
        .to_string()
}
