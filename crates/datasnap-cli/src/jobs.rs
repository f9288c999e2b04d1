//! Running one batch job to completion with a progress bar.

use std::time::Duration;

use anyhow::{Result, anyhow, bail};
use datasnap_batch::{
    BatchConfigOverrides, BatchJob, BatchJobStatus, BatchJobType, BatchScheduler, JobInput,
};
use indicatif::{ProgressBar, ProgressStyle};

const PROGRESS_TEMPLATE: &str = "{spinner:.green} [{elapsed_precise}] {bar:40.cyan/blue} {pos:>3}% {msg}";

/// Submit a job and wait for it, redrawing the bar from job snapshots.
///
/// Returns the completed job; a failed or cancelled job is an error.
pub async fn run_job(
    scheduler: &BatchScheduler,
    name: &str,
    job_type: BatchJobType,
    input: JobInput,
    overrides: Option<BatchConfigOverrides>,
) -> Result<BatchJob> {
    let job = scheduler.create_job(name, job_type, input, overrides);
    let bar = ProgressBar::new(100);
    bar.set_style(
        ProgressStyle::with_template(PROGRESS_TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("##-"),
    );
    bar.set_message(job_type.to_string());

    let wait = scheduler.wait_for(job.id);
    tokio::pin!(wait);
    let mut ticker = tokio::time::interval(Duration::from_millis(100));
    let finished = loop {
        tokio::select! {
            result = &mut wait => break result?,
            _ = ticker.tick() => {
                if let Some(snapshot) = scheduler.get_job(job.id) {
                    bar.set_position(snapshot.progress.percentage.round() as u64);
                    if !snapshot.progress.current_operation.is_empty() {
                        bar.set_message(snapshot.progress.current_operation.clone());
                    }
                }
            }
        }
    };
    bar.finish_and_clear();

    match finished.status {
        BatchJobStatus::Completed => Ok(finished),
        BatchJobStatus::Failed => {
            let message = finished
                .error
                .as_ref()
                .map_or_else(|| "unknown error".to_string(), |e| format!("{}: {}", e.code, e.message));
            Err(anyhow!("{job_type} job failed: {message}"))
        }
        status => bail!("{job_type} job ended as {status}"),
    }
}
