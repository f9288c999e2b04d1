//! Job registry and concurrency-limited execution.
//!
//! The scheduler owns every job. Callers receive snapshots; all mutation
//! goes through the scheduler so that status, progress and the slot count
//! stay consistent. At most `max_concurrent_jobs` jobs are `running` or
//! `paused` at once; queued jobs start in creation order as slots free up.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{TimeDelta, Utc};
use tokio::runtime::Handle;
use tokio::sync::watch;
use tracing::{Instrument, debug, info, info_span, warn};

use crate::config::{BatchConfig, BatchConfigOverrides, SchedulerConfig};
use crate::control::{ControlSignal, JobContext, ProgressSink};
use crate::error::{BatchError, Result};
use crate::handler;
use crate::job::{BatchJob, BatchJobStatus, BatchJobType, JobError, JobId, JobInput, JobOutput};
use crate::progress::BatchProgress;

/// Handle to a job scheduler. Clones share the same registry.
#[derive(Clone)]
pub struct BatchScheduler {
    inner: Arc<Inner>,
}

struct Inner {
    state: Mutex<Registry>,
    runtime: Handle,
}

struct Registry {
    jobs: HashMap<JobId, JobEntry>,
    /// Creation order.
    order: Vec<JobId>,
    /// Jobs holding a slot.
    running: usize,
    max_concurrent_jobs: usize,
    defaults: BatchConfig,
}

struct JobEntry {
    job: BatchJob,
    /// Present while a run is in flight.
    control: Option<watch::Sender<ControlSignal>>,
    status: watch::Sender<BatchJobStatus>,
    holds_slot: bool,
}

impl BatchScheduler {
    /// Create a scheduler whose jobs run on `runtime`.
    pub fn new(config: SchedulerConfig, runtime: Handle) -> Self {
        let registry = Registry {
            jobs: HashMap::new(),
            order: Vec::new(),
            running: 0,
            max_concurrent_jobs: config.max_concurrent_jobs.max(1),
            defaults: config.defaults,
        };
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(registry),
                runtime,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Registry> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a job and start it if a slot is free.
    ///
    /// `overrides` are applied on top of the scheduler defaults.
    pub fn create_job(
        &self,
        name: impl Into<String>,
        job_type: BatchJobType,
        input: JobInput,
        overrides: Option<BatchConfigOverrides>,
    ) -> BatchJob {
        let mut guard = self.lock();
        let registry = &mut *guard;
        let config = match &overrides {
            Some(overrides) => registry.defaults.clone().merged(overrides),
            None => registry.defaults.clone(),
        };
        let job = BatchJob::new(name, job_type, input, config);
        let id = job.id;
        info!(job_id = %id, %job_type, rows = job.input.rows.len(), "Created batch job");

        let (status, _) = watch::channel(BatchJobStatus::Queued);
        registry.jobs.insert(
            id,
            JobEntry {
                job,
                control: None,
                status,
                holds_slot: false,
            },
        );
        registry.order.push(id);
        self.promote(registry);
        registry.jobs[&id].job.clone()
    }

    /// Start a queued job now if a slot is free.
    ///
    /// Jobs in any other state are left alone. Returns the current snapshot.
    pub fn execute_job(&self, id: JobId) -> Result<BatchJob> {
        let mut guard = self.lock();
        let registry = &mut *guard;
        let entry = registry.jobs.get(&id).ok_or(BatchError::JobNotFound(id))?;
        if entry.job.status == BatchJobStatus::Queued
            && registry.running < registry.max_concurrent_jobs
        {
            self.start(registry, id);
        }
        Ok(registry.jobs[&id].job.clone())
    }

    /// Suspend a running job at its next checkpoint. It keeps its slot.
    pub fn pause(&self, id: JobId) -> Result<BatchJob> {
        self.signal(id, "pause", BatchJobStatus::Running, BatchJobStatus::Paused, ControlSignal::Pause)
    }

    pub fn resume(&self, id: JobId) -> Result<BatchJob> {
        self.signal(id, "resume", BatchJobStatus::Paused, BatchJobStatus::Running, ControlSignal::Run)
    }

    fn signal(
        &self,
        id: JobId,
        operation: &'static str,
        from: BatchJobStatus,
        to: BatchJobStatus,
        signal: ControlSignal,
    ) -> Result<BatchJob> {
        let mut guard = self.lock();
        let entry = guard.jobs.get_mut(&id).ok_or(BatchError::JobNotFound(id))?;
        if entry.job.status != from {
            return Err(BatchError::InvalidTransition {
                job_id: id,
                status: entry.job.status,
                operation,
            });
        }
        entry.job.status = to;
        if let Some(control) = &entry.control {
            control.send_replace(signal);
        }
        entry.status.send_replace(to);
        info!(job_id = %id, status = %to, "Batch job {operation}d");
        Ok(entry.job.clone())
    }

    /// Cancel a queued, running or paused job.
    ///
    /// A running job stops at its next checkpoint; its slot is released
    /// immediately and the next queued job starts.
    pub fn cancel(&self, id: JobId) -> Result<BatchJob> {
        let mut guard = self.lock();
        let registry = &mut *guard;
        let entry = registry
            .jobs
            .get_mut(&id)
            .ok_or(BatchError::JobNotFound(id))?;
        if entry.job.status.is_terminal() {
            return Err(BatchError::InvalidTransition {
                job_id: id,
                status: entry.job.status,
                operation: "cancel",
            });
        }
        if let Some(control) = entry.control.take() {
            control.send_replace(ControlSignal::Cancel);
        }
        if entry.holds_slot {
            entry.holds_slot = false;
            registry.running -= 1;
        }
        entry.job.finish(BatchJobStatus::Cancelled);
        entry.status.send_replace(BatchJobStatus::Cancelled);
        let snapshot = entry.job.clone();
        info!(job_id = %id, "Batch job cancelled");
        self.promote(registry);
        Ok(snapshot)
    }

    pub fn get_job(&self, id: JobId) -> Option<BatchJob> {
        self.lock().jobs.get(&id).map(|entry| entry.job.clone())
    }

    /// Every job, in creation order.
    pub fn all_jobs(&self) -> Vec<BatchJob> {
        let registry = self.lock();
        registry
            .order
            .iter()
            .filter_map(|id| registry.jobs.get(id))
            .map(|entry| entry.job.clone())
            .collect()
    }

    /// Jobs currently in `status`, in creation order.
    pub fn jobs_by_status(&self, status: BatchJobStatus) -> Vec<BatchJob> {
        self.all_jobs()
            .into_iter()
            .filter(|job| job.status == status)
            .collect()
    }

    pub fn max_concurrent_jobs(&self) -> usize {
        self.lock().max_concurrent_jobs
    }

    /// Jobs currently holding a slot.
    pub fn running_count(&self) -> usize {
        self.lock().running
    }

    /// Change the slot limit (at least 1). Raising it starts queued jobs;
    /// lowering it never interrupts jobs already holding a slot.
    pub fn set_max_concurrent_jobs(&self, max: usize) {
        let mut guard = self.lock();
        let registry = &mut *guard;
        registry.max_concurrent_jobs = max.max(1);
        info!(max_concurrent_jobs = registry.max_concurrent_jobs, "Concurrency limit changed");
        self.promote(registry);
    }

    /// Remove terminal jobs that completed at least `max_age` ago.
    /// Returns how many were removed.
    pub fn cleanup(&self, max_age: Duration) -> usize {
        let Some(cutoff) = TimeDelta::from_std(max_age)
            .ok()
            .and_then(|age| Utc::now().checked_sub_signed(age))
        else {
            return 0;
        };
        let mut guard = self.lock();
        let Registry { jobs, order, .. } = &mut *guard;
        let before = jobs.len();
        jobs.retain(|_, entry| {
            !(entry.job.status.is_terminal()
                && entry.job.completed_at.is_some_and(|done| done <= cutoff))
        });
        order.retain(|id| jobs.contains_key(id));
        let removed = before - jobs.len();
        if removed > 0 {
            info!(removed, "Cleaned up finished batch jobs");
        }
        removed
    }

    /// Wait until the job reaches a terminal status and return its snapshot.
    pub async fn wait_for(&self, id: JobId) -> Result<BatchJob> {
        let mut status = {
            let registry = self.lock();
            let entry = registry.jobs.get(&id).ok_or(BatchError::JobNotFound(id))?;
            entry.status.subscribe()
        };
        // An error means the job was removed while waiting.
        if status.wait_for(BatchJobStatus::is_terminal).await.is_err() {
            return Err(BatchError::JobNotFound(id));
        }
        self.get_job(id).ok_or(BatchError::JobNotFound(id))
    }

    /// Start queued jobs in creation order while slots are free.
    fn promote(&self, registry: &mut Registry) {
        while registry.running < registry.max_concurrent_jobs {
            let next = registry.order.iter().copied().find(|id| {
                registry
                    .jobs
                    .get(id)
                    .is_some_and(|entry| entry.job.status == BatchJobStatus::Queued)
            });
            let Some(id) = next else {
                break;
            };
            self.start(registry, id);
        }
    }

    fn start(&self, registry: &mut Registry, id: JobId) {
        let Some(entry) = registry.jobs.get_mut(&id) else {
            return;
        };
        let (control, control_rx) = watch::channel(ControlSignal::Run);
        entry.control = Some(control);
        entry.holds_slot = true;
        entry.job.status = BatchJobStatus::Running;
        entry.job.started_at = Some(Utc::now());
        entry.status.send_replace(BatchJobStatus::Running);

        let job_type = entry.job.job_type;
        let input = entry.job.input.clone();
        let config = entry.job.config.clone();
        registry.running += 1;

        let span = info_span!("batch_job", job_id = %id, %job_type);
        let scheduler = self.clone();
        let reporter = self.clone();
        let sink: ProgressSink = Box::new(move |progress| reporter.record_progress(id, progress));
        self.inner.runtime.spawn(
            async move {
                let mut ctx = JobContext::new(control_rx, config.progress_interval(), sink);
                info!("Batch job started");
                let run = handler::dispatch(job_type, &input, &config, &mut ctx);
                let result = match tokio::time::timeout(config.timeout(), run).await {
                    Ok(result) => result,
                    Err(_) => Err(BatchError::Timeout {
                        seconds: config.timeout_secs,
                    }),
                };
                scheduler.finish(id, result);
            }
            .instrument(span),
        );
    }

    fn record_progress(&self, id: JobId, progress: &BatchProgress) {
        let mut registry = self.lock();
        if let Some(entry) = registry.jobs.get_mut(&id)
            && entry.job.status.is_active()
        {
            entry.job.progress = progress.clone();
            debug!(
                percentage = progress.percentage,
                processed_rows = progress.processed_rows,
                "Progress"
            );
        }
    }

    fn finish(&self, id: JobId, result: Result<JobOutput>) {
        let mut guard = self.lock();
        let registry = &mut *guard;
        let Some(entry) = registry.jobs.get_mut(&id) else {
            return;
        };
        entry.control = None;
        if entry.holds_slot {
            entry.holds_slot = false;
            registry.running -= 1;
        }

        // A cancelled job already carries its final status.
        if !entry.job.status.is_terminal() {
            match result {
                Ok(output) => {
                    entry.job.output = Some(output);
                    if !entry.job.config.preserve_original {
                        entry.job.input.rows.clear();
                    }
                    entry.job.finish(BatchJobStatus::Completed);
                    info!(duration_ms = entry.job.duration_ms, "Batch job completed");
                }
                Err(BatchError::Cancelled) => {
                    entry.job.finish(BatchJobStatus::Cancelled);
                    info!("Batch job cancelled");
                }
                Err(err) => {
                    warn!(error = %err, "Batch job failed");
                    entry.job.error = Some(JobError {
                        code: err.code().to_string(),
                        message: err.to_string(),
                        details: Some(format!("{err:?}")),
                        recoverable: false,
                        affected_rows: Vec::new(),
                    });
                    entry.job.finish(BatchJobStatus::Failed);
                }
            }
            entry.status.send_replace(entry.job.status);
        }
        self.promote(registry);
    }
}
