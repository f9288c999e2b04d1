//! Scheduler lifecycle tests.

use std::time::Duration;

use datasnap_batch::{
    BatchConfigOverrides, BatchJobStatus, BatchJobType, BatchScheduler, JobInput, SchedulerConfig,
};
use datasnap_model::{Record, Table, Value};
use tokio::runtime::Handle;

fn rows(n: usize) -> Table {
    (0..n)
        .map(|i| {
            Record::from([
                ("id".to_string(), Value::Number(i as f64)),
                ("name".to_string(), Value::text(format!("row {i}"))),
            ])
        })
        .collect()
}

fn scheduler(max_concurrent_jobs: usize) -> BatchScheduler {
    let config = SchedulerConfig {
        max_concurrent_jobs,
        ..SchedulerConfig::default()
    };
    BatchScheduler::new(config, Handle::current())
}

#[tokio::test]
async fn fourth_job_waits_for_a_free_slot() {
    let scheduler = scheduler(3);
    let jobs: Vec<_> = (0..4)
        .map(|i| {
            scheduler.create_job(
                format!("clean {i}"),
                BatchJobType::Cleaning,
                JobInput::from_rows(rows(50)),
                None,
            )
        })
        .collect();

    for job in &jobs[..3] {
        assert_eq!(job.status, BatchJobStatus::Running);
    }
    assert_eq!(jobs[3].status, BatchJobStatus::Queued);
    assert_eq!(scheduler.jobs_by_status(BatchJobStatus::Running).len(), 3);

    scheduler.wait_for(jobs[0].id).await.unwrap();
    let fourth = scheduler.get_job(jobs[3].id).unwrap();
    assert_ne!(fourth.status, BatchJobStatus::Queued);
    assert!(fourth.started_at.is_some());

    let fourth = scheduler.wait_for(jobs[3].id).await.unwrap();
    assert_eq!(fourth.status, BatchJobStatus::Completed);
    assert_eq!(scheduler.running_count(), 0);
}

#[tokio::test]
async fn cancelling_a_queued_job_never_runs_it() {
    let scheduler = scheduler(1);
    let running = scheduler.create_job("a", BatchJobType::Profiling, JobInput::from_rows(rows(5)), None);
    let queued = scheduler.create_job("b", BatchJobType::Profiling, JobInput::from_rows(rows(5)), None);

    let cancelled = scheduler.cancel(queued.id).unwrap();
    assert_eq!(cancelled.status, BatchJobStatus::Cancelled);
    assert!(cancelled.started_at.is_none());
    assert!(cancelled.completed_at.is_some());

    scheduler.wait_for(running.id).await.unwrap();
    let after = scheduler.get_job(queued.id).unwrap();
    assert_eq!(after.status, BatchJobStatus::Cancelled);
    assert!(after.output.is_none());
}

#[tokio::test]
async fn paused_job_resumes_and_completes() {
    let scheduler = scheduler(1);
    let job = scheduler.create_job("a", BatchJobType::Cleaning, JobInput::from_rows(rows(20)), None);

    let paused = scheduler.pause(job.id).unwrap();
    assert_eq!(paused.status, BatchJobStatus::Paused);
    for _ in 0..5 {
        tokio::task::yield_now().await;
    }
    assert_eq!(scheduler.get_job(job.id).unwrap().status, BatchJobStatus::Paused);
    assert_eq!(scheduler.running_count(), 1);

    scheduler.resume(job.id).unwrap();
    let done = scheduler.wait_for(job.id).await.unwrap();
    assert_eq!(done.status, BatchJobStatus::Completed);
    assert_eq!(done.output.unwrap().rows.unwrap().len(), 20);
}

#[tokio::test]
async fn cancelling_a_running_job_starts_the_next() {
    let scheduler = scheduler(1);
    let first = scheduler.create_job("a", BatchJobType::Cleaning, JobInput::from_rows(rows(10)), None);
    let second = scheduler.create_job("b", BatchJobType::Profiling, JobInput::from_rows(rows(10)), None);
    assert_eq!(second.status, BatchJobStatus::Queued);

    let cancelled = scheduler.cancel(first.id).unwrap();
    assert_eq!(cancelled.status, BatchJobStatus::Cancelled);
    assert_eq!(scheduler.get_job(second.id).unwrap().status, BatchJobStatus::Running);

    let first = scheduler.wait_for(first.id).await.unwrap();
    assert_eq!(first.status, BatchJobStatus::Cancelled);
    assert!(first.output.is_none());
    let second = scheduler.wait_for(second.id).await.unwrap();
    assert_eq!(second.status, BatchJobStatus::Completed);
}

#[tokio::test(start_paused = true)]
async fn job_exceeding_its_timeout_fails() {
    let scheduler = scheduler(1);
    let job = scheduler.create_job(
        "slow",
        BatchJobType::Cleaning,
        JobInput::from_rows(rows(10)),
        Some(BatchConfigOverrides::default().with_timeout_secs(1)),
    );
    scheduler.pause(job.id).unwrap();

    let failed = scheduler.wait_for(job.id).await.unwrap();
    assert_eq!(failed.status, BatchJobStatus::Failed);
    let error = failed.error.unwrap();
    assert_eq!(error.code, "TIMEOUT");
    assert_eq!(scheduler.running_count(), 0);
}

#[tokio::test]
async fn handler_errors_mark_the_job_failed() {
    let scheduler = scheduler(2);
    let job = scheduler.create_job("import", BatchJobType::Import, JobInput::default(), None);
    let failed = scheduler.wait_for(job.id).await.unwrap();

    assert_eq!(failed.status, BatchJobStatus::Failed);
    let error = failed.error.unwrap();
    assert_eq!(error.code, "PROCESSING_ERROR");
    assert!(!error.recoverable);
    assert!(error.affected_rows.is_empty());
    assert!(error.details.is_some());
}

#[tokio::test]
async fn raising_the_limit_starts_queued_jobs() {
    let scheduler = scheduler(1);
    let jobs: Vec<_> = (0..3)
        .map(|i| {
            scheduler.create_job(
                format!("p{i}"),
                BatchJobType::Profiling,
                JobInput::from_rows(rows(3)),
                None,
            )
        })
        .collect();
    assert_eq!(scheduler.jobs_by_status(BatchJobStatus::Queued).len(), 2);

    scheduler.set_max_concurrent_jobs(3);
    assert_eq!(scheduler.max_concurrent_jobs(), 3);
    assert!(scheduler.jobs_by_status(BatchJobStatus::Queued).is_empty());

    scheduler.set_max_concurrent_jobs(0);
    assert_eq!(scheduler.max_concurrent_jobs(), 1);

    for job in &jobs {
        scheduler.wait_for(job.id).await.unwrap();
    }
}

#[tokio::test]
async fn cleanup_removes_finished_jobs_only() {
    let scheduler = scheduler(2);
    let running = scheduler.create_job("a", BatchJobType::Cleaning, JobInput::from_rows(rows(2)), None);
    scheduler.pause(running.id).unwrap();
    let done = scheduler.create_job("b", BatchJobType::Profiling, JobInput::from_rows(rows(2)), None);
    scheduler.wait_for(done.id).await.unwrap();

    assert_eq!(scheduler.cleanup(Duration::from_secs(3600)), 0);
    assert_eq!(scheduler.cleanup(Duration::ZERO), 1);
    assert!(scheduler.get_job(done.id).is_none());
    let remaining = scheduler.all_jobs();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, running.id);

    scheduler.cancel(running.id).unwrap();
}

#[tokio::test]
async fn jobs_are_listed_in_creation_order() {
    let scheduler = scheduler(1);
    let names = ["first", "second", "third"];
    for name in names {
        scheduler.create_job(name, BatchJobType::Export, JobInput::from_rows(rows(1)), None);
    }
    let listed: Vec<String> = scheduler.all_jobs().into_iter().map(|j| j.name).collect();
    assert_eq!(listed, names);
}
