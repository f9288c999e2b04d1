//! Cooperative pause/cancel checkpoints and throttled progress publishing.

use std::time::{Duration, Instant};

use tokio::sync::watch;

use crate::error::{BatchError, Result};
use crate::progress::BatchProgress;

/// Signal delivered from the scheduler to a running job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ControlSignal {
    Run,
    Pause,
    Cancel,
}

/// Receives progress snapshots from a job.
pub(crate) type ProgressSink = Box<dyn Fn(&BatchProgress) + Send + Sync>;

/// Per-run context handed to a job handler.
pub(crate) struct JobContext {
    control: watch::Receiver<ControlSignal>,
    // Keeps the channel open for contexts not owned by a scheduler.
    _sender: Option<watch::Sender<ControlSignal>>,
    sink: ProgressSink,
    interval: Duration,
    last_report: Option<Instant>,
}

impl JobContext {
    pub(crate) fn new(
        control: watch::Receiver<ControlSignal>,
        interval: Duration,
        sink: ProgressSink,
    ) -> Self {
        Self {
            control,
            _sender: None,
            sink,
            interval,
            last_report: None,
        }
    }

    /// Context that is never paused or cancelled.
    #[cfg(test)]
    pub(crate) fn detached(sink: ProgressSink) -> Self {
        let (tx, rx) = watch::channel(ControlSignal::Run);
        let mut ctx = Self::new(rx, Duration::ZERO, sink);
        ctx._sender = Some(tx);
        ctx
    }

    /// Yield to the runtime, then wait out a pause.
    ///
    /// Returns [`BatchError::Cancelled`] once the job is cancelled.
    pub(crate) async fn checkpoint(&mut self) -> Result<()> {
        tokio::task::yield_now().await;
        loop {
            let signal = *self.control.borrow_and_update();
            match signal {
                ControlSignal::Run => return Ok(()),
                ControlSignal::Cancel => return Err(BatchError::Cancelled),
                ControlSignal::Pause => {
                    if self.control.changed().await.is_err() {
                        return Err(BatchError::Cancelled);
                    }
                }
            }
        }
    }

    /// Publish a snapshot unless one was published within the interval.
    pub(crate) fn report(&mut self, progress: &BatchProgress) {
        let due = self
            .last_report
            .is_none_or(|last| last.elapsed() >= self.interval);
        if due {
            self.report_now(progress);
        }
    }

    /// Publish a snapshot regardless of the interval.
    pub(crate) fn report_now(&mut self, progress: &BatchProgress) {
        (self.sink)(progress);
        self.last_report = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;

    #[tokio::test]
    async fn test_checkpoint_states() {
        let (tx, rx) = watch::channel(ControlSignal::Run);
        let mut ctx = JobContext::new(rx, Duration::ZERO, Box::new(|_| {}));
        assert!(ctx.checkpoint().await.is_ok());

        tx.send_replace(ControlSignal::Cancel);
        assert!(matches!(ctx.checkpoint().await, Err(BatchError::Cancelled)));
    }

    #[tokio::test]
    async fn test_pause_waits_for_resume() {
        let (tx, rx) = watch::channel(ControlSignal::Pause);
        let mut ctx = JobContext::new(rx, Duration::ZERO, Box::new(|_| {}));
        let waiter = tokio::spawn(async move { ctx.checkpoint().await.is_ok() });
        tokio::task::yield_now().await;
        assert!(!waiter.is_finished());
        tx.send_replace(ControlSignal::Run);
        assert!(waiter.await.unwrap());
    }

    #[test]
    fn test_report_is_throttled() {
        let seen = Arc::new(Mutex::new(0usize));
        let counter = Arc::clone(&seen);
        let (_tx, rx) = watch::channel(ControlSignal::Run);
        let mut ctx = JobContext::new(
            rx,
            Duration::from_secs(3600),
            Box::new(move |_| *counter.lock().unwrap() += 1),
        );
        let progress = BatchProgress::default();
        ctx.report(&progress);
        ctx.report(&progress);
        ctx.report_now(&progress);
        assert_eq!(*seen.lock().unwrap(), 2);
    }
}
