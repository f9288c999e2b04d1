//! Progress snapshots with throughput and ETA.

use std::time::Instant;

use serde::{Deserialize, Serialize};

/// Point-in-time progress of a running operation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchProgress {
    pub current_step: usize,
    pub total_steps: usize,
    pub processed_rows: usize,
    pub total_rows: usize,
    /// `[0, 100]`.
    pub percentage: f64,
    pub current_operation: String,
    pub completed_operations: Vec<String>,
    pub remaining_operations: Vec<String>,
    /// Rows per second since the operation started.
    pub throughput: f64,
    /// Seconds until completion at the current throughput.
    pub eta_secs: Option<f64>,
}

impl BatchProgress {
    pub fn new(total_rows: usize) -> Self {
        Self {
            total_rows,
            ..Self::default()
        }
    }
}

/// Builds progress snapshots for one operation.
#[derive(Debug)]
pub struct ProgressTracker {
    started: Instant,
    progress: BatchProgress,
}

impl ProgressTracker {
    pub fn new(total_rows: usize, operations: Vec<String>) -> Self {
        let progress = BatchProgress {
            total_steps: operations.len(),
            current_operation: operations.first().cloned().unwrap_or_default(),
            remaining_operations: operations,
            ..BatchProgress::new(total_rows)
        };
        Self {
            started: Instant::now(),
            progress,
        }
    }

    /// Record `processed` rows and recompute the derived fields.
    pub fn rows(&mut self, processed: usize) -> &BatchProgress {
        let p = &mut self.progress;
        p.processed_rows = processed.min(p.total_rows);
        let elapsed = self.started.elapsed().as_secs_f64();
        p.throughput = if elapsed > 0.0 {
            p.processed_rows as f64 / elapsed
        } else {
            0.0
        };
        let remaining = p.total_rows - p.processed_rows;
        p.eta_secs = (p.throughput > 0.0).then(|| remaining as f64 / p.throughput);
        p.percentage = percentage(p.processed_rows, p.total_rows);
        &self.progress
    }

    /// Mark the current operation done and move to the next one.
    pub fn step(&mut self) -> &BatchProgress {
        let p = &mut self.progress;
        if !p.remaining_operations.is_empty() {
            let done = p.remaining_operations.remove(0);
            p.completed_operations.push(done);
        }
        p.current_step = p.completed_operations.len();
        p.current_operation = p.remaining_operations.first().cloned().unwrap_or_default();
        p.percentage = percentage(p.current_step, p.total_steps);
        &self.progress
    }

    /// Final snapshot.
    pub fn complete(&mut self) -> &BatchProgress {
        let p = &mut self.progress;
        p.processed_rows = p.total_rows;
        p.completed_operations.append(&mut p.remaining_operations);
        p.current_step = p.total_steps;
        p.current_operation = String::new();
        p.percentage = 100.0;
        p.eta_secs = Some(0.0);
        &self.progress
    }

    pub fn snapshot(&self) -> &BatchProgress {
        &self.progress
    }
}

fn percentage(done: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        done as f64 / total as f64 * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_update_percentage() {
        let mut tracker = ProgressTracker::new(200, vec!["clean".into()]);
        let progress = tracker.rows(50);
        assert_eq!(progress.processed_rows, 50);
        assert!((progress.percentage - 25.0).abs() < 1e-9);
        assert_eq!(progress.current_operation, "clean");
    }

    #[test]
    fn test_steps_move_operations() {
        let mut tracker = ProgressTracker::new(0, vec!["a".into(), "b".into()]);
        let progress = tracker.step();
        assert_eq!(progress.completed_operations, vec!["a"]);
        assert_eq!(progress.remaining_operations, vec!["b"]);
        assert_eq!(progress.current_operation, "b");
        assert!((progress.percentage - 50.0).abs() < 1e-9);

        let done = tracker.complete();
        assert_eq!(done.percentage, 100.0);
        assert!(done.remaining_operations.is_empty());
    }
}
