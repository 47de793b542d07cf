//! Progress accounting.
//!
//! One step is one analyzable file, regardless of how many providers ran
//! against it. [`ProgressTracker`] keeps the counters of a run and forwards
//! every step to the host's [`ProgressReporter`].

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

/// Port: progress monitor
pub trait ProgressReporter: Send + Sync {
    fn begin_task(&self, name: &str, total: usize);

    fn step(&self, units: usize);

    fn end_task(&self);
}

/// Discards progress
#[derive(Debug, Clone, Copy, Default)]
pub struct NullProgress;

impl ProgressReporter for NullProgress {
    fn begin_task(&self, _name: &str, _total: usize) {}

    fn step(&self, _units: usize) {}

    fn end_task(&self) {}
}

/// Logs progress through `tracing`
#[derive(Debug, Default)]
pub struct TracingProgress {
    total: AtomicUsize,
    done: AtomicUsize,
}

impl TracingProgress {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProgressReporter for TracingProgress {
    fn begin_task(&self, name: &str, total: usize) {
        self.total.store(total, Ordering::Relaxed);
        self.done.store(0, Ordering::Relaxed);
        info!(total, "{}", name);
    }

    fn step(&self, units: usize) {
        let done = self.done.fetch_add(units, Ordering::Relaxed) + units;
        debug!(done, total = self.total.load(Ordering::Relaxed), "progress");
    }

    fn end_task(&self) {
        info!(done = self.done.load(Ordering::Relaxed), "task finished");
    }
}

/// Per-run step counters
pub struct ProgressTracker {
    total: usize,
    completed: AtomicUsize,
    reporter: Arc<dyn ProgressReporter>,
}

impl ProgressTracker {
    pub fn new(total: usize, reporter: Arc<dyn ProgressReporter>) -> Self {
        Self {
            total,
            completed: AtomicUsize::new(0),
            reporter,
        }
    }

    pub fn begin(&self, task_name: &str) {
        self.reporter.begin_task(task_name, self.total);
    }

    /// Record `units` completed files. Counter only ever grows.
    pub fn advance(&self, units: usize) {
        if units == 0 {
            return;
        }
        self.completed.fetch_add(units, Ordering::AcqRel);
        self.reporter.step(units);
    }

    pub fn end(&self) {
        self.reporter.end_task();
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::Acquire)
    }

    /// Fraction in `0.0..=1.0`; an empty workspace counts as done
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            (self.completed() as f64 / self.total as f64).min(1.0)
        }
    }
}

impl std::fmt::Debug for ProgressTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressTracker")
            .field("total", &self.total)
            .field("completed", &self.completed())
            .finish()
    }
}
