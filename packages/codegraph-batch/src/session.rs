//! Per-run state shared by every worker of a sweep.

use crate::domain::IssueRecord;
use crate::progress::{ProgressReporter, ProgressTracker};
use crate::run_state::RunState;
use crate::sink::ResultSink;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Knobs copied from the controller config at start
#[derive(Debug, Clone, Copy)]
pub struct SessionOptions {
    pub interactive_parse: bool,
    pub isolate_provider_panics: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            interactive_parse: true,
            isolate_provider_panics: true,
        }
    }
}

/// Counters updated concurrently by workers
#[derive(Debug, Default)]
pub struct SweepStats {
    pub files_analyzed: AtomicUsize,
    pub files_skipped: AtomicUsize,
    pub files_failed: AtomicUsize,
    pub projects_visited: AtomicUsize,
    pub projects_skipped: AtomicUsize,
    pub projects_failed: AtomicUsize,
    pub provider_failures: AtomicUsize,
    pub issues_pushed: AtomicUsize,
}

impl SweepStats {
    pub(crate) fn bump(counter: &AtomicUsize, n: usize) {
        counter.fetch_add(n, Ordering::Relaxed);
    }

    fn get(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::Relaxed)
    }
}

/// Ephemeral state of one run: token, captured sink, progress counters.
///
/// The sink is fixed for the life of the session even if the controller's
/// destination is replaced afterwards.
pub struct RunSession {
    run_id: Uuid,
    workspace: String,
    token: CancellationToken,
    sink: Arc<dyn ResultSink>,
    progress: ProgressTracker,
    stats: SweepStats,
    options: SessionOptions,
    started_at: DateTime<Utc>,
}

impl RunSession {
    pub fn new(
        workspace: impl Into<String>,
        token: CancellationToken,
        sink: Arc<dyn ResultSink>,
        total_units: usize,
        reporter: Arc<dyn ProgressReporter>,
        options: SessionOptions,
    ) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            workspace: workspace.into(),
            token,
            sink,
            progress: ProgressTracker::new(total_units, reporter),
            stats: SweepStats::default(),
            options,
            started_at: Utc::now(),
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn options(&self) -> SessionOptions {
        self.options
    }

    pub fn progress(&self) -> &ProgressTracker {
        &self.progress
    }

    pub fn stats(&self) -> &SweepStats {
        &self.stats
    }

    /// Hand a record over to the run's sink
    pub fn push(&self, record: IssueRecord) {
        self.sink.push(record);
        SweepStats::bump(&self.stats.issues_pushed, 1);
    }

    pub fn summarize(&self, state: RunState) -> RunSummary {
        let finished_at = Utc::now();
        let duration_ms = (finished_at - self.started_at).num_milliseconds().max(0) as u64;
        RunSummary {
            run_id: self.run_id,
            workspace: self.workspace.clone(),
            state,
            started_at: self.started_at,
            finished_at,
            duration_ms,
            files_total: self.progress.total(),
            files_completed: self.progress.completed(),
            files_analyzed: SweepStats::get(&self.stats.files_analyzed),
            files_skipped: SweepStats::get(&self.stats.files_skipped),
            files_failed: SweepStats::get(&self.stats.files_failed),
            projects_visited: SweepStats::get(&self.stats.projects_visited),
            projects_skipped: SweepStats::get(&self.stats.projects_skipped),
            projects_failed: SweepStats::get(&self.stats.projects_failed),
            provider_failures: SweepStats::get(&self.stats.provider_failures),
            issues_pushed: SweepStats::get(&self.stats.issues_pushed),
        }
    }
}

/// Final report of a run, returned by the run handle
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub workspace: String,
    pub state: RunState,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub duration_ms: u64,
    /// Analyzable files counted by the pre-pass
    pub files_total: usize,
    /// Progress units reported
    pub files_completed: usize,
    pub files_analyzed: usize,
    pub files_skipped: usize,
    pub files_failed: usize,
    pub projects_visited: usize,
    /// Projects never visited because the run was cancelled
    pub projects_skipped: usize,
    pub projects_failed: usize,
    pub provider_failures: usize,
    pub issues_pushed: usize,
}

impl RunSummary {
    pub fn was_cancelled(&self) -> bool {
        self.state == RunState::Cancelled
    }
}
