use crate::config::BatchConfig;
use crate::domain::Workspace;
use crate::error::{AnalysisError, BatchError, Result};
use crate::run_state::{RunState, StateChange, StateObservers, SubscriptionId};
use crate::services::AnalysisServices;
use crate::session::{RunSession, RunSummary};
use crate::sink::ResultSink;
use crate::stages::sweep_workspace;
use parking_lot::Mutex;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::JoinHandle;
use tokio::sync::{broadcast, oneshot, watch};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use uuid::Uuid;

/// Everything guarded by the controller lock
struct ControlState {
    state: RunState,
    token: Option<CancellationToken>,
    destination: Option<Arc<dyn ResultSink>>,
}

struct Shared {
    services: AnalysisServices,
    config: BatchConfig,
    pool: rayon::ThreadPool,
    control: Mutex<ControlState>,
    observers: StateObservers,
}

/// Owns the run lifecycle: state machine, active token, destination sink and
/// the worker pool the sweep fans out on.
///
/// At most one run is active at a time. State changes are published to
/// subscribers after the lock is released, so callbacks may call back into
/// the controller. A run started from a callback is announced only after the
/// change that triggered it.
pub struct RunController {
    shared: Arc<Shared>,
}

impl RunController {
    pub fn new(services: AnalysisServices, config: BatchConfig) -> Result<Self> {
        config.validate()?;

        let prefix = config.thread_name_prefix.clone();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.effective_workers())
            .thread_name(move |i| format!("{}-worker-{}", prefix, i))
            .build()?;

        info!(
            workers = pool.current_num_threads(),
            "run controller ready"
        );

        Ok(Self {
            shared: Arc::new(Shared {
                services,
                observers: StateObservers::new(config.event_capacity),
                config,
                pool,
                control: Mutex::new(ControlState {
                    state: RunState::NeverStarted,
                    token: None,
                    destination: None,
                }),
            }),
        })
    }

    pub fn with_defaults(services: AnalysisServices) -> Result<Self> {
        Self::new(services, BatchConfig::default())
    }

    pub fn state(&self) -> RunState {
        self.shared.control.lock().state
    }

    pub fn is_running(&self) -> bool {
        self.state() == RunState::Running
    }

    pub fn config(&self) -> &BatchConfig {
        &self.shared.config
    }

    pub fn worker_threads(&self) -> usize {
        self.shared.pool.current_num_threads()
    }

    /// Sink used by the next run
    pub fn destination(&self) -> Option<Arc<dyn ResultSink>> {
        self.shared.control.lock().destination.clone()
    }

    /// Replace the sink for future runs. Rejected while a run is active; the
    /// active run keeps the sink it captured at start either way.
    pub fn set_destination(&self, sink: Arc<dyn ResultSink>) -> Result<()> {
        let mut control = self.shared.control.lock();
        if control.state == RunState::Running {
            return Err(BatchError::invalid_state("change the destination", control.state));
        }
        control.destination = Some(sink);
        Ok(())
    }

    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(StateChange) + Send + Sync + 'static,
    {
        self.shared.observers.subscribe(callback)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.shared.observers.unsubscribe(id)
    }

    pub fn watch_states(&self) -> broadcast::Receiver<StateChange> {
        self.shared.observers.watch()
    }

    /// Launch a sweep of `workspace` on a background thread.
    ///
    /// Returns once the run is `Running`; the `Running` event is published
    /// before the sweep can publish its terminal event.
    pub fn start(&self, workspace: impl Into<Arc<Workspace>>) -> Result<RunHandle> {
        let workspace = workspace.into();
        let (go_tx, go_rx) = oneshot::channel::<()>();
        let (done_tx, done_rx) = watch::channel(None);

        let (handle, change) = {
            let mut control = self.shared.control.lock();
            if !control.state.accepts_start() {
                return Err(BatchError::invalid_state("start", control.state));
            }
            let sink = control.destination.clone().ok_or(BatchError::NoDestination)?;

            let token = CancellationToken::new();
            let session = RunSession::new(
                workspace.name.clone(),
                token.clone(),
                sink,
                workspace.total_analyzable_files(),
                Arc::clone(&self.shared.services.progress),
                self.shared.config.session_options(),
            );
            let run_id = session.run_id();

            let shared = Arc::clone(&self.shared);
            let thread = std::thread::Builder::new()
                .name(format!("{}-run", self.shared.config.thread_name_prefix))
                .spawn(move || {
                    // Hold until the Running event is out
                    let _ = go_rx.blocking_recv();
                    shared.execute(session, &workspace, done_tx)
                })?;

            debug_assert!(control.state.can_transition_to(RunState::Running));
            let change = StateChange::new(control.state, RunState::Running);
            control.state = RunState::Running;
            control.token = Some(token);
            (RunHandle::new(run_id, thread, done_rx), change)
        };

        info!(run_id = %handle.run_id(), "run started");
        self.shared.observers.publish(change);
        let _ = go_tx.send(());
        Ok(handle)
    }

    /// Signal the active run's token. Does not wait for the run to wind down.
    pub fn stop(&self) -> Result<()> {
        let control = self.shared.control.lock();
        match (control.state, control.token.as_ref()) {
            (RunState::Running, Some(token)) => {
                token.cancel();
                info!("stop requested");
                Ok(())
            }
            (state, _) => Err(BatchError::invalid_state("stop", state)),
        }
    }
}

impl Drop for RunController {
    fn drop(&mut self) {
        if let Some(token) = self.shared.control.lock().token.as_ref() {
            token.cancel();
        }
    }
}

impl Shared {
    /// Background body of a run; always ends in a terminal state.
    fn execute(
        &self,
        session: RunSession,
        workspace: &Workspace,
        done: watch::Sender<Option<RunSummary>>,
    ) -> RunSummary {
        let run_id = session.run_id();
        let progress = session.progress();
        progress.begin(&self.config.task_name);
        info!(
            %run_id,
            workspace = %workspace.name,
            projects = workspace.projects.len(),
            files = progress.total(),
            "sweep started"
        );

        let sweep = catch_unwind(AssertUnwindSafe(|| {
            self.pool
                .install(|| sweep_workspace(&self.services, &session, workspace))
        }));
        if let Err(payload) = sweep {
            let e = AnalysisError::from_panic(payload);
            error!(%run_id, error = %e, category = %e.category(), "sweep aborted");
        }
        progress.end();

        let change = {
            let mut control = self.control.lock();
            // Sampled exactly once, under the same lock as the transition
            let next = if session.is_cancelled() {
                RunState::Cancelled
            } else {
                RunState::Completed
            };
            debug_assert!(
                control.state.can_transition_to(next),
                "{} -> {}",
                control.state,
                next
            );
            let change = StateChange::new(control.state, next);
            control.state = next;
            control.token = None;
            change
        };

        let summary = session.summarize(change.new);
        info!(
            %run_id,
            state = %summary.state,
            files = summary.files_completed,
            issues = summary.issues_pushed,
            provider_failures = summary.provider_failures,
            duration_ms = summary.duration_ms,
            "sweep finished"
        );
        self.observers.publish(change);
        done.send_replace(Some(summary.clone()));
        summary
    }
}

/// Handle to a launched run
pub struct RunHandle {
    run_id: Uuid,
    thread: JoinHandle<RunSummary>,
    done: watch::Receiver<Option<RunSummary>>,
}

impl RunHandle {
    fn new(
        run_id: Uuid,
        thread: JoinHandle<RunSummary>,
        done: watch::Receiver<Option<RunSummary>>,
    ) -> Self {
        Self {
            run_id,
            thread,
            done,
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// True once the run reached its terminal state
    pub fn is_finished(&self) -> bool {
        self.done.borrow().is_some()
    }

    /// Block the calling thread until the run ends
    pub fn wait(self) -> Result<RunSummary> {
        self.thread
            .join()
            .map_err(|_| BatchError::RunPanicked(self.run_id))
    }

    /// Resolve once the run ends, without blocking the executor
    pub async fn finished(&mut self) -> Result<RunSummary> {
        let run_id = self.run_id;
        let summary = self
            .done
            .wait_for(Option::is_some)
            .await
            .map_err(|_| BatchError::RunPanicked(run_id))?;
        (*summary).clone().ok_or(BatchError::RunPanicked(run_id))
    }
}

impl std::fmt::Debug for RunHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunHandle")
            .field("run_id", &self.run_id)
            .field("finished", &self.is_finished())
            .finish()
    }
}
