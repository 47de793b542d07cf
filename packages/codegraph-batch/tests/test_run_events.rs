//! Async observation of runs: handle futures, state broadcast, channel sink

mod common;

use codegraph_batch::{
    BatchConfig, ChannelSink, InspectorRegistry, IssueCollector, Project, ProjectFile,
    RunController, RunState, Severity, StateChange, Workspace,
};
use common::{services, BlockingProvider, MatchProvider, CS};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn workspace(files: usize) -> Workspace {
    let project = (0..files).fold(Project::new("lib"), |project, i| {
        project.with_file(ProjectFile::compile(format!("lib/f{}.cs", i), CS))
    });
    Workspace::new("ws").with_project(project)
}

#[tokio::test]
async fn test_finished_resolves_with_summary() {
    let controller = RunController::new(
        services(InspectorRegistry::new().with_provider(
            CS,
            MatchProvider::new("all", Severity::Warning, ".cs"),
        )),
        BatchConfig::default().with_worker_threads(2),
    )
    .unwrap();
    controller.set_destination(Arc::new(IssueCollector::new())).unwrap();

    let mut handle = controller.start(workspace(5)).unwrap();
    let summary = handle.finished().await.unwrap();

    assert!(handle.is_finished());
    assert_eq!(summary.run_id, handle.run_id());
    assert_eq!(summary.state, RunState::Completed);
    assert_eq!(summary.issues_pushed, 5);
    assert_eq!(summary.files_completed, 5);
    assert_eq!(handle.wait().unwrap().issues_pushed, 5);
}

#[tokio::test]
async fn test_watch_states_sees_both_transitions() {
    let controller = RunController::new(
        services(InspectorRegistry::new()),
        BatchConfig::default().with_worker_threads(2),
    )
    .unwrap();
    controller.set_destination(Arc::new(IssueCollector::new())).unwrap();
    let mut states = controller.watch_states();

    let mut handle = controller.start(workspace(2)).unwrap();
    handle.finished().await.unwrap();

    assert_eq!(
        states.recv().await.unwrap(),
        StateChange::new(RunState::NeverStarted, RunState::Running)
    );
    assert_eq!(
        states.recv().await.unwrap(),
        StateChange::new(RunState::Running, RunState::Completed)
    );
}

#[tokio::test]
async fn test_cancelled_run_reports_through_future() {
    let blocking = Arc::new(BlockingProvider::default());
    let mut registry = InspectorRegistry::new();
    registry.register_shared(CS, blocking.clone());
    let controller =
        RunController::new(services(registry), BatchConfig::default().with_worker_threads(2))
            .unwrap();
    controller.set_destination(Arc::new(IssueCollector::new())).unwrap();

    let mut handle = controller.start(workspace(3)).unwrap();
    let waiter = Arc::clone(&blocking);
    tokio::task::spawn_blocking(move || waiter.wait_entered())
        .await
        .unwrap();
    controller.stop().unwrap();

    let summary = handle.finished().await.unwrap();
    assert!(summary.was_cancelled());
    assert_eq!(controller.state(), RunState::Cancelled);
}

#[tokio::test]
async fn test_channel_sink_streams_records() {
    let (sink, mut rx) = ChannelSink::new();
    let controller = RunController::new(
        services(InspectorRegistry::new().with_provider(
            CS,
            MatchProvider::new("all", Severity::Error, ".cs"),
        )),
        BatchConfig::default().with_worker_threads(2),
    )
    .unwrap();
    controller.set_destination(Arc::new(sink)).unwrap();

    let mut handle = controller.start(workspace(4)).unwrap();
    handle.finished().await.unwrap();
    // The controller still holds the sink as its destination
    let mut received = Vec::new();
    while let Ok(record) = rx.try_recv() {
        received.push(record);
    }

    assert_eq!(received.len(), 4);
    assert!(received.iter().all(|r| r.severity() == Severity::Error));
}

#[tokio::test]
async fn test_unsubscribed_callback_is_silent() {
    let controller = RunController::new(
        services(InspectorRegistry::new()),
        BatchConfig::default().with_worker_threads(1),
    )
    .unwrap();
    controller.set_destination(Arc::new(IssueCollector::new())).unwrap();
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&hits);
    let id = controller.subscribe(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    controller.start(workspace(1)).unwrap().finished().await.unwrap();
    assert_eq!(hits.load(Ordering::SeqCst), 2);

    assert!(controller.unsubscribe(id));
    controller.start(workspace(1)).unwrap().finished().await.unwrap();
    assert_eq!(hits.load(Ordering::SeqCst), 2);
}
