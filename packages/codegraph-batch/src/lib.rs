/*
 * Codegraph Batch - Workspace-wide Analysis Runner
 *
 * Runs pluggable issue providers over every analyzable file of a workspace
 * and streams their findings into a result sink.
 *
 * Architecture:
 * - Run Controller (state machine + background run thread)
 * - Project Sweep (sequential, one compilation resident at a time)
 * - File Analysis Stage (rayon fan-out over files)
 * - Provider Adapter (rayon fan-out over providers, failure isolation)
 *
 * Cancellation is cooperative: `stop()` signals a token that every tier polls.
 */

// Public modules
pub mod config;
pub mod controller;
pub mod domain;
pub mod error;
pub mod progress;
pub mod registry;
pub mod run_state;
pub mod services;
pub mod session;
pub mod sink;
pub mod stages;
pub mod telemetry;

#[cfg(test)]
mod testing;

// Re-exports
pub use config::BatchConfig;
pub use controller::{RunController, RunHandle};
pub use domain::{
    AnalysisLogger, AnalyzableUnit, BuildAction, CompilationProvider, CompiledContext,
    ContextBuilder, DefaultContextBuilder, FileSystemTextSource, IssueProvider, IssueRecord,
    IssueStream, MarkerKind, ParserService, Project, ProjectFile, ProviderRegistry, RawIssue,
    Region, ResolutionContext, Severity, TextDocument, TextSource, TracingLogger, UnitParser,
    Workspace,
};
pub use error::{AnalysisError, BatchError, ErrorCategory, Result};
pub use progress::{NullProgress, ProgressReporter, ProgressTracker, TracingProgress};
pub use registry::{InspectorRegistry, ParserTable, ANY_CONTENT_TYPE};
pub use run_state::{RunState, StateChange, SubscriptionId};
pub use services::AnalysisServices;
pub use session::{RunSummary, SessionOptions};
pub use sink::{ChannelSink, IssueCollector, ResultSink, SeverityCount};
pub use tokio_util::sync::CancellationToken;
