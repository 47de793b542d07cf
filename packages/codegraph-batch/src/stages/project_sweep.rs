//! Project tier: projects in input order, files of one project in parallel.

use super::file_stage::{ContentTypeCache, FileAnalyzer, FileOutcome};
use crate::domain::{CompiledContext, Project, ProjectFile, Workspace};
use crate::error::AnalysisError;
use crate::services::AnalysisServices;
use crate::session::{RunSession, SweepStats};
use rayon::prelude::*;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, info};

/// How one project fared
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectOutcome {
    /// No analyzable files, compilation never requested
    Empty,
    Swept { files: usize },
    /// Compilation could not be resolved, files reported as one bulk step
    Failed { files: usize },
}

/// Sweep every project of the workspace, stopping at the first project
/// boundary after the token is signaled.
///
/// Must run inside the worker pool (`ThreadPool::install`) so the nested
/// fan-out lands on the controller's threads.
pub fn sweep_workspace(services: &AnalysisServices, session: &RunSession, workspace: &Workspace) {
    let stats = session.stats();
    for (index, project) in workspace.projects.iter().enumerate() {
        if session.is_cancelled() {
            let remaining = workspace.projects.len() - index;
            SweepStats::bump(&stats.projects_skipped, remaining);
            info!(
                run_id = %session.run_id(),
                remaining,
                "cancellation observed, not visiting further projects"
            );
            break;
        }

        SweepStats::bump(&stats.projects_visited, 1);
        let outcome = sweep_project(services, session, project);
        debug!(run_id = %session.run_id(), project = %project.name, ?outcome, "project done");
    }
}

/// Resolve one project's compilation and analyze its files in parallel.
pub fn sweep_project(
    services: &AnalysisServices,
    session: &RunSession,
    project: &Arc<Project>,
) -> ProjectOutcome {
    let files: Vec<&Arc<ProjectFile>> = project.analyzable_files().collect();
    if files.is_empty() {
        return ProjectOutcome::Empty;
    }

    let compilation = match resolve_compilation(services, session, project) {
        Ok(compilation) => compilation,
        Err(e) => {
            let stats = session.stats();
            if e.is_cancellation() {
                SweepStats::bump(&stats.files_skipped, files.len());
            } else {
                let message = format!("Error while resolving compilation for {}", project.name);
                services.logger.log_error(&message, &e);
                SweepStats::bump(&stats.projects_failed, 1);
                SweepStats::bump(&stats.files_failed, files.len());
            }
            session.progress().advance(files.len());
            return ProjectOutcome::Failed { files: files.len() };
        }
    };

    let cache = ContentTypeCache::new();
    let analyzer = FileAnalyzer::new(services, session, &cache, project, &compilation);
    files.par_iter().for_each(|file| {
        let outcome = analyzer.analyze(file);
        record(session.stats(), &outcome);
        session.progress().advance(1);
    });

    ProjectOutcome::Swept { files: files.len() }
}

fn resolve_compilation(
    services: &AnalysisServices,
    session: &RunSession,
    project: &Project,
) -> Result<CompiledContext, AnalysisError> {
    let resolve = || services.compilations.compilation(project);
    if session.options().isolate_provider_panics {
        catch_unwind(AssertUnwindSafe(resolve))
            .unwrap_or_else(|payload| Err(AnalysisError::from_panic(payload)))
    } else {
        resolve()
    }
}

fn record(stats: &SweepStats, outcome: &FileOutcome) {
    match outcome {
        FileOutcome::Analyzed { .. } => SweepStats::bump(&stats.files_analyzed, 1),
        FileOutcome::Skipped(_) => SweepStats::bump(&stats.files_skipped, 1),
        FileOutcome::Failed => SweepStats::bump(&stats.files_failed, 1),
    }
}
