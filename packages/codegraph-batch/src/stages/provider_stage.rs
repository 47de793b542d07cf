//! Provider tier: one provider against one resolved file.

use crate::domain::{
    AnalysisLogger, IssueProvider, IssueRecord, Project, ProjectFile, ResolutionContext, Severity,
};
use crate::error::AnalysisError;
use crate::session::{RunSession, SweepStats};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tracing::debug;

/// How one provider fared against one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderOutcome {
    /// `Severity::None`, `issues()` never called
    Disabled,
    /// Token was already signaled, `issues()` never called
    Skipped,
    Completed { pushed: usize },
    Cancelled { pushed: usize },
    Failed { pushed: usize },
}

impl ProviderOutcome {
    pub fn pushed(&self) -> usize {
        match self {
            ProviderOutcome::Completed { pushed }
            | ProviderOutcome::Cancelled { pushed }
            | ProviderOutcome::Failed { pushed } => *pushed,
            ProviderOutcome::Disabled | ProviderOutcome::Skipped => 0,
        }
    }
}

/// Wraps one provider: short-circuits disabled/cancelled runs, stamps
/// provenance onto raw issues and keeps provider failures local.
#[derive(Clone)]
pub struct ProviderAdapter {
    provider: Arc<dyn IssueProvider>,
}

impl ProviderAdapter {
    pub fn new(provider: Arc<dyn IssueProvider>) -> Self {
        Self { provider }
    }

    pub fn severity(&self) -> Severity {
        self.provider.severity()
    }

    pub fn title(&self) -> &str {
        self.provider.title()
    }

    /// Stream the provider's issues for one file into the session sink.
    pub fn run(
        &self,
        context: &ResolutionContext,
        file: &Arc<ProjectFile>,
        project: &Arc<Project>,
        session: &RunSession,
        logger: &dyn AnalysisLogger,
    ) -> ProviderOutcome {
        let severity = self.provider.severity();
        if !severity.is_enabled() {
            return ProviderOutcome::Disabled;
        }
        if session.is_cancelled() {
            return ProviderOutcome::Skipped;
        }

        let mut pushed = 0usize;
        let result = if session.options().isolate_provider_panics {
            catch_unwind(AssertUnwindSafe(|| {
                self.stream(context, file, project, session, severity, &mut pushed)
            }))
            .unwrap_or_else(|payload| Err(AnalysisError::from_panic(payload)))
        } else {
            self.stream(context, file, project, session, severity, &mut pushed)
        };

        match result {
            Ok(()) => ProviderOutcome::Completed { pushed },
            Err(e) if e.is_cancellation() => {
                debug!(provider = self.title(), file = %file.path.display(), "provider cancelled");
                ProviderOutcome::Cancelled { pushed }
            }
            Err(e) => {
                SweepStats::bump(&session.stats().provider_failures, 1);
                self.report_failure(logger, file, &e);
                ProviderOutcome::Failed { pushed }
            }
        }
    }

    fn stream(
        &self,
        context: &ResolutionContext,
        file: &Arc<ProjectFile>,
        project: &Arc<Project>,
        session: &RunSession,
        severity: Severity,
        pushed: &mut usize,
    ) -> Result<(), AnalysisError> {
        let provider = self.provider.as_ref();
        for raw in provider.issues(context, session.token()) {
            let record = IssueRecord::new(
                raw?,
                provider.title(),
                provider.description(),
                provider.category(),
                severity,
                provider.marker(),
                Arc::clone(file),
                Arc::clone(project),
            );
            session.push(record);
            *pushed += 1;
        }
        Ok(())
    }

    fn report_failure(
        &self,
        logger: &dyn AnalysisLogger,
        file: &ProjectFile,
        error: &AnalysisError,
    ) {
        let message = format!(
            "Error while running provider '{}' on {}",
            self.title(),
            file.path.display()
        );
        logger.log_error(&message, error);
    }
}
