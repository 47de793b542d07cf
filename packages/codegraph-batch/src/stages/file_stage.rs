//! File tier: text, parse, resolve, then fan out over the file's providers.

use super::provider_stage::{ProviderAdapter, ProviderOutcome};
use crate::domain::{CompiledContext, Project, ProjectFile, ResolutionContext, UnitParser};
use crate::error::AnalysisError;
use crate::services::AnalysisServices;
use crate::session::RunSession;
use dashmap::DashMap;
use rayon::prelude::*;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tracing::debug;

/// Why a dispatched file produced no provider work
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NotAnalyzable,
    Cancelled,
    NoParser,
    /// Parser returned no unit
    NoUnit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    Analyzed { providers: usize, pushed: usize },
    Skipped(SkipReason),
    Failed,
}

/// Parser and provider lookups keyed by content type.
///
/// Lives for one project sweep. Lookups run outside the map's shard lock so
/// host services never execute while a shard is held.
#[derive(Default)]
pub struct ContentTypeCache {
    parsers: DashMap<String, Option<Arc<dyn UnitParser>>>,
    providers: DashMap<String, Arc<Vec<ProviderAdapter>>>,
}

impl ContentTypeCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parser(
        &self,
        services: &AnalysisServices,
        content_type: &str,
    ) -> Option<Arc<dyn UnitParser>> {
        if let Some(hit) = self.parsers.get(content_type) {
            return hit.value().clone();
        }
        let parser = services.parsers.parser_for(content_type);
        self.parsers
            .entry(content_type.to_string())
            .or_insert(parser)
            .value()
            .clone()
    }

    pub fn providers(
        &self,
        services: &AnalysisServices,
        content_type: &str,
    ) -> Arc<Vec<ProviderAdapter>> {
        if let Some(hit) = self.providers.get(content_type) {
            return Arc::clone(hit.value());
        }
        let adapters: Vec<ProviderAdapter> = services
            .providers
            .providers_for(content_type)
            .into_iter()
            .map(ProviderAdapter::new)
            .collect();
        Arc::clone(
            self.providers
                .entry(content_type.to_string())
                .or_insert_with(|| Arc::new(adapters))
                .value(),
        )
    }

    /// Content types with a resolved parser lookup (hit or miss)
    pub fn parser_count(&self) -> usize {
        self.parsers.len()
    }

    pub fn provider_count(&self) -> usize {
        self.providers.len()
    }
}

/// Analyzes single files of one project against its compilation
pub struct FileAnalyzer<'a> {
    services: &'a AnalysisServices,
    session: &'a RunSession,
    cache: &'a ContentTypeCache,
    project: &'a Arc<Project>,
    compilation: &'a CompiledContext,
}

impl<'a> FileAnalyzer<'a> {
    pub fn new(
        services: &'a AnalysisServices,
        session: &'a RunSession,
        cache: &'a ContentTypeCache,
        project: &'a Arc<Project>,
        compilation: &'a CompiledContext,
    ) -> Self {
        Self {
            services,
            session,
            cache,
            project,
            compilation,
        }
    }

    pub fn analyze(&self, file: &Arc<ProjectFile>) -> FileOutcome {
        if self.session.is_cancelled() {
            return FileOutcome::Skipped(SkipReason::Cancelled);
        }
        if !file.is_analyzable() {
            return FileOutcome::Skipped(SkipReason::NotAnalyzable);
        }

        let context = match self.resolve(file) {
            Ok(Some(context)) => context,
            Ok(None) => return FileOutcome::Skipped(SkipReason::NoUnit),
            Err(Resolve::NoParser) => return FileOutcome::Skipped(SkipReason::NoParser),
            Err(Resolve::Failed(e)) if e.is_cancellation() => {
                return FileOutcome::Skipped(SkipReason::Cancelled)
            }
            Err(Resolve::Failed(e)) => {
                let message = format!("Error while resolving {}", file.path.display());
                self.services.logger.log_error(&message, &e);
                return FileOutcome::Failed;
            }
        };

        let adapters = self.cache.providers(self.services, &file.content_type);
        let logger = self.services.logger.as_ref();
        let outcomes: Vec<ProviderOutcome> = adapters
            .par_iter()
            .map(|adapter| adapter.run(&context, file, self.project, self.session, logger))
            .collect();

        let providers = outcomes
            .iter()
            .filter(|o| !matches!(o, ProviderOutcome::Disabled | ProviderOutcome::Skipped))
            .count();
        let pushed = outcomes.iter().map(ProviderOutcome::pushed).sum();
        debug!(
            file = %file.path.display(),
            providers,
            pushed,
            "file analyzed"
        );
        FileOutcome::Analyzed { providers, pushed }
    }

    fn resolve(&self, file: &ProjectFile) -> Result<Option<ResolutionContext>, Resolve> {
        let document = self
            .services
            .text_source
            .open(file)
            .map_err(Resolve::Failed)?;
        let parser = self
            .cache
            .parser(self.services, &file.content_type)
            .ok_or(Resolve::NoParser)?;

        let parse_and_bind = || -> Result<Option<ResolutionContext>, AnalysisError> {
            let unit = parser.parse(
                self.session.options().interactive_parse,
                &file.path,
                &document.text,
                self.project,
            )?;
            let Some(unit) = unit else {
                return Ok(None);
            };
            let context = self.services.context_builder.build(
                self.compilation,
                unit,
                document.clone(),
                self.session.token(),
            )?;
            Ok(Some(context))
        };

        let result = if self.session.options().isolate_provider_panics {
            catch_unwind(AssertUnwindSafe(parse_and_bind))
                .unwrap_or_else(|payload| Err(AnalysisError::from_panic(payload)))
        } else {
            parse_and_bind()
        };
        result.map_err(Resolve::Failed)
    }
}

enum Resolve {
    NoParser,
    Failed(AnalysisError),
}
