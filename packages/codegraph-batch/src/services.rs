//! Host-provided collaborators, bundled once per controller.

use crate::domain::{
    AnalysisLogger, CompilationProvider, ContextBuilder, DefaultContextBuilder,
    FileSystemTextSource, ParserService, ProviderRegistry, TextSource, TracingLogger,
};
use crate::progress::{NullProgress, ProgressReporter};
use std::sync::Arc;

/// Everything the sweep calls out to.
///
/// Only compilation, parsing and provider lookup are mandatory; the rest
/// default to disk-backed text, a pass-through context builder, no progress
/// output and `tracing` error logging.
#[derive(Clone)]
pub struct AnalysisServices {
    pub compilations: Arc<dyn CompilationProvider>,
    pub parsers: Arc<dyn ParserService>,
    pub providers: Arc<dyn ProviderRegistry>,
    pub text_source: Arc<dyn TextSource>,
    pub context_builder: Arc<dyn ContextBuilder>,
    pub progress: Arc<dyn ProgressReporter>,
    pub logger: Arc<dyn AnalysisLogger>,
}

impl AnalysisServices {
    pub fn new(
        compilations: Arc<dyn CompilationProvider>,
        parsers: Arc<dyn ParserService>,
        providers: Arc<dyn ProviderRegistry>,
    ) -> Self {
        Self {
            compilations,
            parsers,
            providers,
            text_source: Arc::new(FileSystemTextSource),
            context_builder: Arc::new(DefaultContextBuilder),
            progress: Arc::new(NullProgress),
            logger: Arc::new(TracingLogger),
        }
    }

    pub fn with_text_source(mut self, text_source: Arc<dyn TextSource>) -> Self {
        self.text_source = text_source;
        self
    }

    pub fn with_context_builder(mut self, builder: Arc<dyn ContextBuilder>) -> Self {
        self.context_builder = builder;
        self
    }

    pub fn with_progress(mut self, progress: Arc<dyn ProgressReporter>) -> Self {
        self.progress = progress;
        self
    }

    pub fn with_logger(mut self, logger: Arc<dyn AnalysisLogger>) -> Self {
        self.logger = logger;
        self
    }
}
