/*
 * Domain Ports - Interfaces for external collaborators
 *
 * HEXAGONAL ARCHITECTURE:
 * - The batch runner defines these interfaces
 * - The host (IDE, CLI, language service) implements them
 * - Every port is Send + Sync: it is called from rayon workers
 */

use super::models::{
    AnalyzableUnit, CompiledContext, MarkerKind, Project, ProjectFile, RawIssue, Severity,
};
use crate::error::AnalysisError;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Port: per-project compilation (driven port)
pub trait CompilationProvider: Send + Sync {
    fn compilation(&self, project: &Project) -> Result<CompiledContext, AnalysisError>;
}

/// Read-only view of a file's content
#[derive(Debug, Clone)]
pub struct TextDocument {
    pub path: PathBuf,
    pub content_type: String,
    pub text: Arc<str>,
}

impl TextDocument {
    pub fn new(
        path: impl Into<PathBuf>,
        content_type: impl Into<String>,
        text: impl Into<Arc<str>>,
    ) -> Self {
        Self {
            path: path.into(),
            content_type: content_type.into(),
            text: text.into(),
        }
    }
}

/// Port: text access shim
pub trait TextSource: Send + Sync {
    fn open(&self, file: &ProjectFile) -> Result<TextDocument, AnalysisError>;
}

/// Reads file content from disk, content type comes from the project file
#[derive(Debug, Clone, Copy, Default)]
pub struct FileSystemTextSource;

impl TextSource for FileSystemTextSource {
    fn open(&self, file: &ProjectFile) -> Result<TextDocument, AnalysisError> {
        let text = std::fs::read_to_string(&file.path)
            .map_err(|e| AnalysisError::io(format!("{}: {}", file.path.display(), e)))?;
        Ok(TextDocument::new(
            file.path.clone(),
            file.content_type.clone(),
            text,
        ))
    }
}

/// Port: parser for one content type
pub trait UnitParser: Send + Sync {
    /// `Ok(None)` means the content is not analyzable (unsupported or malformed)
    fn parse(
        &self,
        interactive: bool,
        path: &Path,
        content: &str,
        project: &Project,
    ) -> Result<Option<AnalyzableUnit>, AnalysisError>;
}

/// Port: parser lookup by content type
pub trait ParserService: Send + Sync {
    fn parser_for(&self, content_type: &str) -> Option<Arc<dyn UnitParser>>;
}

/// Everything a provider gets to inspect for one file
#[derive(Clone)]
pub struct ResolutionContext {
    compilation: CompiledContext,
    unit: AnalyzableUnit,
    document: TextDocument,
    token: CancellationToken,
}

impl ResolutionContext {
    pub fn new(
        compilation: CompiledContext,
        unit: AnalyzableUnit,
        document: TextDocument,
        token: CancellationToken,
    ) -> Self {
        Self {
            compilation,
            unit,
            document,
            token,
        }
    }

    pub fn compilation(&self) -> &CompiledContext {
        &self.compilation
    }

    pub fn unit(&self) -> &AnalyzableUnit {
        &self.unit
    }

    /// Typed access to the parsed unit
    pub fn unit_as<T: 'static>(&self) -> Option<&T> {
        self.unit.downcast_ref::<T>()
    }

    /// Typed access to the project compilation
    pub fn compilation_as<T: 'static>(&self) -> Option<&T> {
        self.compilation.downcast_ref::<T>()
    }

    pub fn document(&self) -> &TextDocument {
        &self.document
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}

impl std::fmt::Debug for ResolutionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolutionContext")
            .field("path", &self.document.path)
            .field("content_type", &self.document.content_type)
            .field("cancelled", &self.token.is_cancelled())
            .finish()
    }
}

/// Port: binds a parsed unit to its project's compilation
pub trait ContextBuilder: Send + Sync {
    fn build(
        &self,
        compilation: &CompiledContext,
        unit: AnalyzableUnit,
        document: TextDocument,
        token: &CancellationToken,
    ) -> Result<ResolutionContext, AnalysisError>;
}

/// Bundles the inputs without further resolution
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultContextBuilder;

impl ContextBuilder for DefaultContextBuilder {
    fn build(
        &self,
        compilation: &CompiledContext,
        unit: AnalyzableUnit,
        document: TextDocument,
        token: &CancellationToken,
    ) -> Result<ResolutionContext, AnalysisError> {
        Ok(ResolutionContext::new(
            Arc::clone(compilation),
            unit,
            document,
            token.clone(),
        ))
    }
}

/// Lazy issue sequence. `Err(AnalysisError::Cancelled)` ends it quietly.
pub type IssueStream<'a> = Box<dyn Iterator<Item = Result<RawIssue, AnalysisError>> + 'a>;

/// Port: one analysis rule
///
/// Implementations should poll `token` between emissions.
pub trait IssueProvider: Send + Sync {
    fn title(&self) -> &str;

    fn description(&self) -> &str;

    fn category(&self) -> &str;

    /// Current severity; `Severity::None` disables the provider
    fn severity(&self) -> Severity;

    fn marker(&self) -> MarkerKind {
        MarkerKind::WavedLine
    }

    fn issues<'a>(
        &'a self,
        context: &'a ResolutionContext,
        token: &'a CancellationToken,
    ) -> IssueStream<'a>;
}

/// Port: providers applicable to a content type
pub trait ProviderRegistry: Send + Sync {
    fn providers_for(&self, content_type: &str) -> Vec<Arc<dyn IssueProvider>>;
}

/// Port: error reporting for absorbed failures
pub trait AnalysisLogger: Send + Sync {
    fn log_error(&self, message: &str, error: &AnalysisError);
}

/// Forwards to `tracing::error!`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl AnalysisLogger for TracingLogger {
    fn log_error(&self, message: &str, error: &AnalysisError) {
        tracing::error!(category = %error.category(), error = %error, "{}", message);
    }
}
