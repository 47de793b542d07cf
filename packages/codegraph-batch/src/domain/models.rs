/*
 * Domain Models - Workspace input and issue records
 *
 * Pure data, shared across worker threads via Arc
 */

use std::any::Any;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Opaque per-project compilation produced by a [`CompilationProvider`](super::ports::CompilationProvider).
///
/// Providers downcast to the concrete type they expect.
pub type CompiledContext = Arc<dyn Any + Send + Sync>;

/// Opaque parsed/semantic representation of one file
pub type AnalyzableUnit = Arc<dyn Any + Send + Sync>;

// ═══════════════════════════════════════════════════════════════════════════
// Workspace input
// ═══════════════════════════════════════════════════════════════════════════

/// Build classification of a project file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BuildAction {
    #[default]
    Compile,
    None,
    Content,
    EmbeddedResource,
}

impl BuildAction {
    /// Only compiled sources are handed to providers
    pub fn is_analyzable(&self) -> bool {
        matches!(self, BuildAction::Compile)
    }
}

/// One file of a project
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectFile {
    pub path: PathBuf,
    pub build_action: BuildAction,
    /// MIME-style content type, e.g. `text/x-csharp`
    pub content_type: String,
}

impl ProjectFile {
    pub fn new(
        path: impl Into<PathBuf>,
        build_action: BuildAction,
        content_type: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            build_action,
            content_type: content_type.into(),
        }
    }

    /// Shorthand for a `Compile` file
    pub fn compile(path: impl Into<PathBuf>, content_type: impl Into<String>) -> Self {
        Self::new(path, BuildAction::Compile, content_type)
    }

    pub fn is_analyzable(&self) -> bool {
        self.build_action.is_analyzable()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// A project: a named, ordered set of files
#[derive(Debug, Clone, Default)]
pub struct Project {
    pub name: String,
    pub files: Vec<Arc<ProjectFile>>,
}

impl Project {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            files: Vec::new(),
        }
    }

    pub fn with_file(mut self, file: ProjectFile) -> Self {
        self.files.push(Arc::new(file));
        self
    }

    pub fn with_files<I>(mut self, files: I) -> Self
    where
        I: IntoIterator<Item = ProjectFile>,
    {
        self.files.extend(files.into_iter().map(Arc::new));
        self
    }

    pub fn analyzable_files(&self) -> impl Iterator<Item = &Arc<ProjectFile>> {
        self.files.iter().filter(|f| f.is_analyzable())
    }

    pub fn analyzable_count(&self) -> usize {
        self.analyzable_files().count()
    }
}

/// The input of one run: projects in visiting order
#[derive(Debug, Clone, Default)]
pub struct Workspace {
    pub name: String,
    pub projects: Vec<Arc<Project>>,
}

impl Workspace {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            projects: Vec::new(),
        }
    }

    pub fn with_project(mut self, project: Project) -> Self {
        self.projects.push(Arc::new(project));
        self
    }

    /// Up-front pre-pass used for progress accounting
    pub fn total_analyzable_files(&self) -> usize {
        self.projects.iter().map(|p| p.analyzable_count()).sum()
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Issues
// ═══════════════════════════════════════════════════════════════════════════

/// Provider severity. `None` disables the provider for the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    None,
    Hint,
    Suggestion,
    Warning,
    Error,
}

impl Severity {
    pub fn is_enabled(&self) -> bool {
        !matches!(self, Severity::None)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::None => "none",
            Severity::Hint => "hint",
            Severity::Suggestion => "suggestion",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How an editor should decorate the issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MarkerKind {
    None,
    #[default]
    WavedLine,
    DottedLine,
    GrayOut,
}

/// 1-based line/column span
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Region {
    pub begin_line: u32,
    pub begin_column: u32,
    pub end_line: u32,
    pub end_column: u32,
}

impl Region {
    pub fn new(begin_line: u32, begin_column: u32, end_line: u32, end_column: u32) -> Self {
        Self {
            begin_line,
            begin_column,
            end_line,
            end_column,
        }
    }

    /// Zero-width region at a single position
    pub fn point(line: u32, column: u32) -> Self {
        Self::new(line, column, line, column)
    }

    pub fn is_empty(&self) -> bool {
        self.begin_line == self.end_line && self.begin_column == self.end_column
    }
}

impl std::fmt::Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}-{}:{}",
            self.begin_line, self.begin_column, self.end_line, self.end_column
        )
    }
}

/// What a provider yields: text plus location, no provenance yet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawIssue {
    pub description: String,
    pub region: Region,
}

impl RawIssue {
    pub fn new(description: impl Into<String>, region: Region) -> Self {
        Self {
            description: description.into(),
            region,
        }
    }
}

/// A finding with full provenance. Immutable once constructed.
#[derive(Debug, Clone)]
pub struct IssueRecord {
    description: String,
    location: Region,
    provider_title: String,
    provider_description: String,
    provider_category: String,
    severity: Severity,
    marker: MarkerKind,
    source_file: Arc<ProjectFile>,
    source_project: Arc<Project>,
}

impl IssueRecord {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        raw: RawIssue,
        provider_title: impl Into<String>,
        provider_description: impl Into<String>,
        provider_category: impl Into<String>,
        severity: Severity,
        marker: MarkerKind,
        source_file: Arc<ProjectFile>,
        source_project: Arc<Project>,
    ) -> Self {
        Self {
            description: raw.description,
            location: raw.region,
            provider_title: provider_title.into(),
            provider_description: provider_description.into(),
            provider_category: provider_category.into(),
            severity,
            marker,
            source_file,
            source_project,
        }
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn location(&self) -> Region {
        self.location
    }

    pub fn provider_title(&self) -> &str {
        &self.provider_title
    }

    pub fn provider_description(&self) -> &str {
        &self.provider_description
    }

    pub fn provider_category(&self) -> &str {
        &self.provider_category
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn marker(&self) -> MarkerKind {
        self.marker
    }

    pub fn source_file(&self) -> &Arc<ProjectFile> {
        &self.source_file
    }

    pub fn source_project(&self) -> &Arc<Project> {
        &self.source_project
    }
}
