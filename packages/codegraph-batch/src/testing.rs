//! In-memory fakes shared by unit tests.

use crate::domain::{
    AnalysisLogger, AnalyzableUnit, CompilationProvider, CompiledContext, IssueProvider,
    IssueStream, Project, ProjectFile, RawIssue, Region, ResolutionContext, Severity, TextDocument,
    TextSource, UnitParser,
};
use crate::error::AnalysisError;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Compilation is the project name
pub struct FixedCompilation;

impl CompilationProvider for FixedCompilation {
    fn compilation(&self, project: &Project) -> Result<CompiledContext, AnalysisError> {
        Ok(Arc::new(project.name.clone()))
    }
}

#[derive(Default)]
pub struct MemoryText {
    files: HashMap<PathBuf, String>,
}

impl MemoryText {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, path: impl Into<PathBuf>, text: &str) -> Self {
        self.files.insert(path.into(), text.to_string());
        self
    }
}

impl TextSource for MemoryText {
    fn open(&self, file: &ProjectFile) -> Result<TextDocument, AnalysisError> {
        let text = self
            .files
            .get(&file.path)
            .ok_or_else(|| AnalysisError::io(format!("{}: not found", file.path.display())))?;
        Ok(TextDocument::new(
            file.path.clone(),
            file.content_type.clone(),
            text.as_str(),
        ))
    }
}

/// Unit is the file text
pub struct TextParser;

impl UnitParser for TextParser {
    fn parse(
        &self,
        _interactive: bool,
        _path: &Path,
        content: &str,
        _project: &Project,
    ) -> Result<Option<AnalyzableUnit>, AnalysisError> {
        Ok(Some(Arc::new(content.to_string())))
    }
}

/// Emits `count` issues per file and counts its invocations
pub struct StaticProvider {
    title: String,
    severity: Severity,
    count: usize,
    calls: AtomicUsize,
}

impl StaticProvider {
    pub fn new(title: &str, severity: Severity, count: usize) -> Self {
        Self {
            title: title.to_string(),
            severity,
            count,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl IssueProvider for StaticProvider {
    fn title(&self) -> &str {
        &self.title
    }

    fn description(&self) -> &str {
        "static test provider"
    }

    fn category(&self) -> &str {
        "test"
    }

    fn severity(&self) -> Severity {
        self.severity
    }

    fn issues<'a>(
        &'a self,
        _context: &'a ResolutionContext,
        _token: &'a CancellationToken,
    ) -> IssueStream<'a> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Box::new((0..self.count).map(|i| {
            let line = i as u32 + 1;
            Ok::<_, AnalysisError>(RawIssue::new(format!("issue {}", line), Region::point(line, 1)))
        }))
    }
}

/// Logger that remembers every message
#[derive(Default)]
pub struct Recording {
    messages: Mutex<Vec<String>>,
}

impl Recording {
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().clone()
    }
}

impl AnalysisLogger for Recording {
    fn log_error(&self, message: &str, error: &AnalysisError) {
        self.messages.lock().push(format!("{}: {}", message, error));
    }
}

#[derive(Default)]
struct GateState {
    entered: AtomicUsize,
    open: std::sync::atomic::AtomicBool,
}

/// Lets a test hold providers inside `issues()` until released
#[derive(Clone, Default)]
pub struct Gate {
    state: Arc<GateState>,
}

impl Gate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&self) {
        self.state.open.store(true, Ordering::SeqCst);
    }

    fn is_open(&self) -> bool {
        self.state.open.load(Ordering::SeqCst)
    }

    /// Spin until at least one provider is parked at the gate
    pub fn wait_entered(&self) {
        let deadline = std::time::Instant::now() + std::time::Duration::from_secs(10);
        while self.state.entered.load(Ordering::SeqCst) == 0 {
            assert!(std::time::Instant::now() < deadline, "no provider reached the gate");
            std::thread::sleep(std::time::Duration::from_millis(1));
        }
    }
}

/// Emits one issue after its gate opens, or `Cancelled` if the token fires first
pub struct GatedProvider {
    gate: Gate,
}

impl GatedProvider {
    pub fn new(gate: Gate) -> Self {
        Self { gate }
    }
}

impl IssueProvider for GatedProvider {
    fn title(&self) -> &str {
        "gated"
    }

    fn description(&self) -> &str {
        "waits for the test to open its gate"
    }

    fn category(&self) -> &str {
        "test"
    }

    fn severity(&self) -> Severity {
        Severity::Warning
    }

    fn issues<'a>(
        &'a self,
        _context: &'a ResolutionContext,
        token: &'a CancellationToken,
    ) -> IssueStream<'a> {
        self.gate.state.entered.fetch_add(1, Ordering::SeqCst);
        while !self.gate.is_open() {
            if token.is_cancelled() {
                return Box::new(std::iter::once(Err::<RawIssue, _>(AnalysisError::Cancelled)));
            }
            std::thread::sleep(std::time::Duration::from_millis(1));
        }
        let issue = RawIssue::new("gated", Region::point(1, 1));
        Box::new(std::iter::once(Ok::<_, AnalysisError>(issue)))
    }
}
