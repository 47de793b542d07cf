//! Shared fakes for integration tests

#![allow(dead_code)]

use codegraph_batch::{
    AnalysisError, AnalysisServices, AnalyzableUnit, CancellationToken, CompilationProvider,
    CompiledContext, InspectorRegistry, IssueProvider, IssueStream, ParserTable,
    ProgressReporter, Project, ProjectFile, RawIssue, Region, ResolutionContext, Severity,
    TextDocument, TextSource, UnitParser,
};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

pub const CS: &str = "text/x-csharp";

/// Compilation is the project name; listed projects fail
#[derive(Default)]
pub struct Compilations {
    broken: HashSet<String>,
}

impl Compilations {
    pub fn failing(names: &[&str]) -> Self {
        Self {
            broken: names.iter().map(|n| n.to_string()).collect(),
        }
    }
}

impl CompilationProvider for Compilations {
    fn compilation(&self, project: &Project) -> Result<CompiledContext, AnalysisError> {
        if self.broken.contains(&project.name) {
            return Err(AnalysisError::compilation(format!(
                "{} has unresolved references",
                project.name
            )));
        }
        Ok(Arc::new(project.name.clone()))
    }
}

/// Text is the file name
pub struct NameAsText;

impl TextSource for NameAsText {
    fn open(&self, file: &ProjectFile) -> Result<TextDocument, AnalysisError> {
        let text = file.path.display().to_string();
        Ok(TextDocument::new(
            file.path.clone(),
            file.content_type.clone(),
            text.as_str(),
        ))
    }
}

/// Unit is the text, records the interactive flag
#[derive(Default)]
pub struct TextParser {
    pub saw_batch_parse: AtomicBool,
}

impl UnitParser for TextParser {
    fn parse(
        &self,
        interactive: bool,
        _path: &Path,
        content: &str,
        _project: &Project,
    ) -> Result<Option<AnalyzableUnit>, AnalysisError> {
        if !interactive {
            self.saw_batch_parse.store(true, Ordering::SeqCst);
        }
        Ok(Some(Arc::new(content.to_string())))
    }
}

/// One issue per file whose text contains `needle`
pub struct MatchProvider {
    pub title: &'static str,
    pub severity: Severity,
    pub needle: &'static str,
    pub calls: AtomicUsize,
}

impl MatchProvider {
    pub fn new(title: &'static str, severity: Severity, needle: &'static str) -> Self {
        Self {
            title,
            severity,
            needle,
            calls: AtomicUsize::new(0),
        }
    }
}

impl IssueProvider for MatchProvider {
    fn title(&self) -> &str {
        self.title
    }

    fn description(&self) -> &str {
        "flags files by name"
    }

    fn category(&self) -> &str {
        "naming"
    }

    fn severity(&self) -> Severity {
        self.severity
    }

    fn issues<'a>(
        &'a self,
        context: &'a ResolutionContext,
        _token: &'a CancellationToken,
    ) -> IssueStream<'a> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let text = context.unit_as::<String>().cloned().unwrap_or_default();
        let hit = text.contains(self.needle);
        let issue = hit.then(|| {
            Ok::<_, AnalysisError>(RawIssue::new(
                format!("{} matched", text),
                Region::new(1, 1, 1, 4),
            ))
        });
        Box::new(issue.into_iter())
    }
}

/// Fails on every file after yielding nothing
pub struct FailingProvider;

impl IssueProvider for FailingProvider {
    fn title(&self) -> &str {
        "failing"
    }

    fn description(&self) -> &str {
        "always errors"
    }

    fn category(&self) -> &str {
        "broken"
    }

    fn severity(&self) -> Severity {
        Severity::Error
    }

    fn issues<'a>(
        &'a self,
        _context: &'a ResolutionContext,
        _token: &'a CancellationToken,
    ) -> IssueStream<'a> {
        Box::new(std::iter::once(Err::<RawIssue, _>(AnalysisError::provider("rule crashed"))))
    }
}

/// Blocks inside `issues()` until opened or cancelled
#[derive(Default)]
pub struct BlockingProvider {
    entered: AtomicUsize,
    open: AtomicBool,
}

impl BlockingProvider {
    pub fn open(&self) {
        self.open.store(true, Ordering::SeqCst);
    }

    pub fn wait_entered(&self) {
        wait_until(|| self.entered.load(Ordering::SeqCst) > 0);
    }
}

impl IssueProvider for BlockingProvider {
    fn title(&self) -> &str {
        "blocking"
    }

    fn description(&self) -> &str {
        "waits for the test"
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
        self.entered.fetch_add(1, Ordering::SeqCst);
        while !self.open.load(Ordering::SeqCst) {
            if token.is_cancelled() {
                return Box::new(std::iter::once(Err::<RawIssue, _>(AnalysisError::Cancelled)));
            }
            std::thread::sleep(Duration::from_millis(1));
        }
        let issue = RawIssue::new("released", Region::point(1, 1));
        Box::new(std::iter::once(Ok::<_, AnalysisError>(issue)))
    }
}

/// Records everything the runner reports
#[derive(Default)]
pub struct RecordingProgress {
    pub begun: Mutex<Vec<(String, usize)>>,
    pub steps: AtomicUsize,
    pub step_calls: AtomicUsize,
    pub ended: AtomicUsize,
}

impl RecordingProgress {
    pub fn steps(&self) -> usize {
        self.steps.load(Ordering::SeqCst)
    }
}

impl ProgressReporter for RecordingProgress {
    fn begin_task(&self, name: &str, total: usize) {
        self.begun.lock().push((name.to_string(), total));
    }

    fn step(&self, units: usize) {
        self.steps.fetch_add(units, Ordering::SeqCst);
        self.step_calls.fetch_add(1, Ordering::SeqCst);
    }

    fn end_task(&self) {
        self.ended.fetch_add(1, Ordering::SeqCst);
    }
}

pub fn services(registry: InspectorRegistry) -> AnalysisServices {
    AnalysisServices::new(
        Arc::new(Compilations::default()),
        Arc::new(ParserTable::new().with_parser(CS, TextParser::default())),
        Arc::new(registry),
    )
    .with_text_source(Arc::new(NameAsText))
}

pub fn wait_until<F: Fn() -> bool>(condition: F) {
    let deadline = Instant::now() + Duration::from_secs(10);
    while !condition() {
        assert!(Instant::now() < deadline, "condition not reached in time");
        std::thread::sleep(Duration::from_millis(1));
    }
}
