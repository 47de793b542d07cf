/*
 * Domain Layer - Workspace input, issue records, collaborator ports
 *
 * HEXAGONAL ARCHITECTURE:
 * - models: plain data flowing through a sweep
 * - ports: interfaces the host implements (parsing, compilation, providers)
 */

pub mod models;
pub mod ports;

pub use models::{
    AnalyzableUnit, BuildAction, CompiledContext, IssueRecord, MarkerKind, Project, ProjectFile,
    RawIssue, Region, Severity, Workspace,
};
pub use ports::{
    AnalysisLogger, CompilationProvider, ContextBuilder, DefaultContextBuilder,
    FileSystemTextSource, IssueProvider, IssueStream, ParserService, ProviderRegistry,
    ResolutionContext, TextDocument, TextSource, TracingLogger, UnitParser,
};
