use crate::run_state::RunState;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, BatchError>;

/// Errors surfaced synchronously by the run controller and configuration layer.
///
/// Everything that happens inside a sweep (provider failures, unreadable files,
/// parse errors) is absorbed and reported through the logger instead.
#[derive(Error, Debug)]
pub enum BatchError {
    #[error("Cannot {operation} while the runner is {state}")]
    InvalidState {
        operation: &'static str,
        state: RunState,
    },

    #[error("No destination sink configured")]
    NoDestination,

    #[error("Worker pool error: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Run {0} panicked before reaching a terminal state")]
    RunPanicked(uuid::Uuid),
}

impl BatchError {
    pub fn config<E: std::fmt::Display>(e: E) -> Self {
        Self::Config(e.to_string())
    }

    pub fn invalid_state(operation: &'static str, state: RunState) -> Self {
        Self::InvalidState { operation, state }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            BatchError::InvalidState { .. } | BatchError::NoDestination => ErrorCategory::Usage,
            BatchError::Config(_) | BatchError::Yaml(_) => ErrorCategory::Usage,
            BatchError::WorkerPool(_) | BatchError::Io(_) | BatchError::RunPanicked(_) => {
                ErrorCategory::Infrastructure
            }
        }
    }
}

/// Failure of a single file or provider inside a sweep.
#[derive(Error, Debug, Clone)]
pub enum AnalysisError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Compilation unavailable: {0}")]
    Compilation(String),

    #[error("Failed to build resolution context: {0}")]
    Context(String),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Panicked: {0}")]
    Panicked(String),

    #[error("Operation cancelled")]
    Cancelled,
}

impl AnalysisError {
    pub fn io<E: std::fmt::Display>(e: E) -> Self {
        Self::Io(e.to_string())
    }

    pub fn parse<E: std::fmt::Display>(e: E) -> Self {
        Self::Parse(e.to_string())
    }

    pub fn compilation<E: std::fmt::Display>(e: E) -> Self {
        Self::Compilation(e.to_string())
    }

    pub fn context<E: std::fmt::Display>(e: E) -> Self {
        Self::Context(e.to_string())
    }

    pub fn provider<E: std::fmt::Display>(e: E) -> Self {
        Self::Provider(e.to_string())
    }

    /// Build from a caught panic payload.
    pub fn from_panic(payload: Box<dyn std::any::Any + Send>) -> Self {
        let msg = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_string()
        };
        Self::Panicked(msg)
    }

    pub fn is_cancellation(&self) -> bool {
        matches!(self, AnalysisError::Cancelled)
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            AnalysisError::Cancelled => ErrorCategory::Cancellation,
            AnalysisError::Provider(_) | AnalysisError::Panicked(_) => ErrorCategory::Provider,
            AnalysisError::Io(_)
            | AnalysisError::Parse(_)
            | AnalysisError::Compilation(_)
            | AnalysisError::Context(_) => ErrorCategory::File,
        }
    }
}

impl From<std::io::Error> for AnalysisError {
    fn from(e: std::io::Error) -> Self {
        Self::io(e)
    }
}

/// Error category used in structured log fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Precondition violated by the caller
    Usage,
    /// A file could not be read, parsed or resolved
    File,
    /// A provider failed while enumerating issues
    Provider,
    /// Cooperative early exit, never a failure
    Cancellation,
    /// Thread pool / OS level failure
    Infrastructure,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Usage => "usage",
            ErrorCategory::File => "file",
            ErrorCategory::Provider => "provider",
            ErrorCategory::Cancellation => "cancellation",
            ErrorCategory::Infrastructure => "infrastructure",
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
