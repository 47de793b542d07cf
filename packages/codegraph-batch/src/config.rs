//! Runner configuration (YAML / env loading)

use crate::error::{BatchError, Result};
use crate::session::SessionOptions;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment variable overriding [`BatchConfig::worker_threads`]
pub const WORKERS_ENV: &str = "CODEGRAPH_BATCH_WORKERS";

const MAX_WORKERS: usize = 256;

/// Controller configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BatchConfig {
    /// Worker pool size (0=auto, 1..=256)
    pub worker_threads: usize,

    /// Worker threads are named `{prefix}-worker-{index}`
    pub thread_name_prefix: String,

    /// Buffered state changes per `watch_states()` receiver
    pub event_capacity: usize,

    /// Contain panics from host services and providers (default: true)
    pub isolate_provider_panics: bool,

    /// Task name passed to `begin_task`
    pub task_name: String,

    /// Flag forwarded to `UnitParser::parse`
    pub interactive_parse: bool,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            worker_threads: 0,
            thread_name_prefix: "codegraph-batch".to_string(),
            event_capacity: 16,
            isolate_provider_panics: true,
            task_name: "Analyzing workspace".to_string(),
            interactive_parse: true,
        }
    }
}

impl BatchConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.worker_threads > MAX_WORKERS {
            return Err(BatchError::config(format!(
                "worker_threads {} not in 0..={} (0 = all cores)",
                self.worker_threads, MAX_WORKERS
            )));
        }
        if self.event_capacity == 0 {
            return Err(BatchError::config("event_capacity must be at least 1"));
        }
        if self.thread_name_prefix.trim().is_empty() {
            return Err(BatchError::config("thread_name_prefix must not be empty"));
        }
        if self.task_name.trim().is_empty() {
            return Err(BatchError::config("task_name must not be empty"));
        }
        Ok(())
    }

    /// Apply `CODEGRAPH_BATCH_WORKERS` from the process environment
    pub fn with_env_overrides(self) -> Result<Self> {
        self.apply_env_overrides_from(|key| std::env::var(key).ok())
    }

    pub fn apply_env_overrides_from<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(WORKERS_ENV) {
            self.worker_threads = raw.trim().parse().map_err(|_| {
                BatchError::config(format!("{} must be a number, got '{}'", WORKERS_ENV, raw))
            })?;
        }
        self.validate()?;
        Ok(self)
    }

    /// Resolved pool size
    pub fn effective_workers(&self) -> usize {
        if self.worker_threads == 0 {
            num_cpus::get()
        } else {
            self.worker_threads
        }
    }

    pub fn with_worker_threads(mut self, workers: usize) -> Self {
        self.worker_threads = workers;
        self
    }

    pub fn with_thread_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.thread_name_prefix = prefix.into();
        self
    }

    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity;
        self
    }

    pub fn with_panic_isolation(mut self, isolate: bool) -> Self {
        self.isolate_provider_panics = isolate;
        self
    }

    pub fn with_task_name(mut self, name: impl Into<String>) -> Self {
        self.task_name = name.into();
        self
    }

    pub fn with_interactive_parse(mut self, interactive: bool) -> Self {
        self.interactive_parse = interactive;
        self
    }

    pub(crate) fn session_options(&self) -> SessionOptions {
        SessionOptions {
            interactive_parse: self.interactive_parse,
            isolate_provider_panics: self.isolate_provider_panics,
        }
    }
}
