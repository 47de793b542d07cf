//! Execution tiers of a sweep.
//!
//! ```text
//! sweep_workspace ─(sequential)─> sweep_project ─(par_iter)─> FileAnalyzer
//!                                                      └─(par_iter)─> ProviderAdapter
//! ```

pub mod file_stage;
pub mod project_sweep;
pub mod provider_stage;

pub use file_stage::{ContentTypeCache, FileAnalyzer, FileOutcome, SkipReason};
pub use project_sweep::{sweep_project, sweep_workspace, ProjectOutcome};
pub use provider_stage::{ProviderAdapter, ProviderOutcome};
