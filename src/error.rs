//! Domain failures that callers need to tell apart from plain I/O or parse errors.
//!
//! These travel inside `anyhow::Error`; use `err.downcast_ref::<ToolError>()` to
//! recover them.

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ToolError {
    #[error("{script}: {cpus_per_node} cpus per node exceeds the limit of {limit}")]
    CpusPerNode {
        script: String,
        cpus_per_node: f64,
        limit: u32,
    },

    #[error(
        "{script}: {cpus_per_node} cpus per node exceeds the unwrap limit of {limit} (unwrapping is memory bound)"
    )]
    UnwrapCpusPerNode {
        script: String,
        cpus_per_node: f64,
        limit: f64,
    },

    #[error("step '{step}' {reason}: restarted processing runs are not supported")]
    RestartedRun { step: String, reason: String },

    #[error("step '{step}' has no matching row in the resource config")]
    MissingStageConfig { step: String },

    #[error("timing log {path} contains no timing records")]
    EmptyTimingLog { path: String },
}
