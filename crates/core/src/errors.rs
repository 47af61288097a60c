use thiserror::Error;

use crate::task::TaskType;
use crate::validate::ValidationError;

/// Upstream context lookup failure. Never retried; propagated unmodified.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum AccessorError {
    #[error("unknown identifier: {0}")]
    UnknownId(String),
    #[error("context source failure: {0}")]
    Source(String),
}

/// Model invocation failure at the transport/backend level. Distinct from
/// validation failures: the retry controller never spends budget on these.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("model backend failure: {0}")]
    Backend(String),
    #[error("model invocation timed out after {elapsed_secs}s")]
    Timeout { elapsed_secs: u64 },
}

/// The full error taxonomy surfaced to callers of the pipeline. Callers must
/// treat any of these as "no usable result produced".
#[derive(Clone, Debug, Error, PartialEq)]
pub enum PipelineError {
    #[error("context lookup failed: {0}")]
    Accessor(#[from] AccessorError),
    #[error("output validation failed: {0}")]
    Validation(#[from] ValidationError),
    #[error("model invocation failed: {0}")]
    Transport(#[from] TransportError),
    #[error("no template or schema registered for task type `{0}`")]
    Configuration(TaskType),
    #[error("retry budget exhausted for {task_type} after {attempts} attempts: {last}")]
    RetryExhausted { task_type: TaskType, attempts: u32, last: ValidationError },
}

impl PipelineError {
    /// Whether the retry controller may recover from this failure locally.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}
