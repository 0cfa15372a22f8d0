//! Run-level error types.
//!
//! Tool invocation failures have their own type ([`crate::tools::ToolError`])
//! because the tool loop absorbs them into the conversation instead of
//! failing the run; everything here terminates the run.

use thiserror::Error;

use crate::graph::CompilationError;

/// Error terminating a workflow run.
///
/// `ExecutionFailed` covers node/LLM failures and graph contract violations
/// at runtime (e.g. no edge matched). `Configuration` covers construction
/// mistakes that must fail fast: duplicate tool names, reads of unset storage
/// keys, invalid graphs. `BudgetExceeded` is reported distinctly so callers
/// never confuse it with a model refusal.
#[derive(Debug, Error)]
pub enum AgentError {
    /// Execution failed with a message (e.g. LLM call failed, no edge matched).
    #[error("execution failed: {0}")]
    ExecutionFailed(String),

    /// Construction-time contract violation (duplicate tool name, missing
    /// storage key, invalid graph). Never retried.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The run issued more LLM requests than the configured ceiling allows.
    #[error("iteration budget exceeded: limit {limit}")]
    BudgetExceeded { limit: u32 },
}

impl From<CompilationError> for AgentError {
    fn from(err: CompilationError) -> Self {
        AgentError::Configuration(err.to_string())
    }
}
