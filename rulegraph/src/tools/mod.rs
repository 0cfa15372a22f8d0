//! Tool abstraction and dispatch.
//!
//! A [`Tool`] is a named, schema-described callable; tools are grouped into
//! named [`CapabilitySet`]s and merged into one [`ToolDispatch`] table per
//! run. Tool failures use [`ToolError`], which the tool loop converts into
//! error strings for the model instead of failing the run.

mod ask_user;
mod dispatch;
mod youtrack_tools;

pub use ask_user::{AskUserTool, TOOL_ASK_USER};
pub use dispatch::{CapabilitySet, ToolDispatch};
pub use youtrack_tools::{
    BuildRuleLinkTool, GetWorkflowRulesTool, TOOL_BUILD_RULE_LINK, TOOL_GET_WORKFLOW_RULES,
};

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// Tool specification shown to the LLM.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ToolSpec {
    /// Tool name, unique within a run.
    pub name: String,
    /// Human-readable description for the LLM.
    pub description: Option<String>,
    /// JSON Schema for the arguments.
    pub input_schema: Value,
}

/// Errors from invoking a tool.
///
/// **Interaction**: returned by [`Tool::call`] and [`ToolDispatch::call`];
/// the tool loop renders these as error strings delivered back to the model,
/// never as run failures.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("tool not found: {0}")]
    NotFound(String),
    #[error("invalid arguments: {0}")]
    InvalidInput(String),
    #[error("transport error: {0}")]
    Transport(String),
}

/// A named, schema-described callable exposed to the model.
///
/// Arguments arrive as a JSON object mapping argument names to values; the
/// result is a string appended to the conversation as a tool result.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Specification advertised to the LLM. `spec().name` is the dispatch key.
    fn spec(&self) -> ToolSpec;

    /// Invoke the tool with a JSON argument payload.
    async fn call(&self, arguments: Value) -> Result<String, ToolError>;
}
