//! LLM gateway abstraction.
//!
//! The tool loop, extractor, and compressor depend on a callable that takes
//! the conversation plus the tools offered for the turn and returns assistant
//! text and optional tool calls. Implementations: [`MockLlm`] (scripted, for
//! tests) and [`ChatOpenAI`] (real API).

mod mock;
mod openai;

pub use mock::{MockLlm, ScriptedReply};
pub use openai::ChatOpenAI;

use async_trait::async_trait;

use crate::error::AgentError;
use crate::message::Message;
use crate::tools::ToolSpec;

/// One tool invocation requested by the model.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCall {
    /// Tool name as offered in the request.
    pub name: String,
    /// Raw JSON arguments string from the model.
    pub arguments: String,
    /// Provider call id, when available.
    pub id: Option<String>,
}

/// Token usage for one LLM call, when the provider reports it.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct LlmUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Response from one LLM turn: assistant text and optional tool calls.
pub struct LlmResponse {
    /// Assistant message content (plain text, may be empty on tool turns).
    pub content: String,
    /// Tool calls from this turn; empty means the model answered in text.
    pub tool_calls: Vec<ToolCall>,
    /// Token usage for this call, when available.
    pub usage: Option<LlmUsage>,
}

/// LLM client: given messages and the tools offered for this turn, returns
/// assistant text and optional tool calls.
///
/// Every call site charges the run's [`crate::budget::IterationBudget`]
/// before invoking; the client itself is budget-unaware. Pass an empty
/// `tools` slice for plain-text turns (extraction, summarization).
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Invoke one turn.
    async fn invoke(
        &self,
        messages: &[Message],
        tools: &[ToolSpec],
    ) -> Result<LlmResponse, AgentError>;
}
