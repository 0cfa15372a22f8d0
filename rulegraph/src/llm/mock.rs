//! Scripted mock LLM for tests.
//!
//! Returns prepared responses in order; when the script runs out, the last
//! response repeats. Records every request's message snapshot and offered
//! tool names so tests can assert on what the model was shown.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::AgentError;
use crate::llm::{LlmClient, LlmResponse, ToolCall};
use crate::message::Message;
use crate::tools::ToolSpec;

/// One scripted reply.
#[derive(Debug, Clone, Default)]
pub struct ScriptedReply {
    pub content: String,
    pub tool_calls: Vec<ToolCall>,
}

impl ScriptedReply {
    /// Plain-text reply with no tool calls.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            tool_calls: vec![],
        }
    }

    /// Reply calling one tool with the given JSON arguments string.
    pub fn tool_call(name: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self {
            content: String::new(),
            tool_calls: vec![ToolCall {
                name: name.into(),
                arguments: arguments.into(),
                id: Some("call-1".to_string()),
            }],
        }
    }
}

/// Mock LLM driven by a fixed script of replies.
///
/// **Interaction**: implements [`LlmClient`]; used by unit and integration
/// tests in place of [`super::ChatOpenAI`].
pub struct MockLlm {
    script: Mutex<Vec<ScriptedReply>>,
    cursor: Mutex<usize>,
    requests: Mutex<Vec<(Vec<Message>, Vec<String>)>>,
}

impl MockLlm {
    /// Creates a mock that plays `script` in order, repeating the last entry.
    pub fn with_script(script: Vec<ScriptedReply>) -> Self {
        Self {
            script: Mutex::new(script),
            cursor: Mutex::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Creates a mock that always answers with the same text.
    pub fn always(content: impl Into<String>) -> Self {
        Self::with_script(vec![ScriptedReply::text(content)])
    }

    /// Number of invocations so far.
    pub fn calls(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or(0)
    }

    /// Tool names offered on the `n`-th invocation.
    pub fn offered_tools(&self, n: usize) -> Vec<String> {
        self.requests
            .lock()
            .ok()
            .and_then(|r| r.get(n).map(|(_, tools)| tools.clone()))
            .unwrap_or_default()
    }

    /// Message snapshot sent on the `n`-th invocation.
    pub fn request_messages(&self, n: usize) -> Vec<Message> {
        self.requests
            .lock()
            .ok()
            .and_then(|r| r.get(n).map(|(msgs, _)| msgs.clone()))
            .unwrap_or_default()
    }
}

#[async_trait]
impl LlmClient for MockLlm {
    async fn invoke(
        &self,
        messages: &[Message],
        tools: &[ToolSpec],
    ) -> Result<LlmResponse, AgentError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push((
                messages.to_vec(),
                tools.iter().map(|t| t.name.clone()).collect(),
            ));
        }

        let script = self
            .script
            .lock()
            .map_err(|_| AgentError::ExecutionFailed("mock script lock poisoned".into()))?;
        let mut cursor = self
            .cursor
            .lock()
            .map_err(|_| AgentError::ExecutionFailed("mock cursor lock poisoned".into()))?;
        let reply = if script.is_empty() {
            ScriptedReply::default()
        } else {
            let idx = (*cursor).min(script.len() - 1);
            *cursor += 1;
            script[idx].clone()
        };

        Ok(LlmResponse {
            content: reply.content,
            tool_calls: reply.tool_calls,
            usage: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// **Scenario**: the script plays in order and the last reply repeats.
    #[tokio::test]
    async fn script_plays_in_order_then_repeats_last() {
        let llm = MockLlm::with_script(vec![
            ScriptedReply::text("first"),
            ScriptedReply::text("second"),
        ]);
        assert_eq!(llm.invoke(&[], &[]).await.unwrap().content, "first");
        assert_eq!(llm.invoke(&[], &[]).await.unwrap().content, "second");
        assert_eq!(llm.invoke(&[], &[]).await.unwrap().content, "second");
    }

    /// **Scenario**: requests record offered tool names for later assertions.
    #[tokio::test]
    async fn records_offered_tool_names() {
        let llm = MockLlm::always("ok");
        let tools = vec![ToolSpec {
            name: "get_workflow_rules".into(),
            description: None,
            input_schema: serde_json::json!({}),
        }];
        llm.invoke(&[Message::user("hi")], &tools).await.unwrap();
        assert_eq!(llm.calls(), 1);
        assert_eq!(llm.offered_tools(0), vec!["get_workflow_rules".to_string()]);
        assert_eq!(llm.request_messages(0).len(), 1);
    }
}
