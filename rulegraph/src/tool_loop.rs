//! Bounded tool loop: a sub-conversation where the model calls tools until
//! it produces a typed result via the implicit `finish` tool.
//!
//! Each turn sends the run history plus the capability set (with `finish`
//! appended) to the LLM; requested tools are dispatched and their textual
//! results (or error strings, never raised) are appended to history. The
//! loop ends when the model calls `finish` with arguments parsing to the
//! declared result type, or when the run's global iteration budget is
//! exhausted. The budget is shared across the whole run, not per-subgraph.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::AgentError;
use crate::events::RunEvent;
use crate::graph::RunContext;
use crate::llm::LlmClient;
use crate::message::Message;
use crate::tools::{ToolDispatch, ToolSpec};

/// Name of the implicit result tool appended to every capability set.
pub const FINISH_TOOL_NAME: &str = "finish";

/// Template for tool failures delivered back to the model as results.
const TOOL_ERROR_TEMPLATE: &str = "There was an error calling the tool:\n";

/// Nudge appended when the model answers in text instead of calling a tool.
const NO_TOOL_CALL_NUDGE: &str =
    "Please call one of the available tools, or call `finish` with the final result.";

/// Bounded tool-calling subgraph over one dispatch table.
///
/// **Interaction**: embedded in workflow nodes (`clarify`, `suggest`);
/// charges [`crate::budget::IterationBudget`] once per LLM turn.
pub struct ToolLoop {
    llm: Arc<dyn LlmClient>,
    dispatch: Arc<ToolDispatch>,
}

impl ToolLoop {
    pub fn new(llm: Arc<dyn LlmClient>, dispatch: Arc<ToolDispatch>) -> Self {
        Self { llm, dispatch }
    }

    /// Runs the loop for `task`, returning the parsed `finish` arguments.
    ///
    /// `result_schema` is advertised as the `finish` tool's argument schema;
    /// `T` must deserialize from exactly that shape. A `finish` call whose
    /// arguments fail to parse is reported back to the model as a tool
    /// error and the loop continues.
    pub async fn run<T>(
        &self,
        task: &str,
        result_schema: Value,
        ctx: &RunContext,
    ) -> Result<T, AgentError>
    where
        T: DeserializeOwned,
    {
        ctx.push_message(Message::user(task))?;

        let mut specs: Vec<ToolSpec> = self.dispatch.specs();
        specs.push(finish_spec(result_schema));

        loop {
            ctx.budget().try_charge()?;
            let history = ctx.history()?;
            let response = self.llm.invoke(&history, &specs).await?;

            if !response.content.is_empty() {
                ctx.push_message(Message::assistant(response.content.clone()))?;
            }
            if let Some(usage) = &response.usage {
                debug!(total_tokens = usage.total_tokens, "llm usage");
            }

            if response.tool_calls.is_empty() {
                debug!("model answered in text; nudging toward tool use");
                ctx.push_message(Message::user(NO_TOOL_CALL_NUDGE))?;
                continue;
            }

            for call in response.tool_calls {
                if call.name == FINISH_TOOL_NAME {
                    match serde_json::from_str::<T>(&call.arguments) {
                        Ok(result) => {
                            debug!("finish tool accepted");
                            return Ok(result);
                        }
                        Err(e) => {
                            warn!(error = %e, "finish arguments failed to parse");
                            ctx.push_message(tool_result_message(
                                FINISH_TOOL_NAME,
                                &format!("{}{}", TOOL_ERROR_TEMPLATE, e),
                            ))?;
                            continue;
                        }
                    }
                }

                let arguments = parse_tool_arguments(&call.arguments);
                ctx.emit(RunEvent::ToolCalled {
                    tool: call.name.clone(),
                });
                match self.dispatch.call(&call.name, arguments).await {
                    Ok(text) => {
                        debug!(tool = %call.name, "tool call succeeded");
                        ctx.push_message(tool_result_message(&call.name, &text))?;
                    }
                    Err(e) => {
                        // Absorbed into the conversation so the model can adapt.
                        warn!(tool = %call.name, error = %e, "tool call failed");
                        ctx.push_message(tool_result_message(
                            &call.name,
                            &format!("{}{}", TOOL_ERROR_TEMPLATE, e),
                        ))?;
                    }
                }
            }
        }
    }
}

/// Renders a tool result as a user message in `Tool {name} returned: ...` form.
fn tool_result_message(name: &str, text: &str) -> Message {
    Message::user(format!("Tool {} returned: {}", name, text))
}

/// Builds the implicit `finish` tool spec from the declared result schema.
fn finish_spec(result_schema: Value) -> ToolSpec {
    ToolSpec {
        name: FINISH_TOOL_NAME.to_string(),
        description: Some(
            "Finishes the task. Call this exactly once, with the final result matching the \
             declared schema."
                .to_string(),
        ),
        input_schema: result_schema,
    }
}

/// Parses a ToolCall arguments string to JSON, logging on failure.
fn parse_tool_arguments(arguments: &str) -> Value {
    if arguments.trim().is_empty() {
        return serde_json::json!({});
    }
    match serde_json::from_str(arguments) {
        Ok(v) => v,
        Err(e) => {
            warn!(error = %e, arguments = %arguments, "tool arguments JSON parse failed, using empty object");
            serde_json::json!({})
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    use crate::budget::IterationBudget;
    use crate::llm::{MockLlm, ScriptedReply};
    use crate::tools::{CapabilitySet, Tool, ToolError};

    #[derive(Debug, Clone, PartialEq, serde::Deserialize)]
    struct Answer {
        text: String,
    }

    struct FixedTool {
        name: &'static str,
        result: Result<&'static str, &'static str>,
    }

    #[async_trait]
    impl Tool for FixedTool {
        fn spec(&self) -> ToolSpec {
            ToolSpec {
                name: self.name.to_string(),
                description: None,
                input_schema: serde_json::json!({"type": "object"}),
            }
        }
        async fn call(&self, _arguments: Value) -> Result<String, ToolError> {
            match self.result {
                Ok(s) => Ok(s.to_string()),
                Err(e) => Err(ToolError::Transport(e.to_string())),
            }
        }
    }

    fn loop_with(
        llm: Arc<MockLlm>,
        tools: Vec<Arc<dyn Tool>>,
    ) -> (ToolLoop, RunContext) {
        let mut set = CapabilitySet::new("test");
        for t in tools {
            set = set.with_tool(t);
        }
        let dispatch = Arc::new(ToolDispatch::merge(vec![set]).unwrap());
        let ctx = RunContext::new(IterationBudget::new(10));
        (ToolLoop::new(llm, dispatch), ctx)
    }

    /// **Scenario**: the model calls a tool, sees its result in history, then
    /// calls finish; the loop returns the parsed result.
    #[tokio::test]
    async fn tool_then_finish_returns_parsed_result() {
        let llm = Arc::new(MockLlm::with_script(vec![
            ScriptedReply::tool_call("lookup", "{}"),
            ScriptedReply::tool_call(FINISH_TOOL_NAME, r#"{"text":"done"}"#),
        ]));
        let (tool_loop, ctx) = loop_with(
            llm.clone(),
            vec![Arc::new(FixedTool {
                name: "lookup",
                result: Ok("found it"),
            })],
        );

        let answer: Answer = tool_loop
            .run("task", serde_json::json!({"type": "object"}), &ctx)
            .await
            .unwrap();
        assert_eq!(answer.text, "done");

        let history = ctx.history().unwrap();
        assert!(history
            .iter()
            .any(|m| m.content() == "Tool lookup returned: found it"));
        // Second request must include the tool result from the first turn.
        assert!(llm
            .request_messages(1)
            .iter()
            .any(|m| m.content().contains("found it")));
    }

    /// **Scenario**: a tool failure appears in history as an error string
    /// and the run continues to the next model turn rather than aborting.
    #[tokio::test]
    async fn tool_error_becomes_error_string_and_loop_continues() {
        let llm = Arc::new(MockLlm::with_script(vec![
            ScriptedReply::tool_call("broken", "{}"),
            ScriptedReply::tool_call(FINISH_TOOL_NAME, r#"{"text":"recovered"}"#),
        ]));
        let (tool_loop, ctx) = loop_with(
            llm,
            vec![Arc::new(FixedTool {
                name: "broken",
                result: Err("connection refused"),
            })],
        );

        let answer: Answer = tool_loop
            .run("task", serde_json::json!({"type": "object"}), &ctx)
            .await
            .unwrap();
        assert_eq!(answer.text, "recovered");

        let history = ctx.history().unwrap();
        let error_msg = history
            .iter()
            .find(|m| m.content().starts_with("Tool broken returned:"))
            .expect("error string in history");
        assert!(error_msg
            .content()
            .contains("There was an error calling the tool:"));
        assert!(error_msg.content().contains("connection refused"));
    }

    /// **Scenario**: an unknown tool name is absorbed as an error string,
    /// never a run failure.
    #[tokio::test]
    async fn unknown_tool_name_is_absorbed() {
        let llm = Arc::new(MockLlm::with_script(vec![
            ScriptedReply::tool_call("no_such_tool", "{}"),
            ScriptedReply::tool_call(FINISH_TOOL_NAME, r#"{"text":"ok"}"#),
        ]));
        let (tool_loop, ctx) = loop_with(llm, vec![]);

        let answer: Answer = tool_loop
            .run("task", serde_json::json!({"type": "object"}), &ctx)
            .await
            .unwrap();
        assert_eq!(answer.text, "ok");
        assert!(ctx
            .history()
            .unwrap()
            .iter()
            .any(|m| m.content().contains("tool not found: no_such_tool")));
    }

    /// **Scenario**: finish arguments that do not match the result type are
    /// reported back and the loop retries under the budget.
    #[tokio::test]
    async fn malformed_finish_arguments_retry() {
        let llm = Arc::new(MockLlm::with_script(vec![
            ScriptedReply::tool_call(FINISH_TOOL_NAME, r#"{"wrong":"shape"}"#),
            ScriptedReply::tool_call(FINISH_TOOL_NAME, r#"{"text":"fixed"}"#),
        ]));
        let (tool_loop, ctx) = loop_with(llm, vec![]);

        let answer: Answer = tool_loop
            .run("task", serde_json::json!({"type": "object"}), &ctx)
            .await
            .unwrap();
        assert_eq!(answer.text, "fixed");
    }

    /// **Scenario**: a text-only reply draws a nudge message and another turn.
    #[tokio::test]
    async fn text_reply_draws_nudge() {
        let llm = Arc::new(MockLlm::with_script(vec![
            ScriptedReply::text("thinking out loud"),
            ScriptedReply::tool_call(FINISH_TOOL_NAME, r#"{"text":"ok"}"#),
        ]));
        let (tool_loop, ctx) = loop_with(llm, vec![]);

        let _: Answer = tool_loop
            .run("task", serde_json::json!({"type": "object"}), &ctx)
            .await
            .unwrap();
        assert!(ctx
            .history()
            .unwrap()
            .iter()
            .any(|m| m.content() == NO_TOOL_CALL_NUDGE));
    }

    /// **Scenario**: a model that never finishes exhausts the shared budget
    /// and the loop fails with BudgetExceeded, never silent truncation.
    #[tokio::test]
    async fn endless_loop_exhausts_budget() {
        let llm = Arc::new(MockLlm::with_script(vec![ScriptedReply::tool_call(
            "lookup", "{}",
        )]));
        let (tool_loop, ctx) = loop_with(
            llm,
            vec![Arc::new(FixedTool {
                name: "lookup",
                result: Ok("again"),
            })],
        );

        let result: Result<Answer, _> = tool_loop
            .run("task", serde_json::json!({"type": "object"}), &ctx)
            .await;
        match result {
            Err(AgentError::BudgetExceeded { limit }) => assert_eq!(limit, 10),
            other => panic!("expected BudgetExceeded, got {:?}", other.err()),
        }
    }
}
