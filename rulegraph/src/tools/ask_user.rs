//! Tool that relays a question from the model to the human.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::interact::UserInteraction;

use super::{Tool, ToolError, ToolSpec};

/// Name of the human-prompt tool.
pub const TOOL_ASK_USER: &str = "ask_user";

/// Shows the model's question to the human and returns their reply.
pub struct AskUserTool {
    interaction: Arc<dyn UserInteraction>,
}

impl AskUserTool {
    pub fn new(interaction: Arc<dyn UserInteraction>) -> Self {
        Self { interaction }
    }
}

#[async_trait]
impl Tool for AskUserTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: TOOL_ASK_USER.to_string(),
            description: Some(
                "Asks the user a question and returns their answer. Use it when information \
                 needed to proceed is missing from the conversation."
                    .to_string(),
            ),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "message": {
                        "type": "string",
                        "description": "The question to show the user"
                    }
                },
                "required": ["message"]
            }),
        }
    }

    async fn call(&self, arguments: Value) -> Result<String, ToolError> {
        let message = arguments
            .get("message")
            .and_then(Value::as_str)
            .ok_or_else(|| ToolError::InvalidInput("missing string argument 'message'".into()))?;
        self.interaction
            .show_message(message)
            .await
            .map_err(|e| ToolError::Transport(format!("user interaction failed: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interact::ScriptedInteraction;

    /// **Scenario**: the tool shows the question and returns the reply.
    #[tokio::test]
    async fn ask_user_relays_question_and_reply() {
        let interaction = Arc::new(ScriptedInteraction::with_replies(vec!["project DEMO"]));
        let tool = AskUserTool::new(interaction.clone());
        let reply = tool
            .call(serde_json::json!({"message": "Which project?"}))
            .await
            .unwrap();
        assert_eq!(reply, "project DEMO");
        assert_eq!(interaction.shown(), vec!["Which project?"]);
    }

    /// **Scenario**: a missing message argument is InvalidInput.
    #[tokio::test]
    async fn ask_user_rejects_missing_message() {
        let interaction = Arc::new(ScriptedInteraction::with_replies(vec![]));
        let tool = AskUserTool::new(interaction);
        assert!(matches!(
            tool.call(serde_json::json!({})).await,
            Err(ToolError::InvalidInput(_))
        ));
    }
}
