//! YouTrack-backed tools: rule lookup and link building.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::youtrack::{build_rule_link, render_workflows, YoutrackClient};

use super::{Tool, ToolError, ToolSpec};

/// Name of the rule-lookup tool.
pub const TOOL_GET_WORKFLOW_RULES: &str = "get_workflow_rules";

/// Name of the link-building tool.
pub const TOOL_BUILD_RULE_LINK: &str = "build_workflow_rule_link";

/// Fetches all workflows and their rules, rendered as markdown.
pub struct GetWorkflowRulesTool {
    client: Arc<YoutrackClient>,
}

impl GetWorkflowRulesTool {
    pub fn new(client: Arc<YoutrackClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for GetWorkflowRulesTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: TOOL_GET_WORKFLOW_RULES.to_string(),
            description: Some(
                "Fetches all YouTrack workflows and their automation rules (including rule \
                 scripts) visible to the current account."
                    .to_string(),
            ),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {},
                "required": []
            }),
        }
    }

    async fn call(&self, _arguments: Value) -> Result<String, ToolError> {
        let workflows = self.client.get_workflow_rules().await?;
        Ok(render_workflows(&workflows))
    }
}

/// Builds a deep link to a workflow's rules in a project's settings.
pub struct BuildRuleLinkTool {
    base_url: String,
}

impl BuildRuleLinkTool {
    /// `base_url` is the YouTrack instance URL the links should point at.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl Tool for BuildRuleLinkTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: TOOL_BUILD_RULE_LINK.to_string(),
            description: Some(
                "Builds a link to a workflow's rules on a project's workflow settings tab. \
                 Use it to point the user at the rule you are explaining."
                    .to_string(),
            ),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "project": {
                        "type": "string",
                        "description": "Project key or name"
                    },
                    "workflow_id": {
                        "type": "string",
                        "description": "Workflow id the rule belongs to"
                    }
                },
                "required": ["project", "workflow_id"]
            }),
        }
    }

    async fn call(&self, arguments: Value) -> Result<String, ToolError> {
        let project = required_str(&arguments, "project")?;
        let workflow_id = required_str(&arguments, "workflow_id")?;
        Ok(build_rule_link(&self.base_url, project, workflow_id))
    }
}

fn required_str<'a>(arguments: &'a Value, key: &str) -> Result<&'a str, ToolError> {
    arguments
        .get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| ToolError::InvalidInput(format!("missing string argument '{}'", key)))
}
