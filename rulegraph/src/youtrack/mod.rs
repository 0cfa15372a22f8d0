//! YouTrack collaborators: REST types, markdown rendering, link building.
//!
//! Simple, single-purpose I/O wrappers with no control-flow logic; the graph
//! engine only sees them through the tool layer.

mod client;

pub use client::YoutrackClient;

use serde::{Deserialize, Serialize};

/// One automation rule attached to a workflow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rule {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub script: Option<String>,
    /// YouTrack discriminator (e.g. `OnChangeRule`, `OnScheduleRule`).
    #[serde(rename = "$type", default)]
    pub rule_type: Option<String>,
}

/// One workflow with the rules visible to the requesting account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workflow {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub rules: Vec<Rule>,
}

/// Shown when the account can see no workflows at all.
pub const NO_WORKFLOWS_MESSAGE: &str = "There were no YouTrack workflows available";

/// Renders fetched workflows as markdown for the model.
pub fn render_workflows(workflows: &[Workflow]) -> String {
    if workflows.is_empty() {
        return NO_WORKFLOWS_MESSAGE.to_string();
    }

    let mut out = String::from("Workflows and rules visible to the user's account:\n");
    for workflow in workflows {
        out.push_str(&format!("\n## ID: {}\n", workflow.id));
        out.push_str(&format!(
            "## NAME: {}\n",
            workflow.name.as_deref().unwrap_or("-")
        ));
        for rule in &workflow.rules {
            out.push_str(&format!(
                "\n### TITLE: {}\n",
                rule.title.as_deref().unwrap_or("-")
            ));
            out.push_str(&format!("### ID: {}\n", rule.id));
            out.push_str(&format!(
                "### Type: {}\n",
                rule.rule_type.as_deref().unwrap_or("-")
            ));
            if let Some(script) = rule.script.as_deref() {
                out.push_str(&format!("### Script:\n```\n{}\n```\n", script));
            }
        }
    }
    out
}

/// Builds a deep link to a workflow's rules in the project settings.
///
/// Deterministic and idempotent: surrounding whitespace is trimmed from both
/// inputs and a trailing slash is stripped from the base URL. No network
/// access.
pub fn build_rule_link(base_url: &str, project: &str, workflow_id: &str) -> String {
    let base = base_url.trim().trim_end_matches('/');
    format!(
        "{}/projects/{}?tab=workflow&selected={}",
        base,
        project.trim(),
        workflow_id.trim()
    )
}
