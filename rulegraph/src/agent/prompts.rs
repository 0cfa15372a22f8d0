//! Prompt content for the diagnosis workflow.

use crate::tools::{TOOL_ASK_USER, TOOL_BUILD_RULE_LINK, TOOL_GET_WORKFLOW_RULES};

use super::types::{Explanation, ExplanationRequest};

/// System preamble installed at run start.
pub const SYSTEM_PROMPT: &str = "\
You are an assistant that helps users understand why a YouTrack automation rule \
produced the behavior they observed. You investigate the workflows and rules \
visible to the user's account, connect the observed behavior to specific rules, \
and explain your reasoning in plain language.";

/// Task for the clarification subgraph.
pub fn clarify_task(message: &str) -> String {
    format!(
        "The user reported the following behavior:\n\n{message}\n\n\
         Your task is to make sure the problem statement is complete before any \
         investigation starts. If anything essential is missing or ambiguous (which \
         project, which issue, what exactly happened and what was expected), ask the \
         user via the `{ask_user}` tool, one question at a time. When the statement \
         is complete, call `finish` with the list of problems describing what the \
         user wants explained. Do not investigate yet.",
        message = message,
        ask_user = TOOL_ASK_USER,
    )
}

/// Instruction block shared by both request variants.
fn suggest_instructions() -> String {
    format!(
        "Requirements:\n\
         - Explain which automation rule (or rules) caused the observed behavior and why.\n\
         - Base every claim on rule scripts you actually fetched; do not guess.\n\
         - Write each problem as a self-contained explanation the user can act on.\n\n\
         Tool usage:\n\
         - Call `{rules}` to fetch the workflows and rules before finishing.\n\
         - Ask the user via `{ask_user}` only when required information is missing.\n\n\
         Link building:\n\
         - Use `{link}` to build a link to each rule you reference, and include the \
         link in the problem description.",
        rules = TOOL_GET_WORKFLOW_RULES,
        ask_user = TOOL_ASK_USER,
        link = TOOL_BUILD_RULE_LINK,
    )
}

/// Renders the task prompt for one suggestion pass.
///
/// The two request variants get different bodies: a correction pass carries
/// the previous suggestion and the user's feedback in tagged blocks.
pub fn render_request(request: &ExplanationRequest) -> String {
    match request {
        ExplanationRequest::Initial { user_input } => format!(
            "Suggest an explanation for the user's problem.\n\n\
             The user's problem:\n{input}\n\n{instructions}\n\n\
             When done, call `finish` with the suggested explanation.",
            input = user_input.render(),
            instructions = suggest_instructions(),
        ),
        ExplanationRequest::Correction {
            user_input,
            user_feedback,
            prev_suggested_explanation,
        } => format!(
            "Your previous explanation was rejected by the user. Suggest a corrected one.\n\n\
             The user's problem:\n{input}\n\n{instructions}\n\n\
             <additional_instructions>\n\
             Address the user's feedback directly; do not repeat the rejected \
             explanation unchanged.\n\
             </additional_instructions>\n\n\
             <previously_suggested_explanation>\n{prev}\n</previously_suggested_explanation>\n\n\
             <user_feedback>\n{feedback}\n</user_feedback>\n\n\
             When done, call `finish` with the corrected explanation.",
            input = user_input.render(),
            instructions = suggest_instructions(),
            prev = prev_suggested_explanation.render(),
            feedback = user_feedback,
        ),
    }
}

/// Renders a suggestion for the human, with the accept-or-correct question.
pub fn render_suggestion(explanation: &Explanation) -> String {
    format!(
        "Suggested explanation:\n\n{}\n\n\
         Does this explain the behavior you observed? If not, tell me what is wrong \
         or missing.",
        explanation.render()
    )
}

/// Instruction for parsing the human's reaction to a suggestion.
pub fn feedback_instruction(reply: &str) -> String {
    format!(
        "The user replied to the suggested explanation with:\n\n{}\n\n\
         Decide whether they accepted the explanation.",
        reply
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::types::Problem;

    fn explanation(text: &str) -> Explanation {
        Explanation {
            problems: vec![Problem {
                description: text.into(),
            }],
        }
    }

    /// **Scenario**: the initial request renders the problem and the three
    /// instruction sections.
    #[test]
    fn initial_request_renders_instruction_sections() {
        let prompt = render_request(&ExplanationRequest::Initial {
            user_input: explanation("Issue X happened"),
        });
        assert!(prompt.contains("Issue X happened"));
        assert!(prompt.contains("Requirements:"));
        assert!(prompt.contains("Tool usage:"));
        assert!(prompt.contains("Link building:"));
        assert!(prompt.contains(TOOL_GET_WORKFLOW_RULES));
    }

    /// **Scenario**: the correction request carries the tagged feedback
    /// blocks with the previous suggestion and the user's words.
    #[test]
    fn correction_request_renders_tagged_blocks() {
        let prompt = render_request(&ExplanationRequest::Correction {
            user_input: explanation("Issue X happened"),
            user_feedback: "wrong rule, it was the scheduled one".into(),
            prev_suggested_explanation: explanation("Rule A did it"),
        });
        assert!(prompt.contains("<additional_instructions>"));
        assert!(prompt.contains("<previously_suggested_explanation>\n1. Rule A did it"));
        assert!(prompt.contains("<user_feedback>\nwrong rule, it was the scheduled one"));
    }

    /// **Scenario**: the clarify task names the ask_user tool and forbids
    /// investigation.
    #[test]
    fn clarify_task_names_ask_user_tool() {
        let task = clarify_task("Something reopened my issue");
        assert!(task.contains("Something reopened my issue"));
        assert!(task.contains(TOOL_ASK_USER));
    }
}
