//! Workflow data model.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Raw text from the human; created once at run start, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserInput {
    pub message: String,
}

impl UserInput {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// One diagnosed issue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Problem {
    pub description: String,
}

/// The agent's current best answer: an ordered list of problems.
///
/// Deliberately shared shape: the clarified problem statement and the
/// suggested explanation both use it, so the clarify subgraph's output can
/// feed the suggestion request directly. Mutated only by replacement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Explanation {
    pub problems: Vec<Problem>,
}

impl Explanation {
    /// Renders the problems as a numbered list.
    pub fn render(&self) -> String {
        self.problems
            .iter()
            .enumerate()
            .map(|(i, p)| format!("{}. {}", i + 1, p.description))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// JSON Schema for the explanation shape, advertised as the `finish`
    /// tool's argument schema.
    pub fn schema() -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "problems": {
                    "type": "array",
                    "description": "Ordered list of diagnosed problems",
                    "items": {
                        "type": "object",
                        "properties": {
                            "description": {
                                "type": "string",
                                "description": "One diagnosed issue, in full sentences"
                            }
                        },
                        "required": ["description"]
                    }
                }
            },
            "required": ["problems"]
        })
    }
}

/// Request driving one suggestion pass.
///
/// `Correction` is only built by the rejection back-edge, after at least one
/// explanation has been stored; its constructor path reads that stored
/// explanation, so the variant cannot exist without one.
#[derive(Debug, Clone, PartialEq)]
pub enum ExplanationRequest {
    /// First pass: the clarified input, coerced into the explanation shape.
    Initial { user_input: Explanation },
    /// Retry after rejection, carrying the human's feedback text.
    Correction {
        user_input: Explanation,
        user_feedback: String,
        prev_suggested_explanation: Explanation,
    },
}

/// Structured parse of the human's reaction to a suggestion.
///
/// `message` is reused as feedback text only when `is_accepted` is false.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ExplanationFeedback {
    pub is_accepted: bool,
    pub message: String,
}

impl ExplanationFeedback {
    /// JSON Schema for the feedback shape, used by the extractor.
    pub fn schema() -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "isAccepted": {
                    "type": "boolean",
                    "description": "True when the user accepted the suggested explanation"
                },
                "message": {
                    "type": "string",
                    "description": "The user's words; used as correction feedback when not accepted"
                }
            },
            "required": ["isAccepted", "message"]
        })
    }
}
