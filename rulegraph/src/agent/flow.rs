//! The value type flowing between workflow nodes.

use crate::error::AgentError;

use super::types::{Explanation, ExplanationFeedback, ExplanationRequest, UserInput};

/// Typed value carried along the workflow graph's edges.
///
/// Each node declares which variant it consumes via the accessors below; a
/// mismatch is a graph-wiring bug and fails the run.
#[derive(Debug, Clone)]
pub enum FlowValue {
    Input(UserInput),
    Text(String),
    Explanation(Explanation),
    Request(ExplanationRequest),
    Feedback(ExplanationFeedback),
}

impl FlowValue {
    pub fn into_input(self) -> Result<UserInput, AgentError> {
        match self {
            Self::Input(v) => Ok(v),
            other => Err(unexpected("UserInput", &other)),
        }
    }

    pub fn into_text(self) -> Result<String, AgentError> {
        match self {
            Self::Text(v) => Ok(v),
            other => Err(unexpected("Text", &other)),
        }
    }

    pub fn into_explanation(self) -> Result<Explanation, AgentError> {
        match self {
            Self::Explanation(v) => Ok(v),
            other => Err(unexpected("Explanation", &other)),
        }
    }

    pub fn into_request(self) -> Result<ExplanationRequest, AgentError> {
        match self {
            Self::Request(v) => Ok(v),
            other => Err(unexpected("ExplanationRequest", &other)),
        }
    }

    pub fn into_feedback(self) -> Result<ExplanationFeedback, AgentError> {
        match self {
            Self::Feedback(v) => Ok(v),
            other => Err(unexpected("ExplanationFeedback", &other)),
        }
    }

    /// True when carrying feedback with `is_accepted` set.
    pub fn is_accepted_feedback(&self) -> bool {
        matches!(self, Self::Feedback(f) if f.is_accepted)
    }

    /// True when carrying feedback with `is_accepted` unset.
    pub fn is_rejected_feedback(&self) -> bool {
        matches!(self, Self::Feedback(f) if !f.is_accepted)
    }
}

fn unexpected(expected: &str, got: &FlowValue) -> AgentError {
    let variant = match got {
        FlowValue::Input(_) => "Input",
        FlowValue::Text(_) => "Text",
        FlowValue::Explanation(_) => "Explanation",
        FlowValue::Request(_) => "Request",
        FlowValue::Feedback(_) => "Feedback",
    };
    AgentError::ExecutionFailed(format!(
        "node received unexpected value: expected {}, got {}",
        expected, variant
    ))
}
