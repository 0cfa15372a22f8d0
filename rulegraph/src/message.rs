//! Conversation message types.
//!
//! Message roles: System (preamble and summaries), User (human input, tool
//! results in `Tool {name} returned: ...` form), Assistant (model replies).
//! Held per run by [`crate::graph::RunContext`].

/// A single message in the conversation.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Message {
    /// System prompt or condensed history summary.
    System(String),
    /// User input or a tool result delivered back to the model.
    User(String),
    /// Model reply.
    Assistant(String),
}

impl Message {
    /// Creates a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self::System(content.into())
    }

    /// Creates a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::User(content.into())
    }

    /// Creates an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::Assistant(content.into())
    }

    /// Message text regardless of role.
    pub fn content(&self) -> &str {
        match self {
            Self::System(s) | Self::User(s) | Self::Assistant(s) => s,
        }
    }
}
