//! Human-interaction boundary.
//!
//! The only synchronous human-in-the-loop point: show a message, block until
//! the human replies. The CLI provides a console implementation; tests use
//! [`ScriptedInteraction`].

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::AgentError;

/// Blocking prompt/response collaborator.
///
/// **Interaction**: invoked by the `show_suggestion` node and by the
/// `ask_user` tool.
#[async_trait]
pub trait UserInteraction: Send + Sync {
    /// Delivers `text` to the human and waits for their reply.
    async fn show_message(&self, text: &str) -> Result<String, AgentError>;
}

/// Scripted interaction for tests: records shown messages, replays replies.
#[derive(Default)]
pub struct ScriptedInteraction {
    replies: Mutex<VecDeque<String>>,
    shown: Mutex<Vec<String>>,
}

impl ScriptedInteraction {
    /// Creates an interaction that replies with `replies` in order.
    pub fn with_replies(replies: Vec<&str>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().map(String::from).collect()),
            shown: Mutex::new(Vec::new()),
        }
    }

    /// Messages shown so far.
    pub fn shown(&self) -> Vec<String> {
        self.shown.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl UserInteraction for ScriptedInteraction {
    async fn show_message(&self, text: &str) -> Result<String, AgentError> {
        if let Ok(mut shown) = self.shown.lock() {
            shown.push(text.to_string());
        }
        let mut replies = self
            .replies
            .lock()
            .map_err(|_| AgentError::ExecutionFailed("scripted replies lock poisoned".into()))?;
        replies.pop_front().ok_or_else(|| {
            AgentError::ExecutionFailed("scripted interaction ran out of replies".into())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// **Scenario**: replies play in order and shown messages are recorded;
    /// running out of replies is an error.
    #[tokio::test]
    async fn scripted_interaction_replays_and_records() {
        let interaction = ScriptedInteraction::with_replies(vec!["yes", "no"]);
        assert_eq!(interaction.show_message("first?").await.unwrap(), "yes");
        assert_eq!(interaction.show_message("second?").await.unwrap(), "no");
        assert!(interaction.show_message("third?").await.is_err());
        assert_eq!(interaction.shown(), vec!["first?", "second?", "third?"]);
    }
}
