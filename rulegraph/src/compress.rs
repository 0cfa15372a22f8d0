//! History compression: replace the conversation so far with a condensed
//! summary, bounding context growth across the correction loop.
//!
//! Invoked after nodes that store new durable facts into shared storage;
//! compression only touches the transient conversational context, never
//! storage values, so subsequent tool-using turns can still reference prior
//! facts through storage.

use std::sync::Arc;

use tracing::debug;

use crate::error::AgentError;
use crate::graph::RunContext;
use crate::llm::LlmClient;
use crate::message::Message;

/// Prefix of the system message holding the condensed history.
pub const SUMMARY_PREFIX: &str = "[Summary of earlier conversation]: ";

/// Collapses the run history into one summary message via the LLM.
///
/// The leading system preamble (when present) survives verbatim; everything
/// after it is replaced by a single summary system message. One LLM request,
/// charged against the run budget.
pub struct HistoryCompressor {
    llm: Arc<dyn LlmClient>,
}

impl HistoryCompressor {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }

    /// Replaces the context's history with `[preamble?] + [summary]`.
    pub async fn compress(&self, ctx: &RunContext) -> Result<(), AgentError> {
        let history = ctx.history()?;

        let (preamble, rest) = match history.split_first() {
            Some((Message::System(s), rest)) => (Some(Message::system(s.clone())), rest),
            _ => (None, history.as_slice()),
        };
        if rest.len() <= 1 {
            debug!("history too short to compress");
            return Ok(());
        }

        let prompt = build_summary_prompt(rest);
        ctx.budget().try_charge()?;
        let response = self.llm.invoke(&[Message::user(prompt)], &[]).await?;

        let mut compressed = Vec::with_capacity(2);
        if let Some(preamble) = preamble {
            compressed.push(preamble);
        }
        compressed.push(Message::system(format!(
            "{}{}",
            SUMMARY_PREFIX, response.content
        )));
        debug!(
            before = history.len(),
            after = compressed.len(),
            "history compressed"
        );
        ctx.replace_history(compressed)
    }
}

/// Builds the summarization prompt: instructions, then the message list with
/// role prefixes.
fn build_summary_prompt(messages: &[Message]) -> String {
    let mut parts = vec![
        "Summarize the following conversation. Focus on:".to_string(),
        "- The problem the user reported and how it was clarified".to_string(),
        "- Facts learned from tool results (workflows, rules, scripts)".to_string(),
        "- The current suggested explanation and any feedback on it".to_string(),
        "- What still needs to be verified".to_string(),
        String::new(),
    ];
    for m in messages {
        match m {
            Message::System(s) => parts.push(format!("System: {}", s)),
            Message::User(s) => parts.push(format!("User: {}", s)),
            Message::Assistant(s) => parts.push(format!("Assistant: {}", s)),
        }
    }
    parts.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::budget::IterationBudget;
    use crate::llm::MockLlm;

    /// **Scenario**: compression keeps the system preamble and replaces the
    /// rest with one summary message.
    #[tokio::test]
    async fn compress_keeps_preamble_and_replaces_rest() {
        let llm = Arc::new(MockLlm::always("user reported X; rule wf-1 suspected"));
        let compressor = HistoryCompressor::new(llm);
        let ctx = RunContext::new(IterationBudget::new(10));
        ctx.push_message(Message::system("You are a diagnosis assistant."))
            .unwrap();
        ctx.push_message(Message::user("Issue X happened")).unwrap();
        ctx.push_message(Message::user("Tool get_workflow_rules returned: ..."))
            .unwrap();
        ctx.push_message(Message::assistant("Looking into it")).unwrap();

        compressor.compress(&ctx).await.unwrap();

        let history = ctx.history().unwrap();
        assert_eq!(history.len(), 2);
        assert!(matches!(&history[0], Message::System(s) if s.contains("diagnosis assistant")));
        assert!(
            matches!(&history[1], Message::System(s) if s.starts_with(SUMMARY_PREFIX) && s.contains("wf-1"))
        );
    }

    /// **Scenario**: a short history is left untouched and costs no budget.
    #[tokio::test]
    async fn short_history_is_not_compressed() {
        let llm = Arc::new(MockLlm::always("unused"));
        let compressor = HistoryCompressor::new(llm);
        let ctx = RunContext::new(IterationBudget::new(10));
        ctx.push_message(Message::system("preamble")).unwrap();
        ctx.push_message(Message::user("only message")).unwrap();

        compressor.compress(&ctx).await.unwrap();

        assert_eq!(ctx.history().unwrap().len(), 2);
        assert_eq!(ctx.budget().used(), 0);
    }

    /// **Scenario**: the summary prompt carries role prefixes for each message.
    #[test]
    fn summary_prompt_lists_messages_with_roles() {
        let prompt = build_summary_prompt(&[
            Message::user("u1"),
            Message::assistant("a1"),
            Message::system("s1"),
        ]);
        assert!(prompt.contains("User: u1"));
        assert!(prompt.contains("Assistant: a1"));
        assert!(prompt.contains("System: s1"));
        assert!(prompt.starts_with("Summarize the following conversation."));
    }
}
