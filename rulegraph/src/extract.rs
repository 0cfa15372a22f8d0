//! Structured-output extraction: ask the model for a value matching a
//! declared schema, parse it, retry on failure up to a bound.
//!
//! Failure after the retry bound is a result-carrying outcome (`value:
//! None`), not an error, so callers can branch on success explicitly. Only
//! transport failures and budget exhaustion surface as `Err`.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::AgentError;
use crate::graph::RunContext;
use crate::llm::LlmClient;
use crate::message::Message;

/// Default number of attempts (first request plus repair retries).
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Outcome of one extraction: the parsed value when an attempt succeeded,
/// plus the last raw reply and the attempts consumed.
#[derive(Debug)]
pub struct ExtractOutcome<T> {
    /// Parsed value, `None` when every attempt failed validation.
    pub value: Option<T>,
    /// Raw model reply from the last attempt.
    pub raw: String,
    /// Attempts consumed (1-based).
    pub attempts: u32,
}

/// Schema-targeted extractor over an LLM client.
///
/// **Interaction**: used by the `process_feedback` workflow node to parse
/// raw human feedback; the tool loop's `finish` argument validation covers
/// the same contract for subgraph results.
pub struct StructuredExtractor {
    llm: Arc<dyn LlmClient>,
    max_attempts: u32,
}

impl StructuredExtractor {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self {
            llm,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    /// Overrides the attempt bound (minimum 1).
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Requests a value matching `schema`, built from the run history plus
    /// `instruction`. Each attempt charges the run budget.
    pub async fn extract<T>(
        &self,
        instruction: &str,
        schema: &Value,
        ctx: &RunContext,
    ) -> Result<ExtractOutcome<T>, AgentError>
    where
        T: DeserializeOwned,
    {
        // Repair turns stay local to the extraction; the run history only
        // ever sees the instruction's effect through the caller.
        let mut messages = ctx.history()?;
        messages.push(Message::user(format!(
            "{}\n\nReply with a single JSON object matching this schema, and nothing else:\n{}",
            instruction, schema
        )));

        let mut raw = String::new();
        for attempt in 1..=self.max_attempts {
            ctx.budget().try_charge()?;
            let response = self.llm.invoke(&messages, &[]).await?;
            raw = response.content;

            let candidate = strip_code_fences(&raw);
            match serde_json::from_str::<T>(candidate) {
                Ok(value) => {
                    debug!(attempt, "structured output parsed");
                    return Ok(ExtractOutcome {
                        value: Some(value),
                        raw,
                        attempts: attempt,
                    });
                }
                Err(e) => {
                    warn!(attempt, error = %e, "structured output failed validation");
                    messages.push(Message::assistant(raw.clone()));
                    messages.push(Message::user(format!(
                        "That reply was not valid JSON for the expected schema: {}. \
                         Reply again with a single JSON object only.",
                        e
                    )));
                }
            }
        }

        Ok(ExtractOutcome {
            value: None,
            raw,
            attempts: self.max_attempts,
        })
    }
}

/// Strips a surrounding markdown code fence, if present.
fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    let rest = rest.strip_suffix("```").unwrap_or(rest);
    rest.trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::budget::IterationBudget;
    use crate::llm::{MockLlm, ScriptedReply};

    #[derive(Debug, PartialEq, serde::Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct Verdict {
        is_accepted: bool,
        message: String,
    }

    fn ctx(limit: u32) -> RunContext {
        RunContext::new(IterationBudget::new(limit))
    }

    fn schema() -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "isAccepted": {"type": "boolean"},
                "message": {"type": "string"}
            },
            "required": ["isAccepted", "message"]
        })
    }

    /// **Scenario**: a valid first reply parses on attempt 1.
    #[tokio::test]
    async fn valid_first_reply_parses() {
        let llm = Arc::new(MockLlm::always(r#"{"isAccepted":true,"message":"ok"}"#));
        let extractor = StructuredExtractor::new(llm);
        let ctx = ctx(10);
        let outcome: ExtractOutcome<Verdict> =
            extractor.extract("Judge this.", &schema(), &ctx).await.unwrap();
        assert_eq!(outcome.attempts, 1);
        assert!(outcome.value.unwrap().is_accepted);
    }

    /// **Scenario**: a fenced JSON reply still parses.
    #[tokio::test]
    async fn fenced_reply_parses() {
        let llm = Arc::new(MockLlm::always(
            "```json\n{\"isAccepted\":false,\"message\":\"wrong rule\"}\n```",
        ));
        let extractor = StructuredExtractor::new(llm);
        let ctx = ctx(10);
        let outcome: ExtractOutcome<Verdict> =
            extractor.extract("Judge this.", &schema(), &ctx).await.unwrap();
        let verdict = outcome.value.unwrap();
        assert!(!verdict.is_accepted);
        assert_eq!(verdict.message, "wrong rule");
    }

    /// **Scenario**: an invalid reply followed by a valid one succeeds on
    /// attempt 2, and the repair feedback was sent to the model.
    #[tokio::test]
    async fn invalid_then_repaired_reply_succeeds() {
        let llm = Arc::new(MockLlm::with_script(vec![
            ScriptedReply::text("not json at all"),
            ScriptedReply::text(r#"{"isAccepted":true,"message":""}"#),
        ]));
        let extractor = StructuredExtractor::new(llm.clone());
        let ctx = ctx(10);
        let outcome: ExtractOutcome<Verdict> =
            extractor.extract("Judge this.", &schema(), &ctx).await.unwrap();
        assert_eq!(outcome.attempts, 2);
        assert!(outcome.value.is_some());
        assert!(llm
            .request_messages(1)
            .iter()
            .any(|m| m.content().contains("not valid JSON")));
    }

    /// **Scenario**: exhausting the bound yields a result-carrying failure
    /// (value None, attempts = bound), not an Err.
    #[tokio::test]
    async fn exhausted_retries_carry_failure_in_result() {
        let llm = Arc::new(MockLlm::always("still not json"));
        let extractor = StructuredExtractor::new(llm).with_max_attempts(2);
        let ctx = ctx(10);
        let outcome: ExtractOutcome<Verdict> =
            extractor.extract("Judge this.", &schema(), &ctx).await.unwrap();
        assert!(outcome.value.is_none());
        assert_eq!(outcome.attempts, 2);
        assert_eq!(outcome.raw, "still not json");
    }

    /// **Scenario**: budget exhaustion inside extraction surfaces as Err.
    #[tokio::test]
    async fn budget_exhaustion_is_an_error() {
        let llm = Arc::new(MockLlm::always("nope"));
        let extractor = StructuredExtractor::new(llm);
        let ctx = ctx(1);
        let result: Result<ExtractOutcome<Verdict>, _> =
            extractor.extract("Judge this.", &schema(), &ctx).await;
        assert!(matches!(result, Err(AgentError::BudgetExceeded { .. })));
    }

    /// **Scenario**: fence stripping handles plain, fenced, and labeled forms.
    #[test]
    fn strip_code_fences_variants() {
        assert_eq!(strip_code_fences("{\"a\":1}"), "{\"a\":1}");
        assert_eq!(strip_code_fences("```\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fences("```json\n{\"a\":1}\n```"), "{\"a\":1}");
    }
}
