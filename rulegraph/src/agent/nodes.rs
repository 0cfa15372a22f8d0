//! Workflow nodes over [`FlowValue`].
//!
//! Each node is a small unit: consume one variant, do one thing, produce the
//! next variant. The LLM-facing nodes delegate to the tool loop and the
//! extractor; the save nodes write storage and then compress history so the
//! correction loop does not accumulate unbounded context.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::compress::HistoryCompressor;
use crate::error::AgentError;
use crate::extract::StructuredExtractor;
use crate::graph::{Node, RunContext};
use crate::interact::UserInteraction;
use crate::message::Message;
use crate::tool_loop::ToolLoop;

use super::flow::FlowValue;
use super::prompts;
use super::types::{Explanation, ExplanationFeedback, ExplanationRequest};
use super::{PREV_EXPLANATION_KEY, USER_INPUT_KEY};

/// Installs the system preamble; the user's raw message passes through.
pub struct SetupNode;

#[async_trait]
impl Node<FlowValue> for SetupNode {
    fn id(&self) -> &str {
        "setup"
    }

    async fn run(&self, value: FlowValue, ctx: &RunContext) -> Result<FlowValue, AgentError> {
        ctx.push_message(Message::system(prompts::SYSTEM_PROMPT))?;
        Ok(value)
    }
}

/// Clarifies the user's problem statement via the ask-user capability,
/// finishing with a structured problem list.
pub struct ClarifyNode {
    tool_loop: Arc<ToolLoop>,
}

impl ClarifyNode {
    pub fn new(tool_loop: Arc<ToolLoop>) -> Self {
        Self { tool_loop }
    }
}

#[async_trait]
impl Node<FlowValue> for ClarifyNode {
    fn id(&self) -> &str {
        "clarify_user_problem"
    }

    async fn run(&self, value: FlowValue, ctx: &RunContext) -> Result<FlowValue, AgentError> {
        let input = value.into_input()?;
        let task = prompts::clarify_task(&input.message);
        let clarified: Explanation = self
            .tool_loop
            .run(&task, Explanation::schema(), ctx)
            .await?;
        debug!(problems = clarified.problems.len(), "problem statement clarified");
        Ok(FlowValue::Explanation(clarified))
    }
}

/// Stores the clarified problem statement, then compresses history.
pub struct SaveUserInputNode {
    compressor: Arc<HistoryCompressor>,
}

impl SaveUserInputNode {
    pub fn new(compressor: Arc<HistoryCompressor>) -> Self {
        Self { compressor }
    }
}

#[async_trait]
impl Node<FlowValue> for SaveUserInputNode {
    fn id(&self) -> &str {
        "save_user_input"
    }

    async fn run(&self, value: FlowValue, ctx: &RunContext) -> Result<FlowValue, AgentError> {
        let clarified = value.into_explanation()?;
        ctx.storage().set(&USER_INPUT_KEY, clarified.clone())?;
        self.compressor.compress(ctx).await?;
        Ok(FlowValue::Explanation(clarified))
    }
}

/// Wraps the clarified problem statement into an initial suggestion request.
pub struct CreateInitialRequestNode;

#[async_trait]
impl Node<FlowValue> for CreateInitialRequestNode {
    fn id(&self) -> &str {
        "create_initial_request"
    }

    async fn run(&self, value: FlowValue, _ctx: &RunContext) -> Result<FlowValue, AgentError> {
        let user_input = value.into_explanation()?;
        Ok(FlowValue::Request(ExplanationRequest::Initial { user_input }))
    }
}

/// Builds a correction request from rejected feedback plus stored state.
///
/// Reads both storage keys; reaching this node without them set is a
/// workflow-wiring bug and fails the run.
pub struct CreateCorrectionRequestNode;

#[async_trait]
impl Node<FlowValue> for CreateCorrectionRequestNode {
    fn id(&self) -> &str {
        "create_correction_request"
    }

    async fn run(&self, value: FlowValue, ctx: &RunContext) -> Result<FlowValue, AgentError> {
        let feedback = value.into_feedback()?;
        let user_input = ctx.storage().get(&USER_INPUT_KEY)?;
        let prev = ctx.storage().get(&PREV_EXPLANATION_KEY)?;
        info!("explanation rejected, building correction request");
        Ok(FlowValue::Request(ExplanationRequest::Correction {
            user_input,
            user_feedback: feedback.message,
            prev_suggested_explanation: prev,
        }))
    }
}

/// Runs one suggestion pass over the investigation capability set.
pub struct SuggestNode {
    tool_loop: Arc<ToolLoop>,
}

impl SuggestNode {
    pub fn new(tool_loop: Arc<ToolLoop>) -> Self {
        Self { tool_loop }
    }
}

#[async_trait]
impl Node<FlowValue> for SuggestNode {
    fn id(&self) -> &str {
        "suggest_explanation"
    }

    async fn run(&self, value: FlowValue, ctx: &RunContext) -> Result<FlowValue, AgentError> {
        let request = value.into_request()?;
        let task = prompts::render_request(&request);
        let explanation: Explanation = self
            .tool_loop
            .run(&task, Explanation::schema(), ctx)
            .await?;
        debug!(
            problems = explanation.problems.len(),
            "explanation suggested"
        );
        Ok(FlowValue::Explanation(explanation))
    }
}

/// Stores the latest suggestion, then compresses history.
pub struct SavePrevExplanationNode {
    compressor: Arc<HistoryCompressor>,
}

impl SavePrevExplanationNode {
    pub fn new(compressor: Arc<HistoryCompressor>) -> Self {
        Self { compressor }
    }
}

#[async_trait]
impl Node<FlowValue> for SavePrevExplanationNode {
    fn id(&self) -> &str {
        "save_prev_explanation"
    }

    async fn run(&self, value: FlowValue, ctx: &RunContext) -> Result<FlowValue, AgentError> {
        let explanation = value.into_explanation()?;
        ctx.storage()
            .set(&PREV_EXPLANATION_KEY, explanation.clone())?;
        self.compressor.compress(ctx).await?;
        Ok(FlowValue::Explanation(explanation))
    }
}

/// Shows the suggestion to the human and captures their raw reply.
pub struct ShowSuggestionNode {
    interaction: Arc<dyn UserInteraction>,
}

impl ShowSuggestionNode {
    pub fn new(interaction: Arc<dyn UserInteraction>) -> Self {
        Self { interaction }
    }
}

#[async_trait]
impl Node<FlowValue> for ShowSuggestionNode {
    fn id(&self) -> &str {
        "show_suggestion"
    }

    async fn run(&self, value: FlowValue, _ctx: &RunContext) -> Result<FlowValue, AgentError> {
        let explanation = value.into_explanation()?;
        let reply = self
            .interaction
            .show_message(&prompts::render_suggestion(&explanation))
            .await?;
        Ok(FlowValue::Text(reply))
    }
}

/// Parses the human's raw reply into accept-or-correct feedback.
///
/// Extraction failure after all retries is fatal: the workflow cannot route
/// without a verdict.
pub struct ProcessFeedbackNode {
    extractor: Arc<StructuredExtractor>,
}

impl ProcessFeedbackNode {
    pub fn new(extractor: Arc<StructuredExtractor>) -> Self {
        Self { extractor }
    }
}

#[async_trait]
impl Node<FlowValue> for ProcessFeedbackNode {
    fn id(&self) -> &str {
        "process_feedback"
    }

    async fn run(&self, value: FlowValue, ctx: &RunContext) -> Result<FlowValue, AgentError> {
        let reply = value.into_text()?;
        let outcome = self
            .extractor
            .extract::<ExplanationFeedback>(
                &prompts::feedback_instruction(&reply),
                &ExplanationFeedback::schema(),
                ctx,
            )
            .await?;
        match outcome.value {
            Some(feedback) => {
                debug!(is_accepted = feedback.is_accepted, "feedback parsed");
                Ok(FlowValue::Feedback(feedback))
            }
            None => Err(AgentError::ExecutionFailed(format!(
                "could not parse feedback after {} attempts; last reply: {}",
                outcome.attempts, outcome.raw
            ))),
        }
    }
}
