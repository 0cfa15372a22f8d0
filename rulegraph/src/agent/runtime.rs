//! Agent runtime: merges capability sets, builds the workflow graph, and
//! drives one diagnosis run under a shared iteration budget.

use std::sync::Arc;

use tracing::info;

use crate::budget::IterationBudget;
use crate::compress::HistoryCompressor;
use crate::error::AgentError;
use crate::events::EventSink;
use crate::extract::{StructuredExtractor, DEFAULT_MAX_ATTEMPTS};
use crate::graph::{CompiledGraph, Edge, Graph, RunContext, END, START};
use crate::interact::UserInteraction;
use crate::llm::LlmClient;
use crate::tool_loop::ToolLoop;
use crate::tools::{AskUserTool, CapabilitySet, ToolDispatch};

use super::flow::FlowValue;
use super::nodes::{
    ClarifyNode, CreateCorrectionRequestNode, CreateInitialRequestNode, ProcessFeedbackNode,
    SavePrevExplanationNode, SaveUserInputNode, SetupNode, ShowSuggestionNode, SuggestNode,
};
use super::types::{Explanation, UserInput};
use super::PREV_EXPLANATION_KEY;

/// Runtime knobs. The iteration ceiling is global: every LLM request of a
/// run, across all subgraphs, charges the same budget.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Maximum LLM requests per run.
    pub max_iterations: u32,
    /// Attempt bound for structured feedback extraction.
    pub extract_attempts: u32,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_iterations: 200,
            extract_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

/// The diagnosis agent.
///
/// Construction merges the caller's capability sets with the built-in
/// ask-user capability, so a tool-name collision fails here, before any run.
/// The clarification subgraph sees only the ask-user tool; the suggestion
/// subgraph sees everything.
pub struct AgentRuntime {
    llm: Arc<dyn LlmClient>,
    clarify_dispatch: Arc<ToolDispatch>,
    suggest_dispatch: Arc<ToolDispatch>,
    interaction: Arc<dyn UserInteraction>,
    config: AgentConfig,
    events: Option<EventSink>,
}

impl AgentRuntime {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        capabilities: Vec<CapabilitySet>,
        interaction: Arc<dyn UserInteraction>,
        config: AgentConfig,
    ) -> Result<Self, AgentError> {
        let user_set = || {
            CapabilitySet::new("user")
                .with_tool(Arc::new(AskUserTool::new(interaction.clone())))
        };
        let clarify_dispatch = Arc::new(ToolDispatch::merge(vec![user_set()])?);
        let mut all_sets = capabilities;
        all_sets.push(user_set());
        let suggest_dispatch = Arc::new(ToolDispatch::merge(all_sets)?);

        Ok(Self {
            llm,
            clarify_dispatch,
            suggest_dispatch,
            interaction,
            config,
            events: None,
        })
    }

    /// Installs a sink receiving [`crate::events::RunEvent`]s from every run
    /// (node starts, dispatched tool calls).
    pub fn with_event_sink(mut self, sink: EventSink) -> Self {
        self.events = Some(sink);
        self
    }

    /// Runs one diagnosis for the user's message, returning the accepted
    /// explanation.
    pub async fn run(&self, message: impl Into<String>) -> Result<Explanation, AgentError> {
        let mut ctx = RunContext::new(IterationBudget::new(self.config.max_iterations));
        if let Some(sink) = &self.events {
            ctx = ctx.with_event_sink(sink.clone());
        }
        let graph = self.build_graph()?;

        info!(limit = self.config.max_iterations, "diagnosis run starting");
        let result = graph
            .run(FlowValue::Input(UserInput::new(message)), &ctx)
            .await?;
        let explanation = result.into_explanation()?;
        info!(
            iterations = ctx.budget().used(),
            problems = explanation.problems.len(),
            "diagnosis run finished"
        );
        Ok(explanation)
    }

    /// Builds and compiles the workflow graph.
    ///
    /// Rejected feedback routes back through `create_correction_request`
    /// into another suggestion pass; accepted feedback exits with the stored
    /// explanation. The rejection edge is declared first so it wins any tie.
    fn build_graph(&self) -> Result<CompiledGraph<FlowValue>, AgentError> {
        let compressor = Arc::new(HistoryCompressor::new(self.llm.clone()));
        let extractor = Arc::new(
            StructuredExtractor::new(self.llm.clone())
                .with_max_attempts(self.config.extract_attempts),
        );
        let clarify_loop = Arc::new(ToolLoop::new(
            self.llm.clone(),
            self.clarify_dispatch.clone(),
        ));
        let suggest_loop = Arc::new(ToolLoop::new(
            self.llm.clone(),
            self.suggest_dispatch.clone(),
        ));

        let mut graph = Graph::new();
        graph
            .add_node("setup", Arc::new(SetupNode))
            .add_node(
                "clarify_user_problem",
                Arc::new(ClarifyNode::new(clarify_loop)),
            )
            .add_node(
                "save_user_input",
                Arc::new(SaveUserInputNode::new(compressor.clone())),
            )
            .add_node("create_initial_request", Arc::new(CreateInitialRequestNode))
            .add_node(
                "suggest_explanation",
                Arc::new(SuggestNode::new(suggest_loop)),
            )
            .add_node(
                "save_prev_explanation",
                Arc::new(SavePrevExplanationNode::new(compressor)),
            )
            .add_node(
                "show_suggestion",
                Arc::new(ShowSuggestionNode::new(self.interaction.clone())),
            )
            .add_node(
                "process_feedback",
                Arc::new(ProcessFeedbackNode::new(extractor)),
            )
            .add_node(
                "create_correction_request",
                Arc::new(CreateCorrectionRequestNode),
            );

        graph
            .add_edge(START, Edge::to("setup"))
            .add_edge("setup", Edge::to("clarify_user_problem"))
            .add_edge("clarify_user_problem", Edge::to("save_user_input"))
            .add_edge("save_user_input", Edge::to("create_initial_request"))
            .add_edge("create_initial_request", Edge::to("suggest_explanation"))
            .add_edge("suggest_explanation", Edge::to("save_prev_explanation"))
            .add_edge("save_prev_explanation", Edge::to("show_suggestion"))
            .add_edge("show_suggestion", Edge::to("process_feedback"))
            .add_edge(
                "process_feedback",
                Edge::to("create_correction_request").when(FlowValue::is_rejected_feedback),
            )
            .add_edge(
                "process_feedback",
                Edge::to(END)
                    .when(FlowValue::is_accepted_feedback)
                    .transform(|_, ctx| {
                        Ok(FlowValue::Explanation(
                            ctx.storage().get(&PREV_EXPLANATION_KEY)?,
                        ))
                    }),
            )
            .add_edge("create_correction_request", Edge::to("suggest_explanation"));

        Ok(graph.compile()?)
    }
}
