//! Graph node trait: one step in a task graph.
//!
//! Receives the current value `S` and the run context, returns the node's
//! output. Routing is decided afterwards by the node's outgoing edges, not
//! by the node itself; see [`super::Edge`].

use async_trait::async_trait;
use std::fmt::Debug;

use crate::error::AgentError;

use super::RunContext;

/// One step in a graph: value in, value out.
///
/// The node's action may suspend (LLM calls, tool calls, human prompts); the
/// run advances strictly sequentially, resuming with the awaited result
/// before any edge is evaluated.
///
/// **Interaction**: registered via [`super::Graph::add_node`]; executed by
/// [`super::CompiledGraph::run`].
#[async_trait]
pub trait Node<S>: Send + Sync
where
    S: Clone + Send + Sync + Debug + 'static,
{
    /// Node id (e.g. `"suggest"`). Must be unique within a graph.
    fn id(&self) -> &str;

    /// One step: evaluate the node's action against the incoming value.
    async fn run(&self, value: S, ctx: &RunContext) -> Result<S, AgentError>;
}
