//! Executable graph: advances a run from START to END.
//!
//! The run loop evaluates the current node, then enumerates its outgoing
//! edges in declaration order, applying each edge's steps; the first edge
//! whose predicates hold is followed and its transformed value becomes the
//! next node's input. Reaching END terminates the run successfully with the
//! value that crossed the final edge.

use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;

use tracing::debug;

use crate::error::AgentError;
use crate::events::RunEvent;

use super::builder::{END, START};
use super::edge::Edge;
use super::node::Node;
use super::run_context::RunContext;

/// Compiled, immutable graph ready for execution.
///
/// **Interaction**: produced by [`super::Graph::compile`]; one `run` per
/// invocation, strictly sequential, sharing nothing across runs except what
/// the caller puts behind the nodes themselves.
pub struct CompiledGraph<S> {
    nodes: HashMap<String, Arc<dyn Node<S>>>,
    edges: HashMap<String, Vec<Edge<S>>>,
}

impl<S> CompiledGraph<S>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    pub(super) fn new(
        nodes: HashMap<String, Arc<dyn Node<S>>>,
        edges: HashMap<String, Vec<Edge<S>>>,
    ) -> Self {
        Self { nodes, edges }
    }

    /// Executes the graph from START until END is reached.
    ///
    /// Termination is guaranteed only by the graph's own structure; loops
    /// must be broken by predicates (or by the run's LLM budget failing a
    /// node). Zero matching edges leaving a node is a fatal run failure.
    pub async fn run(&self, initial: S, ctx: &RunContext) -> Result<S, AgentError> {
        let (mut current_id, mut value) = self.follow(START, initial, ctx)?;

        while current_id != END {
            let node = self.nodes.get(&current_id).ok_or_else(|| {
                AgentError::ExecutionFailed(format!("node not found at runtime: {}", current_id))
            })?;
            debug!(node = %current_id, "running graph node");
            ctx.emit(RunEvent::NodeStarted {
                node: current_id.clone(),
            });
            let output = node.run(value, ctx).await?;
            let (next_id, next_value) = self.follow(&current_id, output, ctx)?;
            debug!(from = %current_id, to = %next_id, "edge followed");
            current_id = next_id;
            value = next_value;
        }

        Ok(value)
    }

    /// Selects the first matching edge leaving `from` and applies its steps.
    ///
    /// First-match in declaration order is the documented tie-break rule:
    /// when several edges could match, the one declared first wins.
    fn follow(&self, from: &str, value: S, ctx: &RunContext) -> Result<(String, S), AgentError> {
        let edges = self.edges.get(from).ok_or_else(|| {
            AgentError::ExecutionFailed(format!("no edges declared for node '{}'", from))
        })?;
        for edge in edges {
            if let Some(transformed) = edge.evaluate(&value, ctx)? {
                return Ok((edge.target().to_string(), transformed));
            }
        }
        Err(AgentError::ExecutionFailed(format!(
            "no edge matched leaving node '{}'",
            from
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    use crate::budget::IterationBudget;
    use crate::graph::Graph;
    use crate::storage::StorageKey;

    static TRACE_KEY: StorageKey<Vec<String>> = StorageKey::new("trace");

    fn ctx() -> RunContext {
        RunContext::new(IterationBudget::new(100))
    }

    /// Node that applies a function and records its visit in storage.
    struct StepNode {
        id: &'static str,
        apply: fn(i32) -> i32,
    }

    #[async_trait]
    impl Node<i32> for StepNode {
        fn id(&self) -> &str {
            self.id
        }
        async fn run(&self, value: i32, ctx: &RunContext) -> Result<i32, AgentError> {
            let mut trace = ctx.storage().get(&TRACE_KEY).unwrap_or_default();
            trace.push(self.id.to_string());
            ctx.storage().set(&TRACE_KEY, trace)?;
            Ok((self.apply)(value))
        }
    }

    fn step(id: &'static str, apply: fn(i32) -> i32) -> Arc<dyn Node<i32>> {
        Arc::new(StepNode { id, apply })
    }

    /// **Scenario**: a linear graph runs nodes in order and returns the
    /// value carried into END.
    #[tokio::test]
    async fn linear_graph_runs_to_end() {
        let mut graph = Graph::<i32>::new();
        graph.add_node("inc", step("inc", |v| v + 1));
        graph.add_node("dbl", step("dbl", |v| v * 2));
        graph.add_edge(START, Edge::to("inc"));
        graph.add_edge("inc", Edge::to("dbl"));
        graph.add_edge("dbl", Edge::to(END));
        let compiled = graph.compile().unwrap();

        let ctx = ctx();
        let out = compiled.run(3, &ctx).await.unwrap();
        assert_eq!(out, 8);
        assert_eq!(
            ctx.storage().get(&TRACE_KEY).unwrap(),
            vec!["inc".to_string(), "dbl".to_string()]
        );
    }

    /// **Scenario**: among several matching edges the first declared wins.
    #[tokio::test]
    async fn first_declared_matching_edge_wins() {
        let mut graph = Graph::<i32>::new();
        graph.add_node("src", step("src", |v| v));
        graph.add_node("a", step("a", |v| v + 100));
        graph.add_node("b", step("b", |v| v + 200));
        graph.add_edge(START, Edge::to("src"));
        // Both edges match every value; declaration order breaks the tie.
        graph.add_edge("src", Edge::to("a").when(|_| true));
        graph.add_edge("src", Edge::to("b").when(|_| true));
        graph.add_edge("a", Edge::to(END));
        graph.add_edge("b", Edge::to(END));
        let compiled = graph.compile().unwrap();

        let out = compiled.run(1, &ctx()).await.unwrap();
        assert_eq!(out, 101);
    }

    /// **Scenario**: zero matching edges is a fatal run failure naming the node.
    #[tokio::test]
    async fn no_matching_edge_fails_run() {
        let mut graph = Graph::<i32>::new();
        graph.add_node("src", step("src", |v| v));
        graph.add_node("sink", step("sink", |v| v));
        graph.add_edge(START, Edge::to("src"));
        graph.add_edge("src", Edge::to("sink").when(|v| *v > 10));
        graph.add_edge("sink", Edge::to(END));
        let compiled = graph.compile().unwrap();

        match compiled.run(1, &ctx()).await {
            Err(AgentError::ExecutionFailed(msg)) => {
                assert!(msg.contains("no edge matched") && msg.contains("src"), "{}", msg)
            }
            other => panic!("expected ExecutionFailed, got {:?}", other),
        }
    }

    /// **Scenario**: an edge transform rewrites the value before the next
    /// node sees it.
    #[tokio::test]
    async fn edge_transform_feeds_next_node() {
        let mut graph = Graph::<i32>::new();
        graph.add_node("src", step("src", |v| v));
        graph.add_node("sink", step("sink", |v| v));
        graph.add_edge(START, Edge::to("src"));
        graph.add_edge("src", Edge::to("sink").transform(|v, _| Ok(v * 7)));
        graph.add_edge("sink", Edge::to(END));
        let compiled = graph.compile().unwrap();

        assert_eq!(compiled.run(2, &ctx()).await.unwrap(), 14);
    }

    /// **Scenario**: a cycle is broken by a predicate written into the
    /// graph (acceptance-flag pattern); the run loops until the condition
    /// flips, then exits through the END edge.
    #[tokio::test]
    async fn loop_broken_by_predicate_terminates() {
        let mut graph = Graph::<i32>::new();
        graph.add_node("work", step("work", |v| v + 1));
        graph.add_edge(START, Edge::to("work"));
        graph.add_edge("work", Edge::to(END).when(|v| *v >= 5));
        graph.add_edge("work", Edge::to("work"));
        let compiled = graph.compile().unwrap();

        let ctx = ctx();
        let out = compiled.run(0, &ctx).await.unwrap();
        assert_eq!(out, 5);
        assert_eq!(ctx.storage().get(&TRACE_KEY).unwrap().len(), 5);
    }

    /// **Scenario**: a node error aborts the run and propagates.
    #[tokio::test]
    async fn node_error_aborts_run() {
        struct FailNode;

        #[async_trait]
        impl Node<i32> for FailNode {
            fn id(&self) -> &str {
                "fail"
            }
            async fn run(&self, _value: i32, _ctx: &RunContext) -> Result<i32, AgentError> {
                Err(AgentError::ExecutionFailed("node blew up".into()))
            }
        }

        let mut graph = Graph::<i32>::new();
        graph.add_node("fail", Arc::new(FailNode));
        graph.add_edge(START, Edge::to("fail"));
        graph.add_edge("fail", Edge::to(END));
        let compiled = graph.compile().unwrap();

        match compiled.run(0, &ctx()).await {
            Err(AgentError::ExecutionFailed(msg)) => assert!(msg.contains("node blew up")),
            other => panic!("expected ExecutionFailed, got {:?}", other),
        }
    }
}
