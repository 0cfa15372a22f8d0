//! Graph builder: nodes plus ordered, optionally conditional edges.
//!
//! Add nodes with `add_node`, declare edges with `add_edge(from, Edge::to(..))`
//! using `START` and `END` for graph entry/exit, then `compile` into a
//! [`CompiledGraph`]. Edge declaration order per source node is the runtime
//! tie-break order.

use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;

use super::compile_error::CompilationError;
use super::compiled::CompiledGraph;
use super::edge::Edge;
use super::node::Node;

/// Sentinel for graph entry: use as `from` in `add_edge(START, ..)`.
pub const START: &str = "__start__";

/// Sentinel for graph exit: use as the edge target for the finish node.
pub const END: &str = "__end__";

/// Graph under construction.
///
/// Generic over the value type `S` flowing between nodes. A node may have
/// any number of outgoing edges; at runtime the first edge (in declaration
/// order) whose predicates hold is followed — declare the more specific
/// edge first.
///
/// **Interaction**: accepts `Arc<dyn Node<S>>`; produces [`CompiledGraph<S>`].
pub struct Graph<S> {
    nodes: HashMap<String, Arc<dyn Node<S>>>,
    /// (from, edge) in declaration order; order is preserved per source node.
    edges: Vec<(String, Edge<S>)>,
}

impl<S> Default for Graph<S>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<S> Graph<S>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self {
            nodes: HashMap::new(),
            edges: Vec::new(),
        }
    }

    /// Adds a node; id must be unique. Replaces if same id.
    pub fn add_node(&mut self, id: impl Into<String>, node: Arc<dyn Node<S>>) -> &mut Self {
        self.nodes.insert(id.into(), node);
        self
    }

    /// Adds an outgoing edge for `from` (use [`START`] for graph entry).
    ///
    /// Edges are evaluated in the order they were added for the same source.
    pub fn add_edge(&mut self, from: impl Into<String>, edge: Edge<S>) -> &mut Self {
        self.edges.push((from.into(), edge));
        self
    }

    /// Validates the graph and builds the executable form.
    ///
    /// Checks: every edge source/target is START/END or a registered node,
    /// START has at least one outgoing edge, some edge reaches END, and
    /// every registered node has at least one outgoing edge.
    pub fn compile(self) -> Result<CompiledGraph<S>, CompilationError> {
        for (from, edge) in &self.edges {
            if from != START && !self.nodes.contains_key(from) {
                return Err(CompilationError::NodeNotFound(from.clone()));
            }
            let to = edge.target();
            if to != END && !self.nodes.contains_key(to) {
                return Err(CompilationError::NodeNotFound(to.to_string()));
            }
        }

        if !self.edges.iter().any(|(f, _)| f == START) {
            return Err(CompilationError::MissingStart);
        }
        if !self.edges.iter().any(|(_, e)| e.target() == END) {
            return Err(CompilationError::MissingEnd);
        }
        for id in self.nodes.keys() {
            if !self.edges.iter().any(|(f, _)| f == id) {
                return Err(CompilationError::NoOutgoingEdges(id.clone()));
            }
        }

        let mut edge_map: HashMap<String, Vec<Edge<S>>> = HashMap::new();
        for (from, edge) in self.edges {
            edge_map.entry(from).or_default().push(edge);
        }

        Ok(CompiledGraph::new(self.nodes, edge_map))
    }
}
