//! Task-graph engine: typed nodes, conditional transforming edges, run loop.
//!
//! Build with [`Graph::add_node`] / [`Graph::add_edge`] using the [`START`]
//! and [`END`] sentinels, then [`Graph::compile`] into a [`CompiledGraph`]
//! and [`CompiledGraph::run`] it with a [`RunContext`].
//!
//! Edges carry an ordered list of steps: `transform` rewrites the value in
//! flight, `when` gates the edge on a predicate. Steps are applied in
//! declaration order; the first edge (in declaration order) whose predicates
//! all hold is followed. Zero matching edges is a fatal run failure. There
//! is no revisit limit at the engine level: loops must be broken by
//! conditions written into the graph.

mod builder;
mod compile_error;
mod compiled;
mod edge;
mod node;
mod run_context;

pub use builder::{Graph, END, START};
pub use compile_error::CompilationError;
pub use compiled::CompiledGraph;
pub use edge::Edge;
pub use node::Node;
pub use run_context::RunContext;
