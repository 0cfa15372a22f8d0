//! Graph construction errors, reported by `Graph::compile`.

use thiserror::Error;

/// Why a graph failed to compile.
///
/// All variants are construction-time contract violations; a compiled graph
/// can still fail at runtime only through node errors or a no-matching-edge
/// condition.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CompilationError {
    /// An edge references a node id that was never added.
    #[error("edge references unknown node: {0}")]
    NodeNotFound(String),

    /// No edge leaves START.
    #[error("graph has no edge from START")]
    MissingStart,

    /// No edge reaches END.
    #[error("graph has no edge to END")]
    MissingEnd,

    /// A node has no outgoing edges, so reaching it would strand the run.
    #[error("node has no outgoing edges: {0}")]
    NoOutgoingEdges(String),
}
