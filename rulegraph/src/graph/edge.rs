//! Directed edges with ordered transform and predicate steps.
//!
//! An edge is built fluently: `Edge::to("next").when(p).transform(f)`.
//! Steps run in declaration order, each consuming the prior step's output;
//! a failing predicate rejects the edge without touching other edges.

use std::fmt::Debug;
use std::sync::Arc;

use crate::error::AgentError;

use super::RunContext;

/// Rewrites the value crossing an edge. Has read access to the run context
/// (e.g. shared storage) but routing stays purely value-driven.
pub type TransformFn<S> = Arc<dyn Fn(S, &RunContext) -> Result<S, AgentError> + Send + Sync>;

/// Gates an edge on the (possibly transformed) value.
pub type PredicateFn<S> = Arc<dyn Fn(&S) -> bool + Send + Sync>;

enum EdgeStep<S> {
    Transform(TransformFn<S>),
    When(PredicateFn<S>),
}

/// A directed, optionally transformed and conditionally gated link between
/// two nodes.
///
/// **Interaction**: declared via [`super::Graph::add_edge`]; evaluated in
/// declaration order by [`super::CompiledGraph::run`], which follows the
/// first edge whose predicates all hold (an edge without predicates always
/// holds).
pub struct Edge<S> {
    to: String,
    steps: Vec<EdgeStep<S>>,
}

impl<S> Edge<S>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    /// Starts an edge pointing at `target` (a node id or [`super::END`]).
    pub fn to(target: impl Into<String>) -> Self {
        Self {
            to: target.into(),
            steps: Vec::new(),
        }
    }

    /// Appends a transform step. Multiple transforms apply strictly in
    /// declared order, each consuming the prior transform's output.
    pub fn transform(
        mut self,
        f: impl Fn(S, &RunContext) -> Result<S, AgentError> + Send + Sync + 'static,
    ) -> Self {
        self.steps.push(EdgeStep::Transform(Arc::new(f)));
        self
    }

    /// Appends a predicate step evaluated against the value as transformed
    /// so far. When it returns false the edge does not match.
    pub fn when(mut self, p: impl Fn(&S) -> bool + Send + Sync + 'static) -> Self {
        self.steps.push(EdgeStep::When(Arc::new(p)));
        self
    }

    /// Target node id (or END).
    pub fn target(&self) -> &str {
        &self.to
    }

    /// Runs the edge's steps against `value`.
    ///
    /// Returns `Ok(Some(transformed))` when every predicate held,
    /// `Ok(None)` when a predicate rejected the edge, and `Err` when a
    /// transform failed.
    pub(super) fn evaluate(&self, value: &S, ctx: &RunContext) -> Result<Option<S>, AgentError> {
        let mut working = value.clone();
        for step in &self.steps {
            match step {
                EdgeStep::Transform(f) => working = f(working, ctx)?,
                EdgeStep::When(p) => {
                    if !p(&working) {
                        return Ok(None);
                    }
                }
            }
        }
        Ok(Some(working))
    }
}
