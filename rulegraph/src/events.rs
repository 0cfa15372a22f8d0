//! Run lifecycle events for operator-facing surfaces.
//!
//! A run emits events as it progresses; callers install a sink on the
//! runtime to observe them (a CLI printing tool activity, for example).
//! Emission is fire-and-forget: a run never blocks on, or fails because
//! of, its sink.

use std::sync::Arc;

/// One observable moment in a run.
#[derive(Debug, Clone, PartialEq)]
pub enum RunEvent {
    /// A graph node is about to execute.
    NodeStarted { node: String },
    /// The model requested a dispatched tool (`finish` is not reported).
    ToolCalled { tool: String },
}

/// Callback receiving [`RunEvent`]s as the run progresses.
pub type EventSink = Arc<dyn Fn(&RunEvent) + Send + Sync>;
