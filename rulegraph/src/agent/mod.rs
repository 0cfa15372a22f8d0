//! The diagnosis workflow: data model, prompts, nodes, and the runtime that
//! composes the graph engine, tool dispatch, extractor, and compressor into
//! one executable run.

mod flow;
mod nodes;
mod prompts;
mod runtime;
mod types;

pub use flow::FlowValue;
pub use runtime::{AgentConfig, AgentRuntime};
pub use types::{
    Explanation, ExplanationFeedback, ExplanationRequest, Problem, UserInput,
};

use crate::storage::StorageKey;

/// Clarified problem statement, stored by `save_user_input`.
pub static USER_INPUT_KEY: StorageKey<Explanation> = StorageKey::new("user_input");

/// Last suggested explanation, stored by `save_prev_explanation`.
pub static PREV_EXPLANATION_KEY: StorageKey<Explanation> =
    StorageKey::new("prev_suggested_explanation");
