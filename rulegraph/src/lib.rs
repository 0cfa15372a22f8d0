//! rulegraph: a task-graph agent that diagnoses why a YouTrack automation
//! rule produced an observed behavior.
//!
//! The core is a directed graph of typed processing nodes connected by
//! conditional, transforming edges ([`graph`]), with per-run keyed storage
//! ([`storage`]), a shared LLM iteration budget ([`budget`]), bounded
//! tool-calling subgraphs ([`tool_loop`]), structured-output extraction
//! ([`extract`]) and history compression ([`compress`]). The [`agent`] module
//! composes these into the diagnosis workflow; [`youtrack`] holds the REST
//! collaborator and rendering helpers.

pub mod agent;
pub mod budget;
pub mod compress;
pub mod error;
pub mod events;
pub mod extract;
pub mod graph;
pub mod interact;
pub mod llm;
pub mod message;
pub mod storage;
pub mod tool_loop;
pub mod tools;
pub mod youtrack;

pub use error::AgentError;
pub use message::Message;
