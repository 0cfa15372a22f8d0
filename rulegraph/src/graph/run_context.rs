//! Per-run context: shared storage, message history, iteration budget.
//!
//! One `RunContext` is owned exclusively by one run and discarded at run
//! completion; independent runs never share state, so the interior locks
//! only make the sequential mutation pattern compile.

use std::sync::Mutex;

use crate::budget::IterationBudget;
use crate::error::AgentError;
use crate::events::{EventSink, RunEvent};
use crate::message::Message;
use crate::storage::SharedStorage;

/// State carried across all nodes of one run.
///
/// **Interaction**: passed by reference into every [`super::Node::run`] and
/// edge transform; the tool loop, extractor, and compressor read and mutate
/// the history and charge the budget through it.
pub struct RunContext {
    storage: SharedStorage,
    history: Mutex<Vec<Message>>,
    budget: IterationBudget,
    events: Option<EventSink>,
}

impl RunContext {
    /// Creates a context with empty storage and history and no event sink.
    pub fn new(budget: IterationBudget) -> Self {
        Self {
            storage: SharedStorage::new(),
            history: Mutex::new(Vec::new()),
            budget,
            events: None,
        }
    }

    /// Installs a sink that receives [`RunEvent`]s as the run progresses.
    pub fn with_event_sink(mut self, sink: EventSink) -> Self {
        self.events = Some(sink);
        self
    }

    /// Delivers an event to the installed sink, if any.
    pub fn emit(&self, event: RunEvent) {
        if let Some(sink) = &self.events {
            sink(&event);
        }
    }

    /// Per-run keyed storage.
    pub fn storage(&self) -> &SharedStorage {
        &self.storage
    }

    /// Shared LLM request budget.
    pub fn budget(&self) -> &IterationBudget {
        &self.budget
    }

    /// Snapshot of the current message history.
    pub fn history(&self) -> Result<Vec<Message>, AgentError> {
        Ok(self.lock_history()?.clone())
    }

    /// Appends one message to the history.
    pub fn push_message(&self, message: Message) -> Result<(), AgentError> {
        self.lock_history()?.push(message);
        Ok(())
    }

    /// Replaces the entire history (used by history compression).
    pub fn replace_history(&self, messages: Vec<Message>) -> Result<(), AgentError> {
        *self.lock_history()? = messages;
        Ok(())
    }

    fn lock_history(&self) -> Result<std::sync::MutexGuard<'_, Vec<Message>>, AgentError> {
        self.history
            .lock()
            .map_err(|_| AgentError::ExecutionFailed("message history lock poisoned".into()))
    }
}
