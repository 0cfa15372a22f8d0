//! Global LLM iteration budget for one run.
//!
//! One counter is shared across every component that issues a model request
//! (tool loops, the extractor, the compressor). Each request charges the
//! budget up front; exhaustion is a distinct fatal failure, never a silent
//! truncation.

use std::sync::atomic::{AtomicU32, Ordering};

use crate::error::AgentError;

/// Shared per-run ceiling on LLM requests.
///
/// **Interaction**: owned by [`crate::graph::RunContext`]; charged via
/// [`try_charge`](Self::try_charge) before every `LlmClient::invoke`.
#[derive(Debug)]
pub struct IterationBudget {
    limit: u32,
    used: AtomicU32,
}

impl IterationBudget {
    /// Creates a budget allowing up to `limit` LLM requests.
    pub fn new(limit: u32) -> Self {
        Self {
            limit,
            used: AtomicU32::new(0),
        }
    }

    /// Charges one LLM request against the budget.
    ///
    /// Returns `BudgetExceeded` once `limit` requests have already been
    /// charged; the request must not be issued in that case.
    pub fn try_charge(&self) -> Result<(), AgentError> {
        let prev = self.used.fetch_add(1, Ordering::SeqCst);
        if prev >= self.limit {
            return Err(AgentError::BudgetExceeded { limit: self.limit });
        }
        Ok(())
    }

    /// Requests charged so far (including the failed charge, if any).
    pub fn used(&self) -> u32 {
        self.used.load(Ordering::SeqCst)
    }

    /// Configured ceiling.
    pub fn limit(&self) -> u32 {
        self.limit
    }
}
