//! Capability sets and the merged dispatch table.
//!
//! N named capability sets are merged into one table at construction; name
//! collisions across sets are a configuration error detected before any run
//! starts. Invocation by unknown name yields a typed `NotFound` error which
//! the tool loop turns into a tool-result error string.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::error::AgentError;

use super::{Tool, ToolError, ToolSpec};

/// A named group of tools exposed to the model together.
#[derive(Clone, Default)]
pub struct CapabilitySet {
    name: String,
    tools: Vec<Arc<dyn Tool>>,
}

impl CapabilitySet {
    /// Creates an empty set named `name` (used in collision diagnostics).
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tools: Vec::new(),
        }
    }

    /// Adds a tool to the set (builder style).
    pub fn with_tool(mut self, tool: Arc<dyn Tool>) -> Self {
        self.tools.push(tool);
        self
    }

    /// Set name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Merged dispatch table: tool name to callable.
///
/// **Interaction**: built once per runtime from capability sets; the tool
/// loop reads [`specs`](Self::specs) for the LLM request and routes the
/// model's calls through [`call`](Self::call).
pub struct ToolDispatch {
    tools: HashMap<String, Arc<dyn Tool>>,
    /// Registration order, preserved for deterministic spec listings.
    order: Vec<String>,
}

impl ToolDispatch {
    /// Merges capability sets into one table.
    ///
    /// A tool name appearing in more than one set (or twice in one set) is a
    /// configuration error naming both sets; nothing is constructed in that
    /// case.
    pub fn merge(sets: Vec<CapabilitySet>) -> Result<Self, AgentError> {
        let mut tools: HashMap<String, Arc<dyn Tool>> = HashMap::new();
        let mut owner: HashMap<String, String> = HashMap::new();
        let mut order = Vec::new();

        for set in sets {
            for tool in set.tools {
                let name = tool.spec().name;
                if let Some(prev) = owner.get(&name) {
                    return Err(AgentError::Configuration(format!(
                        "duplicate tool name '{}' in capability sets '{}' and '{}'",
                        name, prev, set.name
                    )));
                }
                owner.insert(name.clone(), set.name.clone());
                order.push(name.clone());
                tools.insert(name, tool);
            }
        }

        Ok(Self { tools, order })
    }

    /// Tool specifications in registration order.
    pub fn specs(&self) -> Vec<ToolSpec> {
        self.order
            .iter()
            .filter_map(|name| self.tools.get(name).map(|t| t.spec()))
            .collect()
    }

    /// Invokes a tool by name with a JSON argument payload.
    pub async fn call(&self, name: &str, arguments: Value) -> Result<String, ToolError> {
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| ToolError::NotFound(name.to_string()))?;
        debug!(tool = %name, "dispatching tool call");
        tool.call(arguments).await
    }
}
