//! Tool registry.
//!
//! Tools are registered once at startup and looked up by name afterwards.
//! The input schema of each tool is built when it is registered so that an
//! invalid parameter list is rejected before the server starts serving.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;
use trackbridge_core::tool::{input_schema, missing_arguments};
use trackbridge_core::{Error, Result, Tool, ToolResult};

use crate::protocol::ToolDefinition;

struct Entry {
    tool: Arc<dyn Tool>,
    definition: ToolDefinition,
}

/// Registered tools keyed by name, enumerated in name order.
#[derive(Default)]
pub struct ToolRegistry {
    tools: BTreeMap<String, Entry>,
}

impl ToolRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool.
    ///
    /// Fails if a tool with the same name exists or if the tool's parameters
    /// do not form a valid schema.
    pub fn register(&mut self, tool: Arc<dyn Tool>) -> Result<()> {
        let name = tool.name().to_string();
        if self.tools.contains_key(&name) {
            return Err(Error::DuplicateTool(name));
        }

        let definition = ToolDefinition {
            name: name.clone(),
            description: tool.description().to_string(),
            input_schema: input_schema(&name, &tool.parameters())?,
        };

        tracing::debug!("Registered tool: {}", name);
        self.tools.insert(name, Entry { tool, definition });
        Ok(())
    }

    /// Look up a tool by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).map(|entry| Arc::clone(&entry.tool))
    }

    /// Registered tool names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Descriptors of every registered tool, sorted by name.
    pub fn schema_list(&self) -> Vec<ToolDefinition> {
        self.tools
            .values()
            .map(|entry| entry.definition.clone())
            .collect()
    }

    /// Run a tool body. Panics raised by the body are not caught here.
    pub async fn execute(&self, tool: &dyn Tool, arguments: Value) -> ToolResult {
        tool.execute(arguments).await
    }

    /// Look up, validate and execute a tool.
    ///
    /// An unknown name or missing required arguments produce a failure
    /// result, never an error.
    pub async fn invoke(&self, name: &str, arguments: Value) -> ToolResult {
        let Some(tool) = self.get(name) else {
            tracing::warn!("Unknown tool: {}", name);
            return ToolResult::failure(format!("Unknown tool: {}", name));
        };

        if !tool.validate_arguments(&arguments) {
            let missing = missing_arguments(&tool.parameters(), &arguments);
            tracing::debug!("Tool {} called without {:?}", name, missing);
            return ToolResult::failure(if missing.is_empty() {
                format!("Invalid arguments for tool {}", name)
            } else {
                format!(
                    "Missing required parameter(s) for tool {}: {}",
                    name,
                    missing.join(", ")
                )
            });
        }

        self.execute(tool.as_ref(), arguments).await
    }
}
