//! Tool registry and dispatch.
//!
//! Tools are registered once at startup. Whether a tool contributes
//! structured citation sources is part of its registration-time
//! capability tag, never probed per call.

mod search;

pub use search::TavilySearch;

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::agent::sources::Source;
use crate::llm::ToolSchema;

/// What a tool contributes beyond its textual result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolCapability {
    /// Text-only result
    Plain,
    /// Result also carries structured citation sources
    SourceProducing,
}

/// Result of one tool dispatch.
#[derive(Debug, Clone, Default)]
pub struct ToolOutput {
    /// Textual result fed back to the model as the tool-result message
    pub text: String,

    /// Structured sources captured from the result. Ignored for tools
    /// registered as [`ToolCapability::Plain`].
    pub sources: Vec<Source>,
}

impl ToolOutput {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            sources: Vec::new(),
        }
    }
}

/// A capability the agent can invoke during tool execution.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// JSON schema of the tool's arguments object.
    fn parameters_schema(&self) -> Value;

    /// Declared once; recorded by the registry at registration.
    fn capability(&self) -> ToolCapability {
        ToolCapability::Plain
    }

    async fn execute(&self, args: Value) -> anyhow::Result<ToolOutput>;
}

/// A tool together with its capability, resolved at registration.
pub struct RegisteredTool {
    pub tool: Arc<dyn Tool>,
    pub capability: ToolCapability,
}

/// Ordered set of registered tools. Registration order is preserved and
/// is the order tool descriptors are presented to the model.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<RegisteredTool>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let capability = tool.capability();
        self.tools.push(RegisteredTool { tool, capability });
    }

    /// Look up a tool by name.
    pub fn get(&self, name: &str) -> Option<&RegisteredTool> {
        self.tools.iter().find(|entry| entry.tool.name() == name)
    }

    /// Descriptors for every registered tool, in registration order.
    pub fn tool_schemas(&self) -> Vec<ToolSchema> {
        self.tools
            .iter()
            .map(|entry| {
                ToolSchema::function(
                    entry.tool.name(),
                    entry.tool.description(),
                    entry.tool.parameters_schema(),
                )
            })
            .collect()
    }
}
