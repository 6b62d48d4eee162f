//! Tool registry keyed by name, in registration order

use super::{Tool, ToolError};
use crate::error::{ContextError, Result};
use crate::metrics::METRICS;
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// Tool description handed to the model
#[derive(Debug, Clone, Serialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// Result of a tool call
#[derive(Debug, Clone, Serialize)]
pub struct ToolOutput {
    pub tool: String,
    pub content: Value,
    pub duration_ms: u64,
}

/// Registry of the tools available to one assistant
#[derive(Default, Clone)]
pub struct ToolRegistry {
    tools: IndexMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every built-in tool
    pub fn with_builtins() -> Result<Self> {
        let mut registry = Self::new();
        registry.register(Arc::new(super::UuidTool))?;
        registry.register(Arc::new(super::Sha256Tool))?;
        Ok(registry)
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) -> Result<()> {
        let name = tool.name();
        if self.tools.contains_key(name) {
            return Err(ContextError::DuplicateTool(name.to_string()));
        }
        debug!("Registered tool '{}'", name);
        self.tools.insert(name.to_string(), tool);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    pub fn list(&self) -> Vec<&str> {
        self.tools.keys().map(String::as_str).collect()
    }

    pub fn specs(&self) -> Vec<ToolSpec> {
        self.tools
            .values()
            .map(|tool| ToolSpec {
                name: tool.name().to_string(),
                description: tool.description().to_string(),
                parameters: tool.parameter_schema(),
            })
            .collect()
    }

    /// Validate and run the named tool
    pub async fn execute(&self, name: &str, params: Value) -> Result<ToolOutput> {
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| ContextError::ToolNotFound(name.to_string()))?;

        let started = Instant::now();
        let outcome = match tool.validate_input(&params) {
            Ok(()) => tool.execute(params).await,
            Err(e) => Err(e),
        };
        let elapsed = started.elapsed();
        METRICS.record_tool(name, outcome.is_ok(), elapsed);

        match outcome {
            Ok(content) => Ok(ToolOutput {
                tool: name.to_string(),
                content,
                duration_ms: elapsed.as_millis() as u64,
            }),
            Err(e) => {
                warn!("Tool '{}' failed: {}", name, e);
                Err(match e {
                    ToolError::Invalid(reason) => ContextError::InvalidToolParams {
                        tool: name.to_string(),
                        reason,
                    },
                    ToolError::Json(err) => ContextError::InvalidToolParams {
                        tool: name.to_string(),
                        reason: err.to_string(),
                    },
                    ToolError::Exec(msg) => ContextError::Tool(msg),
                })
            }
        }
    }
}
