//! Tool abstractions exposed to the assistant

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

pub mod builtin;
pub mod registry;

pub use builtin::{Sha256Tool, UuidTool};
pub use registry::{ToolOutput, ToolRegistry, ToolSpec};

/// Tool execution errors
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("Execution error: {0}")]
    Exec(String),

    #[error("Invalid input: {0}")]
    Invalid(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A capability the assistant can call by name
#[async_trait]
pub trait Tool: Send + Sync {
    /// Tool name (must be unique within a registry)
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    /// JSON Schema of the parameter object
    fn parameter_schema(&self) -> Value;

    /// Execute the tool with validated parameters
    async fn execute(&self, params: Value) -> Result<Value, ToolError>;

    /// Check the parameters against the schema's `required` list
    fn validate_input(&self, params: &Value) -> Result<(), ToolError> {
        let object = params
            .as_object()
            .ok_or_else(|| ToolError::Invalid("parameters must be a JSON object".to_string()))?;

        let schema = self.parameter_schema();
        let required = schema
            .get("required")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();

        for field in required.iter().filter_map(Value::as_str) {
            if !object.contains_key(field) {
                return Err(ToolError::Invalid(format!("missing required field '{}'", field)));
            }
        }
        Ok(())
    }
}
