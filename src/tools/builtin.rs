//! Small built-in tools

use super::{Tool, ToolError};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use sha2::{Digest, Sha256};

const MAX_UUIDS: usize = 100;

/// Generates random v4 UUIDs
pub struct UuidTool;

#[derive(Deserialize)]
struct UuidParams {
    #[serde(default = "default_count")]
    count: usize,
}

fn default_count() -> usize {
    1
}

#[async_trait]
impl Tool for UuidTool {
    fn name(&self) -> &'static str {
        "uuid"
    }

    fn description(&self) -> &'static str {
        "Generate one or more random UUIDs"
    }

    fn parameter_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "count": {"type": "integer", "minimum": 1, "maximum": MAX_UUIDS}
            }
        })
    }

    async fn execute(&self, params: Value) -> Result<Value, ToolError> {
        let params: UuidParams = serde_json::from_value(params)?;
        if params.count == 0 || params.count > MAX_UUIDS {
            return Err(ToolError::Invalid(format!(
                "count must be between 1 and {}",
                MAX_UUIDS
            )));
        }

        let ids: Vec<String> = (0..params.count)
            .map(|_| uuid::Uuid::new_v4().to_string())
            .collect();
        Ok(json!({ "uuids": ids }))
    }
}

/// Hex SHA-256 digest of a text
pub struct Sha256Tool;

#[derive(Deserialize)]
struct Sha256Params {
    text: String,
}

#[async_trait]
impl Tool for Sha256Tool {
    fn name(&self) -> &'static str {
        "sha256"
    }

    fn description(&self) -> &'static str {
        "Compute the SHA-256 digest of a text"
    }

    fn parameter_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "text": {"type": "string"}
            },
            "required": ["text"]
        })
    }

    async fn execute(&self, params: Value) -> Result<Value, ToolError> {
        let params: Sha256Params = serde_json::from_value(params)?;
        let digest = Sha256::digest(params.text.as_bytes());
        Ok(json!({ "digest": hex::encode(digest) }))
    }
}
