//! Error types for the context engine

use crate::prompt::TemplateError;
use thiserror::Error;

/// Result type alias for context engine operations
pub type Result<T> = std::result::Result<T, ContextError>;

/// Errors surfaced by the context engine and its collaborator seams
#[derive(Debug, Error)]
pub enum ContextError {
    /// Invalid or unreadable configuration
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("Session limit reached: {max} sessions")]
    SessionLimit { max: usize },

    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    #[error("Tool already registered: {0}")]
    DuplicateTool(String),

    #[error("Invalid parameters for tool {tool}: {reason}")]
    InvalidToolParams { tool: String, reason: String },

    /// Tool execution failure
    #[error("Tool error: {0}")]
    Tool(String),

    #[error("Template error: {0}")]
    Template(#[from] TemplateError),

    /// Chat model failure reported by a collaborator
    #[error("Model error: {0}")]
    Model(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<config::ConfigError> for ContextError {
    fn from(err: config::ConfigError) -> Self {
        ContextError::Configuration(err.to_string())
    }
}
