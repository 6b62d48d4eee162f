//! Blade context engine
//!
//! Keeps long assistant conversations inside a bounded context window.
//! Each turn the session's history is checked against message and token
//! thresholds; over threshold, messages are scored for importance, a
//! retained set is planned (pinned system messages, the recent tail and the
//! top-scoring share), and everything else is folded into one template
//! summary spliced back into the list sent to the model.

pub mod config;
pub mod context;
pub mod error;
pub mod llm;
pub mod logging;
pub mod metrics;
pub mod prompt;
pub mod session;
pub mod tools;

pub use config::Config;
pub use error::{ContextError, Result};

/// Commonly used types
pub mod prelude {
    pub use crate::config::{CompressionConfig, Config, LoggingConfig, SessionConfig};
    pub use crate::context::{
        CompressionResult, ContextWindowManager, ImportanceScore, ImportanceScorer, Message,
        RetentionPlanner, RetentionRules, Role, Summarizer, TemplateSummarizer, TokenEstimator,
    };
    pub use crate::error::{ContextError, Result};
    pub use crate::llm::{ChatModel, ModelCache, ModelKey};
    pub use crate::prompt::{PromptManager, Template, TemplateError};
    pub use crate::session::{Session, SessionStore};
    pub use crate::tools::{Tool, ToolRegistry};
}
