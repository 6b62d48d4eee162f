//! Prompt templating

pub mod manager;
pub mod template;

pub use manager::{PromptManager, SYSTEM_TEMPLATE};
pub use template::{Node, Template, TemplateError, MAX_NESTING};
