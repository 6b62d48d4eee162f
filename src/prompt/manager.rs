//! Named prompt templates

use super::template::{Template, TemplateError};
use serde_json::Value;
use std::collections::HashMap;
use tracing::debug;

/// Name of the built-in system prompt
pub const SYSTEM_TEMPLATE: &str = "system";

const DEFAULT_SYSTEM_PROMPT: &str = "You are {{assistant_name}}, a command-line assistant.\n\
{{#each rules}}- {{this}}\n{{/each}}";

/// Registry of pre-parsed templates
#[derive(Debug, Clone)]
pub struct PromptManager {
    templates: HashMap<String, Template>,
}

impl PromptManager {
    /// Manager preloaded with the default system prompt
    pub fn new() -> Result<Self, TemplateError> {
        let mut manager = Self::empty();
        manager.register(SYSTEM_TEMPLATE, DEFAULT_SYSTEM_PROMPT)?;
        Ok(manager)
    }

    pub fn empty() -> Self {
        Self {
            templates: HashMap::new(),
        }
    }

    /// Parse and store a template, replacing any previous one with that name
    pub fn register(&mut self, name: &str, source: &str) -> Result<(), TemplateError> {
        let template = Template::parse(source)?;
        debug!("Registered prompt template '{}'", name);
        self.templates.insert(name.to_string(), template);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Template> {
        self.templates.get(name)
    }

    pub fn render(&self, name: &str, context: &Value) -> Result<String, TemplateError> {
        self.templates
            .get(name)
            .ok_or_else(|| TemplateError::UnknownTemplate {
                name: name.to_string(),
            })?
            .render(context)
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.templates.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_system_prompt() {
        let manager = PromptManager::new().unwrap();
        let out = manager
            .render(
                SYSTEM_TEMPLATE,
                &json!({"assistant_name": "Blade", "rules": ["be brief", "cite files"]}),
            )
            .unwrap();
        assert_eq!(
            out,
            "You are Blade, a command-line assistant.\n- be brief\n- cite files\n"
        );
    }

    #[test]
    fn test_register_rejects_malformed_source() {
        let mut manager = PromptManager::empty();
        assert!(manager.register("broken", "{{#each x}}").is_err());
        assert!(manager.get("broken").is_none());
    }

    #[test]
    fn test_unknown_template() {
        let manager = PromptManager::empty();
        assert_eq!(
            manager.render("nope", &json!({})).unwrap_err(),
            TemplateError::UnknownTemplate {
                name: "nope".to_string()
            }
        );
    }
}
