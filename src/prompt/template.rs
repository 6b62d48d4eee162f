//! Prompt templates parsed into a small AST
//!
//! Supported syntax: `{{name}}`, dotted paths `{{user.name}}`, loops
//! `{{#each items}}...{{/each}}` and `{{this}}` for the current loop item.

use serde_json::Value;
use thiserror::Error;

/// Maximum depth of nested `#each` blocks
pub const MAX_NESTING: usize = 8;

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

/// Template parse and render failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("unclosed tag at byte {position}")]
    UnclosedTag { position: usize },

    #[error("empty tag at byte {position}")]
    EmptyTag { position: usize },

    #[error("unknown directive '{tag}' at byte {position}")]
    UnknownDirective { tag: String, position: usize },

    #[error("'{{{{/each}}}}' without an open loop at byte {position}")]
    UnexpectedLoopEnd { position: usize },

    #[error("loop over '{name}' is never closed")]
    UnclosedLoop { name: String },

    #[error("loops nested deeper than {limit}")]
    NestingTooDeep { limit: usize },

    #[error("missing variable '{name}'")]
    MissingVariable { name: String },

    #[error("'{name}' is not a list")]
    NotAList { name: String },

    #[error("unknown template '{name}'")]
    UnknownTemplate { name: String },
}

/// Template syntax tree node
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Text(String),
    Variable(String),
    Each { list: String, body: Vec<Node> },
}

/// A parsed template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    nodes: Vec<Node>,
}

impl Template {
    pub fn parse(source: &str) -> Result<Self, TemplateError> {
        let mut root = Vec::new();
        let mut loops: Vec<(String, Vec<Node>)> = Vec::new();
        let mut rest = source;
        let mut offset = 0;

        while let Some(start) = rest.find(OPEN) {
            let position = offset + start;
            if start > 0 {
                current(&mut root, &mut loops).push(Node::Text(rest[..start].to_string()));
            }

            let after = &rest[start + OPEN.len()..];
            let end = after
                .find(CLOSE)
                .ok_or(TemplateError::UnclosedTag { position })?;
            let tag = after[..end].trim();

            if tag.is_empty() {
                return Err(TemplateError::EmptyTag { position });
            } else if let Some(list) = tag
                .strip_prefix("#each")
                .filter(|rest| rest.is_empty() || rest.starts_with(char::is_whitespace))
            {
                let list = list.trim();
                if list.is_empty() {
                    return Err(TemplateError::EmptyTag { position });
                }
                if loops.len() >= MAX_NESTING {
                    return Err(TemplateError::NestingTooDeep { limit: MAX_NESTING });
                }
                loops.push((list.to_string(), Vec::new()));
            } else if tag == "/each" {
                let (list, body) = loops
                    .pop()
                    .ok_or(TemplateError::UnexpectedLoopEnd { position })?;
                current(&mut root, &mut loops).push(Node::Each { list, body });
            } else if tag.starts_with('#') || tag.starts_with('/') {
                return Err(TemplateError::UnknownDirective {
                    tag: tag.to_string(),
                    position,
                });
            } else {
                current(&mut root, &mut loops).push(Node::Variable(tag.to_string()));
            }

            let consumed = start + OPEN.len() + end + CLOSE.len();
            offset += consumed;
            rest = &rest[consumed..];
        }

        if !rest.is_empty() {
            current(&mut root, &mut loops).push(Node::Text(rest.to_string()));
        }
        if let Some((name, _)) = loops.pop() {
            return Err(TemplateError::UnclosedLoop { name });
        }

        Ok(Self { nodes: root })
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Render against a JSON context object
    pub fn render(&self, context: &Value) -> Result<String, TemplateError> {
        let mut out = String::new();
        let mut scopes = vec![context];
        render_nodes(&self.nodes, &mut scopes, &mut out)?;
        Ok(out)
    }
}

fn current<'a>(root: &'a mut Vec<Node>, loops: &'a mut [(String, Vec<Node>)]) -> &'a mut Vec<Node> {
    match loops.last_mut() {
        Some((_, body)) => body,
        None => root,
    }
}

fn render_nodes<'v>(
    nodes: &[Node],
    scopes: &mut Vec<&'v Value>,
    out: &mut String,
) -> Result<(), TemplateError> {
    for node in nodes {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::Variable(path) => {
                let value = lookup(scopes, path).ok_or_else(|| TemplateError::MissingVariable {
                    name: path.clone(),
                })?;
                write_value(value, out);
            }
            Node::Each { list, body } => {
                let value = lookup(scopes, list).ok_or_else(|| TemplateError::MissingVariable {
                    name: list.clone(),
                })?;
                let items = value
                    .as_array()
                    .ok_or_else(|| TemplateError::NotAList { name: list.clone() })?;
                for item in items {
                    scopes.push(item);
                    let rendered = render_nodes(body, scopes, out);
                    scopes.pop();
                    rendered?;
                }
            }
        }
    }
    Ok(())
}

/// Resolve a dotted path, innermost scope first
fn lookup<'v>(scopes: &[&'v Value], path: &str) -> Option<&'v Value> {
    let mut segments = path.split('.');
    let first = segments.next()?;
    let mut value = if first == "this" {
        scopes.last().copied()?
    } else {
        scopes.iter().rev().copied().find_map(|scope| scope.get(first))?
    };
    for segment in segments {
        value = value.get(segment)?;
    }
    Some(value)
}

fn write_value(value: &Value, out: &mut String) {
    match value {
        Value::Null => {}
        Value::String(s) => out.push_str(s),
        other => out.push_str(&other.to_string()),
    }
}
