//! Template-based summarization of discarded conversation turns
//!
//! Summaries are built locally from counts and a fixed topic table, so a
//! compression pass never waits on a model call.

use super::models::{Message, Role};

/// Prefix marking a synthesized summary
pub const SUMMARY_PREFIX: &str = "[Context Summary] ";

const MAX_TOPICS: usize = 3;

/// Topic label and its keywords, checked in table order
const TOPIC_TABLE: &[(&str, &[&str])] = &[
    (
        "code development",
        &["code", "function", "programming", "代码", "函数", "编程"],
    ),
    (
        "problem solving",
        &["problem", "error", "bug", "issue", "问题", "错误", "解决"],
    ),
    ("configuration", &["config", "setting", "setup", "配置", "设置"]),
    ("documentation", &["document", "readme", "docs", "文档", "说明"]),
    ("testing", &["test", "assert", "测试", "单元"]),
    ("performance", &["performance", "optimi", "slow", "性能", "优化"]),
];

/// Turns a discarded set into a single summary text
pub trait Summarizer: Send + Sync {
    /// `None` when there is nothing worth summarizing
    fn summarize(&self, discarded: &[&Message]) -> Option<String>;
}

/// Deterministic summarizer driven by role counts and topic keywords
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateSummarizer;

impl TemplateSummarizer {
    pub fn new() -> Self {
        Self
    }

    /// Topics mentioned anywhere in the given user text, in table order
    pub fn extract_topics(&self, user_text: &str) -> Vec<&'static str> {
        let lowered = user_text.to_lowercase();
        TOPIC_TABLE
            .iter()
            .filter(|(_, keywords)| keywords.iter().any(|k| lowered.contains(k)))
            .map(|(topic, _)| *topic)
            .take(MAX_TOPICS)
            .collect()
    }
}

impl Summarizer for TemplateSummarizer {
    fn summarize(&self, discarded: &[&Message]) -> Option<String> {
        let user_messages: Vec<&str> = discarded
            .iter()
            .filter(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
            .collect();
        let assistant_count = discarded
            .iter()
            .filter(|m| m.role == Role::Assistant)
            .count();

        let mut clauses = Vec::new();

        if !user_messages.is_empty() {
            clauses.push(format!("User asked {} questions", user_messages.len()));

            let topics = self.extract_topics(&user_messages.join(" "));
            if !topics.is_empty() {
                clauses.push(format!("Mainly concerning: {}", topics.join(", ")));
            }
        }

        if assistant_count > 0 {
            clauses.push(format!("Assistant provided {} answers", assistant_count));
        }

        if clauses.is_empty() {
            return None;
        }

        Some(format!("{}{}", SUMMARY_PREFIX, clauses.join(", ")))
    }
}
