//! Data models for context compression

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;

/// Strategy identifier reported when a compression pass ran
pub const STRATEGY_IMPORTANCE_RETENTION: &str = "importance-retention";

/// Strategy identifier reported for the below-threshold no-op
pub const STRATEGY_NONE: &str = "none";

/// Conversation role
///
/// `Other` carries roles outside the fixed set so that foreign input can be
/// scored without failing; it never receives the system bonus.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Role {
    System,
    User,
    Assistant,
    Other(String),
}

impl Role {
    pub fn as_str(&self) -> &str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Other(name) => name,
        }
    }

    pub fn is_system(&self) -> bool {
        matches!(self, Role::System)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for Role {
    fn from(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "system" => Role::System,
            "user" => Role::User,
            "assistant" => Role::Assistant,
            _ => Role::Other(value.to_string()),
        }
    }
}

impl Serialize for Role {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Role::from(raw.as_str()))
    }
}

/// Per-message metadata
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    /// Set only on synthesized summary messages
    #[serde(default)]
    pub compressed: bool,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub extra: HashMap<String, String>,
}

/// A single conversation turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    /// Position in the unbounded session history; `None` for synthesized summaries
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequence_index: Option<u64>,
    #[serde(default)]
    pub metadata: MessageMetadata,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>, sequence_index: u64) -> Self {
        Self {
            role,
            content: content.into(),
            sequence_index: Some(sequence_index),
            metadata: MessageMetadata::default(),
        }
    }

    pub fn system(content: impl Into<String>, sequence_index: u64) -> Self {
        Self::new(Role::System, content, sequence_index)
    }

    pub fn user(content: impl Into<String>, sequence_index: u64) -> Self {
        Self::new(Role::User, content, sequence_index)
    }

    pub fn assistant(content: impl Into<String>, sequence_index: u64) -> Self {
        Self::new(Role::Assistant, content, sequence_index)
    }

    /// Build a synthesized summary message
    ///
    /// Carries no original position and no timestamp, so repeated passes over
    /// the same history produce identical output.
    pub fn summary(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
            sequence_index: None,
            metadata: MessageMetadata {
                timestamp: None,
                compressed: true,
                extra: HashMap::new(),
            },
        }
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.metadata.timestamp = Some(timestamp);
        self
    }

    pub fn is_summary(&self) -> bool {
        self.metadata.compressed
    }
}

/// Caller-supplied retention configuration, immutable for one compression call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetentionRules {
    /// Most recent messages always retained verbatim
    pub keep_recent_messages: usize,
    /// Pin every system message
    pub keep_system_messages: bool,
    /// Additionally retain the top fraction of messages by importance
    pub keep_important_messages: bool,
}

impl Default for RetentionRules {
    fn default() -> Self {
        Self {
            keep_recent_messages: 10,
            keep_system_messages: true,
            keep_important_messages: true,
        }
    }
}

/// Reason tag attached to an importance score
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScoreReason {
    Recent,
    Detailed,
    Brief,
    Keyword,
    QaPair,
    Code,
}

impl ScoreReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScoreReason::Recent => "recent",
            ScoreReason::Detailed => "detailed",
            ScoreReason::Brief => "brief",
            ScoreReason::Keyword => "keyword",
            ScoreReason::QaPair => "qa-pair",
            ScoreReason::Code => "code",
        }
    }
}

/// Importance of one message within one compression pass
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportanceScore {
    /// Position of the scored message in the history slice
    pub index: usize,
    pub score: f64,
    pub reasons: BTreeSet<ScoreReason>,
}

impl ImportanceScore {
    pub fn has_reason(&self, reason: ScoreReason) -> bool {
        self.reasons.contains(&reason)
    }
}

/// Outcome of one compression pass
#[derive(Debug, Clone, Serialize)]
pub struct CompressionResult {
    pub original_messages: Vec<Message>,
    pub compressed_messages: Vec<Message>,
    /// compressed count / original count
    pub compression_ratio: f64,
    pub preserved_messages: usize,
    pub removed_messages: usize,
    pub compression_strategy: String,
    pub summary: Option<String>,
    pub original_tokens: usize,
    pub compressed_tokens: usize,
}

impl CompressionResult {
    /// Whether the pass actually dropped anything
    pub fn is_compressed(&self) -> bool {
        self.removed_messages > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trip_and_unknown() {
        let role: Role = serde_json::from_str("\"Assistant\"").unwrap();
        assert_eq!(role, Role::Assistant);

        let role: Role = serde_json::from_str("\"tool\"").unwrap();
        assert_eq!(role, Role::Other("tool".to_string()));
        assert_eq!(serde_json::to_string(&role).unwrap(), "\"tool\"");
        assert!(!role.is_system());
    }

    #[test]
    fn test_summary_message_flags() {
        let msg = Message::summary("[Context Summary] User asked 1 questions");
        assert!(msg.is_summary());
        assert!(msg.role.is_system());
        assert!(msg.sequence_index.is_none());
        assert!(msg.metadata.timestamp.is_none());
    }

    #[test]
    fn test_message_serialization_skips_empty_fields() {
        let msg = Message::user("hi", 3);
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["role"], "user");
        assert_eq!(json["sequence_index"], 3);
        assert!(json["metadata"].get("extra").is_none());
    }

    #[test]
    fn test_default_rules() {
        let rules = RetentionRules::default();
        assert_eq!(rules.keep_recent_messages, 10);
        assert!(rules.keep_system_messages);
        assert!(rules.keep_important_messages);
    }
}
