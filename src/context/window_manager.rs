//! Context window manager
//!
//! Decides when a history needs compressing, runs the retention planner,
//! folds the discarded turns into a summary and splices it back so callers
//! always get one linear message list.

use super::models::{
    CompressionResult, Message, RetentionRules, STRATEGY_IMPORTANCE_RETENTION, STRATEGY_NONE,
};
use super::planner::RetentionPlanner;
use super::summarizer::{Summarizer, TemplateSummarizer};
use super::token_estimator::{TiktokenEstimator, TokenEstimator, WordBasedEstimator};
use crate::config::CompressionConfig;
use crate::error::Result;
use crate::metrics::METRICS;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Compresses conversation histories for the next model call
pub struct ContextWindowManager {
    config: CompressionConfig,
    planner: RetentionPlanner,
    summarizer: Arc<dyn Summarizer>,
    estimator: Arc<dyn TokenEstimator>,
}

impl ContextWindowManager {
    /// Create a manager with the template summarizer and cl100k token counting,
    /// falling back to word-based estimation when the encoder cannot be loaded
    pub fn new(config: CompressionConfig) -> Result<Self> {
        config.validate()?;
        let estimator: Arc<dyn TokenEstimator> = match TiktokenEstimator::new() {
            Ok(tiktoken) => Arc::new(tiktoken),
            Err(e) => {
                warn!("{}; using word-based token estimation", e);
                Arc::new(WordBasedEstimator::default())
            }
        };
        Ok(Self {
            config,
            planner: RetentionPlanner::default(),
            summarizer: Arc::new(TemplateSummarizer::new()),
            estimator,
        })
    }

    pub fn with_summarizer(mut self, summarizer: Arc<dyn Summarizer>) -> Self {
        self.summarizer = summarizer;
        self
    }

    pub fn with_estimator(mut self, estimator: Arc<dyn TokenEstimator>) -> Self {
        self.estimator = estimator;
        self
    }

    pub fn config(&self) -> &CompressionConfig {
        &self.config
    }

    /// Token count of `history` under the installed estimator
    pub fn estimate_tokens(&self, history: &[Message]) -> usize {
        self.estimator.estimate_messages(history)
    }

    /// Whether `history` is over the configured message or token threshold
    pub fn needs_compression(&self, history: &[Message]) -> bool {
        if history.len() > self.config.max_messages {
            return true;
        }
        self.estimate_tokens(history) > self.config.max_tokens
    }

    /// Per-turn entry point: compact with the configured rules when over threshold
    pub fn prepare(&self, history: &[Message]) -> Vec<Message> {
        if !self.needs_compression(history) {
            debug!("History of {} messages within thresholds", history.len());
            return history.to_vec();
        }
        let rules = self.config.rules();
        if history.len() <= rules.keep_recent_messages {
            warn!(
                "History of {} messages is over the token budget but within keep_recent_messages {}; sending it unchanged",
                history.len(),
                rules.keep_recent_messages
            );
            return history.to_vec();
        }
        self.compact(history, &rules)
    }

    /// Compacted message list only
    pub fn compact(&self, history: &[Message], rules: &RetentionRules) -> Vec<Message> {
        self.compress(history, rules).compressed_messages
    }

    /// Run one compression pass over `history`
    ///
    /// Below the recency floor the history is returned unchanged. The input
    /// is never modified.
    pub fn compress(&self, history: &[Message], rules: &RetentionRules) -> CompressionResult {
        let original_tokens = self.estimator.estimate_messages(history);

        if history.len() <= rules.keep_recent_messages {
            debug!(
                "Skipping compression: {} messages <= keep_recent_messages {}",
                history.len(),
                rules.keep_recent_messages
            );
            METRICS.record_noop();
            return CompressionResult {
                original_messages: history.to_vec(),
                compressed_messages: history.to_vec(),
                compression_ratio: 1.0,
                preserved_messages: history.len(),
                removed_messages: 0,
                compression_strategy: STRATEGY_NONE.to_string(),
                summary: None,
                original_tokens,
                compressed_tokens: original_tokens,
            };
        }

        let started = Instant::now();
        let plan = self.planner.plan_indices(history, rules);
        let mut compressed = plan.retained_messages(history);

        let summary = if plan.discarded.is_empty() {
            None
        } else {
            self.summarizer
                .summarize(&plan.discarded_messages(history))
        };

        if let Some(text) = &summary {
            splice_summary(&mut compressed, Message::summary(text.clone()));
        }

        let compression_ratio = compressed.len() as f64 / history.len() as f64;
        let compressed_tokens = self.estimator.estimate_messages(&compressed);

        METRICS.record_compression(
            plan.discarded.len(),
            compression_ratio,
            summary.is_some(),
            started.elapsed(),
        );
        info!(
            "Compressed history: {} -> {} messages ({} removed, ~{} -> ~{} tokens)",
            history.len(),
            compressed.len(),
            plan.discarded.len(),
            original_tokens,
            compressed_tokens
        );

        CompressionResult {
            original_messages: history.to_vec(),
            compressed_messages: compressed,
            compression_ratio,
            preserved_messages: plan.retained.len(),
            removed_messages: plan.discarded.len(),
            compression_strategy: STRATEGY_IMPORTANCE_RETENTION.to_string(),
            summary,
            original_tokens,
            compressed_tokens,
        }
    }
}

/// Insert `summary` before the first non-system message, or at the end
///
/// Non-contiguous pinned system messages can end up on both sides of the
/// summary; their relative order is never changed.
fn splice_summary(retained: &mut Vec<Message>, summary: Message) {
    let position = retained
        .iter()
        .position(|m| !m.role.is_system())
        .unwrap_or(retained.len());
    retained.insert(position, summary);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::models::Role;

    fn manager() -> ContextWindowManager {
        ContextWindowManager::new(CompressionConfig::default()).unwrap()
    }

    fn rules(keep_recent: usize, system: bool, important: bool) -> RetentionRules {
        RetentionRules {
            keep_recent_messages: keep_recent,
            keep_system_messages: system,
            keep_important_messages: important,
        }
    }

    fn sample_history() -> Vec<Message> {
        vec![
            Message::system("You are helpful", 0),
            Message::user("hi", 1),
            Message::assistant("hello", 2),
            Message::user("what is 2+2?", 3),
            Message::assistant("4", 4),
        ]
    }

    #[test]
    fn test_example_conversation() {
        let history = sample_history();
        let result = manager().compress(&history, &rules(2, true, false));

        let out = &result.compressed_messages;
        assert_eq!(out.len(), 4);
        assert_eq!(out[0], history[0]);
        assert!(out[1].is_summary());
        assert_eq!(
            out[1].content,
            "[Context Summary] User asked 1 questions, Assistant provided 1 answers"
        );
        assert_eq!(out[2], history[3]);
        assert_eq!(out[3], history[4]);

        assert_eq!(result.preserved_messages, 3);
        assert_eq!(result.removed_messages, 2);
        assert!((result.compression_ratio - 0.8).abs() < 1e-9);
        assert_eq!(result.compression_strategy, STRATEGY_IMPORTANCE_RETENTION);
    }

    #[test]
    fn test_noop_below_floor() {
        let history = &sample_history()[..3];
        let result = manager().compress(history, &rules(5, true, true));
        assert_eq!(result.compressed_messages, history.to_vec());
        assert_eq!(result.compression_strategy, STRATEGY_NONE);
        assert!(!result.is_compressed());
    }

    #[test]
    fn test_summary_appended_when_only_system_retained() {
        let history = vec![
            Message::system("rules", 0),
            Message::user("hi", 1),
            Message::assistant("hello", 2),
        ];
        let out = manager().compact(&history, &rules(0, true, false));
        assert_eq!(out.len(), 2);
        assert_eq!(out[0], history[0]);
        assert!(out[1].is_summary());
    }

    #[test]
    fn test_everything_replaced_by_summary() {
        let history = sample_history()[1..].to_vec();
        let out = manager().compact(&history, &rules(0, false, false));
        assert_eq!(out.len(), 1);
        assert!(out[0].is_summary());
        assert!(out[0].content.contains("User asked 2 questions"));
    }

    #[test]
    fn test_summary_between_non_contiguous_system_messages() {
        let history = vec![
            Message::system("first rules", 0),
            Message::user("hi", 1),
            Message::system("second rules", 2),
            Message::user("more", 3),
            Message::assistant("done", 4),
        ];
        let out = manager().compact(&history, &rules(1, true, false));
        let roles: Vec<(Role, bool)> = out.iter().map(|m| (m.role.clone(), m.is_summary())).collect();
        assert_eq!(
            roles,
            vec![
                (Role::System, false),
                (Role::System, false),
                (Role::System, true),
                (Role::Assistant, false),
            ]
        );
    }

    #[test]
    fn test_system_only_discard_skips_summary() {
        let history = vec![
            Message::system("old rules", 0),
            Message::user("latest", 1),
        ];
        let result = manager().compress(&history, &rules(1, false, false));
        assert_eq!(result.compressed_messages, vec![history[1].clone()]);
        assert!(result.summary.is_none());
        assert_eq!(result.removed_messages, 1);
    }

    #[test]
    fn test_identical_content_is_distinct() {
        let history = vec![
            Message::user("same", 0),
            Message::user("same", 1),
            Message::user("same", 2),
        ];
        let result = manager().compress(&history, &rules(1, false, false));
        assert_eq!(result.removed_messages, 2);
        assert_eq!(result.compressed_messages[1].sequence_index, Some(2));
        assert!(result.compressed_messages[0].content.contains("User asked 2 questions"));
    }

    #[test]
    fn test_needs_compression_thresholds() {
        let config = CompressionConfig {
            max_messages: 4,
            max_tokens: 1000,
            keep_recent_messages: 2,
            ..CompressionConfig::default()
        };
        let manager = ContextWindowManager::new(config).unwrap();
        assert!(manager.needs_compression(&sample_history()));
        assert!(!manager.needs_compression(&sample_history()[..4]));

        let long = vec![Message::user("word ".repeat(2000), 0)];
        assert!(manager.needs_compression(&long));
    }

    #[test]
    fn test_prepare_uses_configured_rules() {
        let config = CompressionConfig {
            max_messages: 4,
            keep_recent_messages: 2,
            keep_important_messages: false,
            ..CompressionConfig::default()
        };
        let manager = ContextWindowManager::new(config).unwrap();
        let history = sample_history();
        assert_eq!(manager.prepare(&history).len(), 4);
        assert_eq!(manager.prepare(&history[..4]), history[..4].to_vec());
    }

    #[test]
    fn test_default_manager_counts_with_cl100k() {
        let history = vec![Message::user("Hello, world! This is a test.", 0)];
        let cl100k = TiktokenEstimator::new().unwrap().estimate_messages(&history);
        let words = WordBasedEstimator::default().estimate_messages(&history);
        assert_ne!(cl100k, words);
        assert_eq!(manager().estimate_tokens(&history), cl100k);
    }

    #[test]
    fn test_with_estimator_overrides_default() {
        let history = vec![Message::user("one two three", 0)];
        let manager = manager().with_estimator(Arc::new(WordBasedEstimator::new(1.0)));
        assert_eq!(manager.estimate_tokens(&history), 3 + 4);
    }

    #[test]
    fn test_prepare_over_token_budget_within_recent_floor() {
        let config = CompressionConfig {
            max_tokens: 10,
            keep_recent_messages: 10,
            ..CompressionConfig::default()
        };
        let manager = ContextWindowManager::new(config).unwrap();
        let history: Vec<Message> = (0..3)
            .map(|i| Message::user("word ".repeat(100), i))
            .collect();
        assert!(manager.needs_compression(&history));
        assert_eq!(manager.prepare(&history), history);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = CompressionConfig {
            max_messages: 1,
            keep_recent_messages: 2,
            ..CompressionConfig::default()
        };
        assert!(ContextWindowManager::new(config).is_err());
    }
}
