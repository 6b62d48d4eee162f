//! Conversation context compression
//!
//! Importance scoring, retention planning, template summaries and the
//! window manager that ties them together. Everything here is synchronous
//! and performs no I/O.

pub mod models;
pub mod planner;
pub mod scorer;
pub mod summarizer;
pub mod token_estimator;
pub mod window_manager;

pub use models::{
    CompressionResult, ImportanceScore, Message, MessageMetadata, RetentionRules, Role,
    ScoreReason,
};
pub use planner::{RetentionPlan, RetentionPlanner, IMPORTANT_FRACTION};
pub use scorer::ImportanceScorer;
pub use summarizer::{Summarizer, TemplateSummarizer, SUMMARY_PREFIX};
pub use token_estimator::{TiktokenEstimator, TokenEstimator, WordBasedEstimator};
pub use window_manager::ContextWindowManager;
