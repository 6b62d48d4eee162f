//! Token estimation for conversation histories

use super::models::Message;
use crate::error::{ContextError, Result};
use once_cell::sync::OnceCell;
use std::sync::Arc;
use tiktoken_rs::{cl100k_base, CoreBPE};

/// Loaded once per process and shared by every estimator
static CL100K: OnceCell<Arc<CoreBPE>> = OnceCell::new();

/// Framing tokens charged per chat message (role markers and separators)
pub const MESSAGE_OVERHEAD_TOKENS: usize = 4;

/// Token estimator trait for different tokenization strategies
pub trait TokenEstimator: Send + Sync {
    /// Estimate the number of tokens in the given text
    fn estimate(&self, text: &str) -> usize;

    /// Estimate tokens for a whole message list, including per-message framing
    fn estimate_messages(&self, messages: &[Message]) -> usize {
        messages
            .iter()
            .map(|m| self.estimate(&m.content) + MESSAGE_OVERHEAD_TOKENS)
            .sum()
    }
}

/// Tiktoken-based estimator using cl100k_base
pub struct TiktokenEstimator {
    bpe: Arc<CoreBPE>,
}

impl TiktokenEstimator {
    pub fn new() -> Result<Self> {
        let bpe = CL100K.get_or_try_init(|| {
            cl100k_base()
                .map(Arc::new)
                .map_err(|e| ContextError::Internal(format!("Failed to load cl100k_base: {}", e)))
        })?;
        Ok(Self { bpe: bpe.clone() })
    }
}

impl TokenEstimator for TiktokenEstimator {
    fn estimate(&self, text: &str) -> usize {
        self.bpe.encode_with_special_tokens(text).len()
    }
}

/// Word-based token estimator (~1.3 tokens per word)
#[derive(Debug, Clone, Copy)]
pub struct WordBasedEstimator {
    tokens_per_word: f64,
}

impl WordBasedEstimator {
    pub fn new(tokens_per_word: f64) -> Self {
        Self { tokens_per_word }
    }
}

impl Default for WordBasedEstimator {
    fn default() -> Self {
        Self::new(1.3)
    }
}

impl TokenEstimator for WordBasedEstimator {
    fn estimate(&self, text: &str) -> usize {
        let word_count = text.split_whitespace().count();
        (word_count as f64 * self.tokens_per_word).ceil() as usize
    }
}
