//! Prompt size estimation using tiktoken

use std::sync::Arc;
use tiktoken_rs::{cl100k_base, CoreBPE};
use tracing::warn;

/// Counts tokens in prompt text
pub trait TokenEstimator: Send + Sync {
    fn estimate(&self, text: &str) -> usize;

    fn estimate_batch(&self, texts: &[&str]) -> usize {
        texts.iter().map(|t| self.estimate(t)).sum()
    }
}

/// cl100k_base estimator (the gpt-4o-mini family tokenizes close to it)
pub struct TiktokenEstimator {
    bpe: Arc<CoreBPE>,
}

impl TiktokenEstimator {
    pub fn new() -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let bpe = cl100k_base()?;
        Ok(Self { bpe: Arc::new(bpe) })
    }
}

impl TokenEstimator for TiktokenEstimator {
    fn estimate(&self, text: &str) -> usize {
        self.bpe.encode_with_special_tokens(text).len()
    }
}

/// Word-based estimate, ~1.3 tokens per word
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

/// Tiktoken when its encoding loads, otherwise the word-based fallback
pub fn default_estimator() -> Arc<dyn TokenEstimator> {
    match TiktokenEstimator::new() {
        Ok(estimator) => Arc::new(estimator),
        Err(e) => {
            warn!("Tiktoken unavailable ({}), using word-based token estimates", e);
            Arc::new(WordBasedEstimator::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tiktoken_estimator() {
        let estimator = TiktokenEstimator::new().unwrap();
        let tokens = estimator.estimate("Hello, world! This is a test.");
        assert!(tokens > 0);
        assert!(tokens < 20);
    }

    #[test]
    fn test_word_based_estimator() {
        let estimator = WordBasedEstimator::default();
        assert_eq!(estimator.estimate("Hello world test"), 4);
        assert_eq!(estimator.estimate(""), 0);
    }

    #[test]
    fn test_batch_is_summed() {
        let estimator = WordBasedEstimator::new(1.0);
        assert_eq!(estimator.estimate_batch(&["one two", "three"]), 3);
    }

    #[test]
    fn test_default_estimator_counts() {
        assert!(default_estimator().estimate("What should I do next?") > 0);
    }
}
