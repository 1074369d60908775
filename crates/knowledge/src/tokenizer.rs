//! Token counting used for chunk budgets.

use medrag_core::{AppError, AppResult};
use std::path::Path;
use std::sync::Arc;
use unicode_segmentation::UnicodeSegmentation;

/// Counts tokens the way the embedding/generation model would.
pub trait TokenCounter: Send + Sync {
    /// Short identifier for logs.
    fn name(&self) -> &str;

    /// Number of tokens in `text`.
    fn count(&self, text: &str) -> usize;
}

/// Counts Unicode words (UAX #29). Deterministic and model-independent.
#[derive(Debug, Clone, Copy, Default)]
pub struct WordTokenCounter;

impl TokenCounter for WordTokenCounter {
    fn name(&self) -> &str {
        "unicode-words"
    }

    fn count(&self, text: &str) -> usize {
        text.unicode_words().count()
    }
}

/// Counts tokens with a HuggingFace `tokenizer.json`.
pub struct HfTokenCounter {
    tokenizer: tokenizers::Tokenizer,
}

impl HfTokenCounter {
    pub fn from_file(path: &Path) -> AppResult<Self> {
        let tokenizer = tokenizers::Tokenizer::from_file(path).map_err(|e| {
            AppError::Config(format!("Failed to load tokenizer {:?}: {}", path, e))
        })?;
        Ok(Self { tokenizer })
    }
}

impl TokenCounter for HfTokenCounter {
    fn name(&self) -> &str {
        "huggingface"
    }

    fn count(&self, text: &str) -> usize {
        match self.tokenizer.encode(text, false) {
            Ok(encoding) => encoding.get_ids().len(),
            Err(e) => {
                tracing::warn!(error = %e, "Tokenization failed, falling back to word count");
                WordTokenCounter.count(text)
            }
        }
    }
}

/// Tokenizer file when one is configured, word counting otherwise.
pub fn create_counter(tokenizer_path: Option<&Path>) -> AppResult<Arc<dyn TokenCounter>> {
    match tokenizer_path {
        Some(path) => {
            tracing::debug!("Using HuggingFace tokenizer from {:?}", path);
            Ok(Arc::new(HfTokenCounter::from_file(path)?))
        }
        None => Ok(Arc::new(WordTokenCounter)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_word_counter_hebrew() {
        let counter = WordTokenCounter;
        assert_eq!(counter.count("כימותרפיה היא טיפול תרופתי."), 4);
        assert_eq!(counter.count(""), 0);
        assert_eq!(counter.count("  \n "), 0);
    }

    #[test]
    fn test_word_counter_ignores_punctuation() {
        let counter = WordTokenCounter;
        assert_eq!(counter.count("כותרת: מחלקה\n\n"), 2);
    }

    #[test]
    fn test_default_counter() {
        let counter = create_counter(None).unwrap();
        assert_eq!(counter.name(), "unicode-words");
    }

    #[test]
    fn test_missing_tokenizer_file() {
        let path = PathBuf::from("/nonexistent/tokenizer.json");
        assert!(matches!(
            create_counter(Some(path.as_path())),
            Err(AppError::Config(_))
        ));
    }
}
