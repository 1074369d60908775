//! Embedding configuration derived from a collection config.

use crate::types::KnowledgeBaseConfig;
use medrag_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// Embedding settings for one collection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmbeddingConfig {
    /// Provider name: "openai", "ollama", "mock"
    pub provider: String,

    /// Model identifier (provider-specific)
    pub model: String,

    /// Embedding vector dimensions
    pub dimensions: usize,

    /// Maximum texts per embedding request
    pub batch_size: usize,

    /// Pause between consecutive batches
    pub batch_delay_ms: u64,

    /// Custom endpoint (provider default when absent)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        EmbeddingConfig::from(&KnowledgeBaseConfig::default())
    }
}

impl From<&KnowledgeBaseConfig> for EmbeddingConfig {
    fn from(config: &KnowledgeBaseConfig) -> Self {
        Self {
            provider: config.provider.clone(),
            model: config.model.clone(),
            dimensions: config.embedding_dim,
            batch_size: config.batch_size,
            batch_delay_ms: config.batch_delay_ms,
            endpoint: config.endpoint.clone(),
        }
    }
}

impl EmbeddingConfig {
    /// Offline hashed embeddings, mainly for tests and demos.
    pub fn mock(dimensions: usize) -> Self {
        Self {
            provider: "mock".to_string(),
            model: "hashed-trigram-v1".to_string(),
            dimensions,
            batch_size: 100,
            batch_delay_ms: 0,
            endpoint: None,
        }
    }

    /// Validate that another config produces vectors comparable to this one.
    pub fn validate_consistency(&self, other: &Self) -> AppResult<()> {
        if self.model != other.model {
            return Err(AppError::Embedding(format!(
                "Model mismatch: expected '{}', got '{}'",
                self.model, other.model
            )));
        }

        if self.dimensions != other.dimensions {
            return Err(AppError::Embedding(format!(
                "Dimension mismatch: expected {}, got {}",
                self.dimensions, other.dimensions
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EmbeddingConfig::default();
        assert_eq!(config.provider, "openai");
        assert_eq!(config.model, "text-embedding-ada-002");
        assert_eq!(config.dimensions, 1536);
        assert_eq!(config.batch_size, 100);
        assert_eq!(config.batch_delay_ms, 100);
    }

    #[test]
    fn test_from_collection_config() {
        let kb = KnowledgeBaseConfig {
            provider: "ollama".to_string(),
            model: "nomic-embed-text".to_string(),
            embedding_dim: 768,
            endpoint: Some("http://gpu:11434".to_string()),
            ..Default::default()
        };
        let config = EmbeddingConfig::from(&kb);
        assert_eq!(config.dimensions, 768);
        assert_eq!(config.endpoint.as_deref(), Some("http://gpu:11434"));
    }

    #[test]
    fn test_validate_consistency_success() {
        let config = EmbeddingConfig::mock(64);
        let other = EmbeddingConfig {
            batch_size: 10,
            ..config.clone()
        };
        assert!(config.validate_consistency(&other).is_ok());
    }

    #[test]
    fn test_validate_consistency_dimension_mismatch() {
        let config1 = EmbeddingConfig::default();
        let config2 = EmbeddingConfig {
            dimensions: 768,
            ..config1.clone()
        };

        let result = config1.validate_consistency(&config2);
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Dimension mismatch"));
    }
}
