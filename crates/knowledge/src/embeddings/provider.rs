//! Embedding provider trait and factory.

use crate::embeddings::config::EmbeddingConfig;
use crate::embeddings::providers::{mock::MockProvider, ollama::OllamaProvider, openai::OpenAiProvider};
use medrag_core::{AppError, AppResult};
use std::sync::Arc;

/// Trait for embedding providers.
///
/// Implementations make one attempt per call; batching, throttling and
/// zero-vector fallback live in `EmbeddingClient`.
#[async_trait::async_trait]
pub trait EmbeddingProvider: Send + Sync + std::fmt::Debug {
    /// Get provider name (e.g., "mock", "openai", "ollama")
    fn provider_name(&self) -> &str;

    /// Get model identifier
    fn model_name(&self) -> &str;

    /// Get embedding dimensions
    fn dimensions(&self) -> usize;

    /// Generate embeddings for multiple texts, in input order.
    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>>;

    /// Generate embedding for a single text (convenience method).
    async fn embed(&self, text: &str) -> AppResult<Vec<f32>> {
        let mut results = self.embed_batch(&[text.to_string()]).await?;
        results
            .pop()
            .ok_or_else(|| AppError::Embedding("No embedding returned".to_string()))
    }
}

/// Create an embedding provider based on configuration.
pub fn create_provider(
    config: &EmbeddingConfig,
    api_key: Option<&str>,
) -> AppResult<Arc<dyn EmbeddingProvider>> {
    match config.provider.as_str() {
        "mock" => Ok(Arc::new(MockProvider::new(config.dimensions))),

        "openai" => {
            let key = api_key.ok_or_else(|| {
                AppError::Config("OpenAI embedding provider requires an API key".to_string())
            })?;
            Ok(Arc::new(OpenAiProvider::new(config, key)?))
        }

        "ollama" => Ok(Arc::new(OllamaProvider::new(config)?)),

        _ => Err(AppError::Config(format!(
            "Unknown embedding provider: '{}'. Supported providers: openai, ollama, mock",
            config.provider
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_mock_provider() {
        let provider = create_provider(&EmbeddingConfig::mock(384), None).unwrap();
        assert_eq!(provider.provider_name(), "mock");
        assert_eq!(provider.dimensions(), 384);
    }

    #[test]
    fn test_openai_requires_key() {
        let result = create_provider(&EmbeddingConfig::default(), None);
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_create_openai_and_ollama() {
        let openai = create_provider(&EmbeddingConfig::default(), Some("sk-test")).unwrap();
        assert_eq!(openai.model_name(), "text-embedding-ada-002");

        let ollama_config = EmbeddingConfig {
            provider: "ollama".to_string(),
            model: "nomic-embed-text".to_string(),
            dimensions: 768,
            ..EmbeddingConfig::default()
        };
        let ollama = create_provider(&ollama_config, None).unwrap();
        assert_eq!(ollama.provider_name(), "ollama");
    }

    #[test]
    fn test_create_unknown_provider() {
        let config = EmbeddingConfig {
            provider: "unknown".to_string(),
            ..EmbeddingConfig::default()
        };

        let result = create_provider(&config, None);
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Unknown embedding provider"));
    }

    #[tokio::test]
    async fn test_provider_embed_single() {
        let provider = create_provider(&EmbeddingConfig::mock(64), None).unwrap();
        let embedding = provider.embed("בדיקה").await.unwrap();
        assert_eq!(embedding.len(), 64);
    }
}
