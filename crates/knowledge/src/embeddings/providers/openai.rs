//! OpenAI-compatible embeddings provider.

use crate::embeddings::config::EmbeddingConfig;
use crate::embeddings::provider::EmbeddingProvider;
use async_trait::async_trait;
use medrag_core::{AppError, AppResult};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

const DEFAULT_OPENAI_URL: &str = "https://api.openai.com/v1";
const REQUEST_TIMEOUT_SECS: u64 = 60;

/// Embeds whole batches with one `POST {endpoint}/embeddings` call.
#[derive(Debug, Clone)]
pub struct OpenAiProvider {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
    dimensions: usize,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}

impl OpenAiProvider {
    pub fn new(config: &EmbeddingConfig, api_key: &str) -> AppResult<Self> {
        if api_key.trim().is_empty() {
            return Err(AppError::Config("missing OpenAI API key".to_string()));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| AppError::Embedding(format!("Failed to build HTTP client: {}", e)))?;

        let base = config.endpoint.as_deref().unwrap_or(DEFAULT_OPENAI_URL);

        Ok(Self {
            client,
            endpoint: format!("{}/embeddings", base.trim_end_matches('/')),
            api_key: api_key.trim().to_string(),
            model: config.model.clone(),
            dimensions: config.dimensions,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiProvider {
    fn provider_name(&self) -> &str {
        "openai"
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    #[instrument(skip(self, texts), fields(batch_size = texts.len(), model = %self.model))]
    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let request = EmbeddingRequest {
            model: &self.model,
            input: texts,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::Embedding(format!("OpenAI embeddings request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(AppError::Embedding(format!(
                "OpenAI embeddings request failed ({}): {}",
                status, body
            )));
        }

        let mut parsed: EmbeddingResponse = response.json().await.map_err(|e| {
            AppError::Embedding(format!("Failed to parse OpenAI embedding response: {}", e))
        })?;
        parsed.data.sort_by_key(|entry| entry.index);

        if parsed.data.len() != texts.len() {
            return Err(AppError::Embedding(format!(
                "OpenAI returned {} embeddings for {} inputs",
                parsed.data.len(),
                texts.len()
            )));
        }

        debug!("Received {} embeddings", parsed.data.len());

        Ok(parsed.data.into_iter().map(|entry| entry.embedding).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_defaults_and_trims() {
        let provider = OpenAiProvider::new(&EmbeddingConfig::default(), "sk-test").unwrap();
        assert_eq!(provider.endpoint(), "https://api.openai.com/v1/embeddings");

        let config = EmbeddingConfig {
            endpoint: Some("http://proxy.local/v1/".to_string()),
            ..EmbeddingConfig::default()
        };
        let provider = OpenAiProvider::new(&config, "sk-test").unwrap();
        assert_eq!(provider.endpoint(), "http://proxy.local/v1/embeddings");
    }

    #[test]
    fn test_blank_key_rejected() {
        let result = OpenAiProvider::new(&EmbeddingConfig::default(), "  ");
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_response_sorted_by_index() {
        let json = r#"{"data":[{"embedding":[2.0],"index":1},{"embedding":[1.0],"index":0}]}"#;
        let mut parsed: EmbeddingResponse = serde_json::from_str(json).unwrap();
        parsed.data.sort_by_key(|entry| entry.index);
        assert_eq!(parsed.data[0].embedding, vec![1.0]);
    }

    #[tokio::test]
    async fn test_empty_batch_skips_request() {
        let provider = OpenAiProvider::new(&EmbeddingConfig::default(), "sk-test").unwrap();
        let result = provider.embed_batch(&[]).await.unwrap();
        assert!(result.is_empty());
    }
}
