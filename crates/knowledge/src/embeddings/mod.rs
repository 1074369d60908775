//! Batched embedding client.
//!
//! Wraps an [`EmbeddingProvider`] with batching, inter-batch throttling and
//! zero-vector substitution for failed batches. Substitutions are reported
//! back to the caller instead of being swallowed.

pub mod config;
pub mod provider;
pub mod providers;

pub use config::EmbeddingConfig;
pub use provider::{create_provider, EmbeddingProvider};

use crate::types::BatchFailure;
use medrag_core::{AppError, AppResult};
use std::sync::Arc;
use std::time::Duration;

/// Result of a batched `embed` call.
///
/// `vectors` always has one entry per input text, in input order.
#[derive(Debug, Clone, Default)]
pub struct EmbeddingReport {
    pub vectors: Vec<Vec<f32>>,
    pub failures: Vec<BatchFailure>,
}

impl EmbeddingReport {
    /// Whether the vector at `index` is a zero-vector substitute.
    pub fn is_degraded(&self, index: usize) -> bool {
        self.failures
            .iter()
            .any(|f| index >= f.start && index < f.start + f.len)
    }

    pub fn degraded_count(&self) -> usize {
        self.failures.iter().map(|f| f.len).sum()
    }

    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Embedding client shared by indexing and query paths.
#[derive(Debug)]
pub struct EmbeddingClient {
    provider: Arc<dyn EmbeddingProvider>,
    config: EmbeddingConfig,
}

impl EmbeddingClient {
    pub fn new(provider: Arc<dyn EmbeddingProvider>, config: EmbeddingConfig) -> Self {
        Self { provider, config }
    }

    /// Build the provider named in `config` and wrap it.
    pub fn from_config(config: EmbeddingConfig, api_key: Option<&str>) -> AppResult<Self> {
        let provider = create_provider(&config, api_key)?;
        Ok(Self::new(provider, config))
    }

    pub fn config(&self) -> &EmbeddingConfig {
        &self.config
    }

    pub fn provider_name(&self) -> &str {
        self.provider.provider_name()
    }

    pub fn model_name(&self) -> &str {
        &self.config.model
    }

    pub fn dimensions(&self) -> usize {
        self.config.dimensions
    }

    /// Embed `texts` in batches of `batch_size`.
    ///
    /// A batch that errors, returns the wrong number of vectors, or returns
    /// vectors of the wrong length is replaced by zero vectors and recorded
    /// in `failures`. Never fails as a whole.
    pub async fn embed(&self, texts: &[String]) -> EmbeddingReport {
        let mut report = EmbeddingReport {
            vectors: Vec::with_capacity(texts.len()),
            failures: Vec::new(),
        };
        if texts.is_empty() {
            return report;
        }

        let batch_size = self.config.batch_size.max(1);
        let batch_count = texts.len().div_ceil(batch_size);

        for (batch, slice) in texts.chunks(batch_size).enumerate() {
            let start = batch * batch_size;

            match self.embed_checked(slice).await {
                Ok(vectors) => report.vectors.extend(vectors),
                Err(e) => {
                    tracing::warn!(
                        batch,
                        start,
                        len = slice.len(),
                        error = %e,
                        "Embedding batch failed, substituting zero vectors"
                    );
                    let zero = vec![0.0; self.config.dimensions];
                    report.vectors.extend(slice.iter().map(|_| zero.clone()));
                    report.failures.push(BatchFailure {
                        batch,
                        start,
                        len: slice.len(),
                        error: e.to_string(),
                    });
                }
            }

            tracing::debug!("Embedded batch {}/{}", batch + 1, batch_count);

            if batch + 1 < batch_count && self.config.batch_delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(self.config.batch_delay_ms)).await;
            }
        }

        report
    }

    /// Embed a single query. Unlike [`embed`](Self::embed), failures are returned.
    pub async fn embed_query(&self, text: &str) -> AppResult<Vec<f32>> {
        let mut vectors = self.embed_checked(&[text.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| AppError::Embedding("No embedding returned".to_string()))
    }

    async fn embed_checked(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        let vectors = self.provider.embed_batch(texts).await?;

        if vectors.len() != texts.len() {
            return Err(AppError::Embedding(format!(
                "Provider returned {} vectors for {} texts",
                vectors.len(),
                texts.len()
            )));
        }

        if let Some(bad) = vectors.iter().find(|v| v.len() != self.config.dimensions) {
            return Err(AppError::Embedding(format!(
                "Dimension mismatch: expected {}, got {}",
                self.config.dimensions,
                bad.len()
            )));
        }

        Ok(vectors)
    }
}
