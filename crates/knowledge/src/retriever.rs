//! Query-side façade over the vector index.

use crate::index::VectorIndex;
use crate::types::{IndexStats, RetrievalResult};
use async_trait::async_trait;
use medrag_core::AppResult;
use std::sync::Arc;

/// Default number of results per query.
pub const DEFAULT_N_RESULTS: usize = 5;

/// Turns a query string into ranked passages.
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Up to `n` results, nearest first.
    async fn retrieve(&self, query: &str, n: usize) -> AppResult<Vec<RetrievalResult>>;

    fn stats(&self) -> AppResult<IndexStats>;
}

/// [`Retriever`] backed by a [`VectorIndex`] collection.
#[derive(Debug, Clone)]
pub struct IndexRetriever {
    index: Arc<VectorIndex>,
}

impl IndexRetriever {
    pub fn new(index: Arc<VectorIndex>) -> Self {
        Self { index }
    }

    pub fn index(&self) -> &VectorIndex {
        &self.index
    }
}

#[async_trait]
impl Retriever for IndexRetriever {
    async fn retrieve(&self, query: &str, n: usize) -> AppResult<Vec<RetrievalResult>> {
        let results = self.index.search(query, n).await?;
        tracing::debug!(query_len = query.len(), hits = results.len(), "Retrieved");
        Ok(results)
    }

    fn stats(&self) -> AppResult<IndexStats> {
        self.index.stats()
    }
}
