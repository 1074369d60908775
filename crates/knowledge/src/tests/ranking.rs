//! Ranking behavior of the vector index with hand-made embeddings.

use crate::embeddings::{EmbeddingClient, EmbeddingConfig, EmbeddingProvider};
use crate::index::{record_id, VectorIndex};
use crate::types::{Chunk, IngestMode};
use medrag_core::{AppError, AppResult};
use std::collections::HashMap;
use std::sync::Arc;
use tempfile::TempDir;

/// Looks embeddings up in a fixed table. A batch containing "boom" fails.
#[derive(Debug)]
struct TableProvider {
    table: HashMap<String, Vec<f32>>,
}

#[async_trait::async_trait]
impl EmbeddingProvider for TableProvider {
    fn provider_name(&self) -> &str {
        "table"
    }

    fn model_name(&self) -> &str {
        "table-v1"
    }

    fn dimensions(&self) -> usize {
        3
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        if texts.iter().any(|t| t == "boom") {
            return Err(AppError::Embedding("upstream 503".to_string()));
        }
        Ok(texts
            .iter()
            .map(|t| self.table.get(t).cloned().unwrap_or(vec![0.0; 3]))
            .collect())
    }
}

fn chunk(title: &str, content: &str) -> Chunk {
    Chunk {
        content: content.to_string(),
        title: title.to_string(),
        url: format!("https://example.org/{}", title),
        sequence_index: 0,
        token_count: 1,
    }
}

fn table_index(dir: &TempDir) -> VectorIndex {
    let table: HashMap<String, Vec<f32>> = [
        ("chemo", vec![1.0, 0.0, 0.0]),
        ("radiation", vec![0.8, 0.6, 0.0]),
        ("visiting", vec![0.0, 0.0, 1.0]),
        ("opposite", vec![-1.0, 0.0, 0.0]),
        ("q-chemo", vec![1.0, 0.0, 0.0]),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect();

    let config = EmbeddingConfig {
        provider: "table".to_string(),
        model: "table-v1".to_string(),
        dimensions: 3,
        batch_size: 2,
        batch_delay_ms: 0,
        endpoint: None,
    };
    let embedder = EmbeddingClient::new(Arc::new(TableProvider { table }), config);
    VectorIndex::open(&dir.path().join("index.sqlite"), "ranking", Arc::new(embedder)).unwrap()
}

#[tokio::test]
async fn nearest_first_with_normalized_relevance() {
    let dir = TempDir::new().unwrap();
    let index = table_index(&dir);
    index
        .add(
            &[
                chunk("visiting", "visiting"),
                chunk("opposite", "opposite"),
                chunk("radiation", "radiation"),
                chunk("chemo", "chemo"),
            ],
            IngestMode::Replace,
        )
        .await
        .unwrap();

    let results = index.search("q-chemo", 4).await.unwrap();
    let titles: Vec<&str> = results.iter().map(|r| r.metadata.title.as_str()).collect();
    assert_eq!(titles, vec!["chemo", "radiation", "visiting", "opposite"]);

    let expected = [(0.0, 1.0), (0.2, 0.9), (1.0, 0.5), (2.0, 0.0)];
    for (r, (distance, relevance)) in results.iter().zip(expected) {
        assert!((r.distance - distance).abs() < 1e-5, "{}", r.metadata.title);
        assert!((r.relevance_score - relevance).abs() < 1e-5);
    }
}

#[tokio::test]
async fn top_k_truncates() {
    let dir = TempDir::new().unwrap();
    let index = table_index(&dir);
    index
        .add(
            &[chunk("chemo", "chemo"), chunk("radiation", "radiation"), chunk("visiting", "visiting")],
            IngestMode::Replace,
        )
        .await
        .unwrap();

    let results = index.search("q-chemo", 1).await.unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].id, record_id("chemo", "https://example.org/chemo", 0, 0));
}

#[tokio::test]
async fn degraded_records_are_stored_but_not_ranked() {
    let dir = TempDir::new().unwrap();
    let index = table_index(&dir);

    let report = index
        .add(
            &[
                chunk("chemo", "chemo"),
                chunk("radiation", "radiation"),
                chunk("boom", "boom"),
                chunk("visiting", "visiting"),
            ],
            IngestMode::Replace,
        )
        .await
        .unwrap();
    assert_eq!(report.records_written, 4);
    assert_eq!(report.degraded_records, 2);
    assert_eq!(report.embedding_failures.len(), 1);
    let stats = index.stats().unwrap();
    assert_eq!(stats.total_documents, 2);
    assert_eq!(stats.degraded_records, 2);

    let visiting = index
        .get(&record_id("visiting", "https://example.org/visiting", 0, 0))
        .unwrap()
        .unwrap();
    assert!(visiting.degraded);
    assert!(visiting.embedding.iter().all(|&x| x == 0.0));

    let results = index.search("q-chemo", 5).await.unwrap();
    let titles: Vec<&str> = results.iter().map(|r| r.metadata.title.as_str()).collect();
    assert_eq!(titles, vec!["chemo", "radiation"]);
}
