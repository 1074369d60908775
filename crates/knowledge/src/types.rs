//! Knowledge system type definitions.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for a document collection.
///
/// Stored at `.medrag/knowledge/<name>/config.yaml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeBaseConfig {
    /// Collection name
    pub name: String,

    /// Chunk budget in tokens
    #[serde(default = "default_max_chunk_size")]
    pub max_chunk_size: usize,

    /// Words carried from a closed chunk into the next one
    #[serde(default = "default_overlap_words")]
    pub overlap_words: usize,

    /// Cleaned text shorter than this (in characters) yields no chunks
    #[serde(default = "default_min_text_chars")]
    pub min_text_chars: usize,

    /// Documents shorter than this (in characters) are skipped at ingestion
    #[serde(default = "default_min_document_chars")]
    pub min_document_chars: usize,

    /// Optional HuggingFace `tokenizer.json` used for token counts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokenizer_path: Option<PathBuf>,

    /// Embedding provider: "openai", "ollama" or "mock"
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Embedding model
    #[serde(default = "default_model")]
    pub model: String,

    /// Custom embedding endpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// Embedding vector dimension
    #[serde(default = "default_embedding_dim")]
    pub embedding_dim: usize,

    /// Texts per embedding request
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Pause between embedding batches
    #[serde(default = "default_batch_delay_ms")]
    pub batch_delay_ms: u64,

    /// Results retrieved per question
    #[serde(default = "default_n_results")]
    pub n_results: usize,

    /// Generation temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Generation output limit
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_max_chunk_size() -> usize {
    500
}

fn default_overlap_words() -> usize {
    20
}

fn default_min_text_chars() -> usize {
    50
}

fn default_min_document_chars() -> usize {
    100
}

fn default_provider() -> String {
    "openai".to_string()
}

fn default_model() -> String {
    "text-embedding-ada-002".to_string()
}

fn default_embedding_dim() -> usize {
    1536
}

fn default_batch_size() -> usize {
    100
}

fn default_batch_delay_ms() -> u64 {
    100
}

fn default_n_results() -> usize {
    5
}

fn default_temperature() -> f32 {
    0.3
}

fn default_max_tokens() -> u32 {
    1500
}

impl Default for KnowledgeBaseConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            max_chunk_size: default_max_chunk_size(),
            overlap_words: default_overlap_words(),
            min_text_chars: default_min_text_chars(),
            min_document_chars: default_min_document_chars(),
            tokenizer_path: None,
            provider: default_provider(),
            model: default_model(),
            endpoint: None,
            embedding_dim: default_embedding_dim(),
            batch_size: default_batch_size(),
            batch_delay_ms: default_batch_delay_ms(),
            n_results: default_n_results(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

/// A source document handed over by the acquisition step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub title: String,
    pub url: String,
    pub text: String,
}

/// A token-bounded passage of a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// Passage text; the first chunk of a document starts with the title/source header
    pub content: String,
    pub title: String,
    pub url: String,
    /// 0-based position within the document
    pub sequence_index: usize,
    /// Token count of the body, plus the header for chunk 0
    pub token_count: usize,
}

/// Metadata stored alongside every indexed record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub title: String,
    pub url: String,
    pub sequence_index: usize,
    pub token_count: usize,
}

impl From<&Chunk> for ChunkMetadata {
    fn from(chunk: &Chunk) -> Self {
        Self {
            title: chunk.title.clone(),
            url: chunk.url.clone(),
            sequence_index: chunk.sequence_index,
            token_count: chunk.token_count,
        }
    }
}

/// A record owned by the vector index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexedRecord {
    /// `<16 hex chars of sha256(title \n url)>#<sequence_index>`
    pub id: String,
    #[serde(skip)]
    pub embedding: Vec<f32>,
    pub content: String,
    pub metadata: ChunkMetadata,
    /// SHA-256 of `content`
    pub content_hash: String,
    /// Embedding is a zero-vector substitute
    pub degraded: bool,
}

/// One ranked hit of a vector search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalResult {
    pub id: String,
    pub content: String,
    pub metadata: ChunkMetadata,
    /// Cosine distance in `[0, 2]`
    pub distance: f32,
    /// `1 - distance / 2`, in `[0, 1]`
    pub relevance_score: f32,
}

/// Size of a collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexStats {
    /// Records that can be retrieved
    pub total_documents: usize,
    /// Records stored with placeholder embeddings, never retrieved
    #[serde(default)]
    pub degraded_records: usize,
    pub collection_name: String,
}

/// Readiness of the answering system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SystemStatus {
    Ready,
    NeedsData,
}

impl SystemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ready => "ready",
            Self::NeedsData => "needs_data",
        }
    }
}

/// Index stats plus readiness.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemStats {
    pub total_documents: usize,
    pub collection_name: String,
    pub system_status: SystemStatus,
}

impl From<IndexStats> for SystemStats {
    fn from(stats: IndexStats) -> Self {
        let system_status = if stats.total_documents > 0 {
            SystemStatus::Ready
        } else {
            SystemStatus::NeedsData
        };
        Self {
            total_documents: stats.total_documents,
            collection_name: stats.collection_name,
            system_status,
        }
    }
}

/// Token statistics over a batch of chunks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingStats {
    pub total_chunks: usize,
    pub total_tokens: usize,
    pub average_tokens_per_chunk: f64,
    pub max_tokens: usize,
    pub min_tokens: usize,
}

/// How `add` treats the existing collection contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IngestMode {
    /// Clear the collection, then insert
    #[default]
    Replace,
    /// Insert over the existing contents; equal ids are overwritten
    Append,
}

/// An embedding batch that fell back to zero vectors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchFailure {
    /// 0-based batch number
    pub batch: usize,
    /// Index of the first text of the batch
    pub start: usize,
    /// Number of texts in the batch
    pub len: usize,
    pub error: String,
}

/// Outcome of a bulk add.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AddReport {
    pub records_written: usize,
    pub degraded_records: usize,
    pub embedding_failures: Vec<BatchFailure>,
}

/// Outcome of an ingestion run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestReport {
    pub documents_read: usize,
    pub documents_skipped: usize,
    pub chunks_created: usize,
    pub records_written: usize,
    pub degraded_records: usize,
    pub mode: IngestMode,
    pub duration_secs: f64,
    pub processing: ProcessingStats,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults_from_empty_yaml() {
        let config: KnowledgeBaseConfig = serde_yaml::from_str("name: oncology").unwrap();
        assert_eq!(config.max_chunk_size, 500);
        assert_eq!(config.overlap_words, 20);
        assert_eq!(config.min_text_chars, 50);
        assert_eq!(config.min_document_chars, 100);
        assert_eq!(config.embedding_dim, 1536);
        assert_eq!(config.batch_size, 100);
        assert_eq!(config.batch_delay_ms, 100);
        assert_eq!(config.n_results, 5);
        assert_eq!(config.max_tokens, 1500);
        assert!((config.temperature - 0.3).abs() < f32::EPSILON);
    }

    #[test]
    fn test_status_serialization() {
        let json = serde_json::to_string(&SystemStatus::NeedsData).unwrap();
        assert_eq!(json, "\"needs_data\"");
        assert_eq!(SystemStatus::Ready.as_str(), "ready");
    }

    #[test]
    fn test_system_stats_readiness() {
        let empty = SystemStats::from(IndexStats {
            total_documents: 0,
            degraded_records: 2,
            collection_name: "oncology".to_string(),
        });
        assert_eq!(empty.system_status, SystemStatus::NeedsData);

        let ready = SystemStats::from(IndexStats {
            total_documents: 3,
            degraded_records: 0,
            collection_name: "oncology".to_string(),
        });
        assert_eq!(ready.system_status, SystemStatus::Ready);
        assert_eq!(ready.collection_name, "oncology");
    }
}
