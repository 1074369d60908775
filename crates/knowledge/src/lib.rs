//! Document collection and answering pipeline.
//!
//! Cleanup and chunking, batched embeddings, a SQLite vector index,
//! ingestion, retrieval, context assembly and the `ask` orchestrator.
//! The functions at the crate root wire these together from an
//! [`AppConfig`] and a collection config.

pub mod chunker;
pub mod clean;
pub mod config;
pub mod embeddings;
pub mod index;
pub mod ingest;
pub mod labels;
pub mod progress;
pub mod rag;
pub mod retriever;
pub mod tokenizer;
pub mod types;

#[cfg(test)]
mod tests;

pub use chunker::{processing_stats, Chunker, ChunkerSettings};
pub use embeddings::{EmbeddingClient, EmbeddingConfig, EmbeddingReport};
pub use index::{build_index, VectorIndex};
pub use ingest::IngestOptions;
pub use progress::{ProgressEvent, ProgressReporter};
pub use rag::{AnswerBundle, AssistantSettings, Citation, RagAssistant};
pub use retriever::{IndexRetriever, Retriever};
pub use types::{
    AddReport, Chunk, Document, IndexStats, IngestMode, IngestReport, KnowledgeBaseConfig,
    RetrievalResult, SystemStats, SystemStatus,
};

use medrag_core::{AppConfig, AppResult};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Embedding client for a collection.
///
/// The collection config names the provider; a missing endpoint falls back
/// to the workspace's provider settings, and the API key is resolved the
/// same way generation keys are.
pub fn embedding_client(app: &AppConfig, kb: &KnowledgeBaseConfig) -> AppResult<EmbeddingClient> {
    let mut config = EmbeddingConfig::from(kb);
    if config.endpoint.is_none() {
        config.endpoint = app
            .get_provider_config(&kb.provider)
            .and_then(|p| p.endpoint().map(str::to_string));
    }

    let api_key = app.resolve_api_key(&kb.provider);
    EmbeddingClient::from_config(config, api_key.as_deref())
}

/// Open the collection's handle on the workspace index.
pub fn open_collection(app: &AppConfig, kb: &KnowledgeBaseConfig) -> AppResult<VectorIndex> {
    let embedder = embedding_client(app, kb)?;
    VectorIndex::open(&app.index_path(), &kb.name, Arc::new(embedder))
}

/// Stats for a collection; does not need a reachable embedding provider.
pub fn collection_stats(app: &AppConfig, collection: &str) -> AppResult<IndexStats> {
    index::read_stats(&app.index_path(), collection)
}

/// Options for [`learn`].
#[derive(Debug, Clone, Default)]
pub struct LearnOptions {
    pub mode: IngestMode,
    /// Processed-chunks file; defaults to the collection directory
    pub chunks_out: Option<PathBuf>,
}

/// Ingest `input` into the collection named by `kb`.
pub async fn learn(
    app: &AppConfig,
    kb: &KnowledgeBaseConfig,
    input: &Path,
    options: LearnOptions,
    progress: &ProgressReporter,
) -> AppResult<IngestReport> {
    tracing::info!(
        collection = %kb.name,
        input = %input.display(),
        mode = ?options.mode,
        "Starting ingestion"
    );

    app.ensure_medrag_dir()?;
    let chunker = Chunker::from_config(kb, app.assistant.locale)?;
    let index = open_collection(app, kb)?;

    let ingest_options = IngestOptions {
        mode: options.mode,
        chunks_out: Some(
            options
                .chunks_out
                .unwrap_or_else(|| config::get_chunks_path(&app.workspace, &kb.name)),
        ),
        min_document_chars: kb.min_document_chars,
    };

    let report = ingest::ingest(input, &chunker, &index, &ingest_options, progress).await?;
    index.close()?;

    tracing::info!(
        documents = report.documents_read,
        chunks = report.chunks_created,
        records = report.records_written,
        degraded = report.degraded_records,
        duration_secs = report.duration_secs,
        "Ingestion complete"
    );

    Ok(report)
}

/// Build the answering assistant over an opened collection.
pub fn create_assistant(
    app: &AppConfig,
    kb: &KnowledgeBaseConfig,
    index: Arc<VectorIndex>,
) -> AppResult<RagAssistant> {
    let endpoint = app
        .get_provider_config(&app.provider)
        .and_then(|p| p.endpoint().map(str::to_string));
    let api_key = app.resolve_api_key(&app.provider);
    let llm = medrag_llm::create_client(&app.provider, endpoint.as_deref(), api_key.as_deref())?;

    let locale = app.assistant.locale;
    let prompt = medrag_prompt::resolve_prompt(&app.workspace, medrag_prompt::prompt_id_for(locale))?;

    let settings = AssistantSettings {
        locale,
        model: app.model.clone(),
        institution: app.assistant.institution.clone(),
        domain: app.assistant.domain.clone(),
        ..AssistantSettings::default()
    }
    .with_collection(kb);

    tracing::debug!(
        provider = %app.provider,
        model = %app.model,
        prompt = %prompt.id,
        n_results = settings.n_results,
        "Assistant ready"
    );

    RagAssistant::new(Arc::new(IndexRetriever::new(index)), llm, prompt, settings)
}
