//! Document ingestion: read, chunk, persist chunks, build the index.

use crate::chunker::{processing_stats, Chunker};
use crate::index::{build_index, VectorIndex};
use crate::progress::ProgressReporter;
use crate::types::{Chunk, Document, IngestMode, IngestReport};
use medrag_core::{AppError, AppResult};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Instant;
use walkdir::WalkDir;

/// Number of chunks copied into the inspection sample file.
const SAMPLE_CHUNKS: usize = 5;

/// A record as written by the acquisition step.
///
/// Scraper output keeps the body in `hebrew_content` or `content`; plain
/// exports use `text`.
#[derive(Debug, Default, Deserialize)]
struct RawDocument {
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    text: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    hebrew_content: String,
}

impl From<RawDocument> for Document {
    fn from(raw: RawDocument) -> Self {
        let text = [raw.hebrew_content, raw.text, raw.content]
            .into_iter()
            .find(|body| !body.trim().is_empty())
            .unwrap_or_default();

        Document {
            title: raw.title,
            url: raw.url,
            text,
        }
    }
}

/// Options for one ingestion run.
#[derive(Debug, Clone, Default)]
pub struct IngestOptions {
    pub mode: IngestMode,
    /// Where to write the processed chunks; skipped when `None`
    pub chunks_out: Option<PathBuf>,
    /// Documents whose body is shorter than this (in characters) are skipped
    pub min_document_chars: usize,
}

/// Load documents from a JSON array file, a JSONL file, or a directory of them.
pub fn read_documents(path: &Path) -> AppResult<Vec<Document>> {
    if !path.exists() {
        return Err(AppError::Ingest(format!(
            "Input not found: {}",
            path.display()
        )));
    }

    if path.is_file() {
        return read_file(path);
    }

    let mut files: Vec<PathBuf> = WalkDir::new(path)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|p| matches!(extension(p).as_deref(), Some("json") | Some("jsonl")))
        .collect();
    files.sort();

    if files.is_empty() {
        return Err(AppError::Ingest(format!(
            "No .json or .jsonl files under {}",
            path.display()
        )));
    }

    let mut documents = Vec::new();
    for file in &files {
        documents.extend(read_file(file)?);
    }

    tracing::debug!(
        "Read {} documents from {} files under {:?}",
        documents.len(),
        files.len(),
        path
    );
    Ok(documents)
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

fn read_file(path: &Path) -> AppResult<Vec<Document>> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| AppError::Ingest(format!("Failed to read {}: {}", path.display(), e)))?;

    let records = if extension(path).as_deref() == Some("jsonl") {
        parse_jsonl(path, &raw)?
    } else {
        serde_json::from_str::<Vec<RawDocument>>(&raw).map_err(|e| {
            AppError::Ingest(format!(
                "{} is not a JSON array of documents: {}",
                path.display(),
                e
            ))
        })?
    };

    Ok(records.into_iter().map(Document::from).collect())
}

fn parse_jsonl(path: &Path, raw: &str) -> AppResult<Vec<RawDocument>> {
    raw.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(n, line)| {
            serde_json::from_str::<RawDocument>(line).map_err(|e| {
                AppError::Ingest(format!("{}:{}: {}", path.display(), n + 1, e))
            })
        })
        .collect()
}

/// Chunk every document long enough to be worth indexing.
///
/// Returns the chunks and the number of skipped documents.
pub fn chunk_documents(
    documents: &[Document],
    chunker: &Chunker,
    min_document_chars: usize,
    progress: &ProgressReporter,
) -> (Vec<Chunk>, usize) {
    let mut chunks = Vec::new();
    let mut skipped = 0;
    let total = documents.len() as u64;

    for (i, document) in documents.iter().enumerate() {
        if document.text.trim().chars().count() < min_document_chars {
            tracing::debug!("Skipping short document '{}'", document.title);
            skipped += 1;
            continue;
        }

        chunks.extend(chunker.chunk_document(document));

        let done = i + 1;
        if done % 5 == 0 || done == documents.len() {
            progress.chunk(done as u64, Some(total), chunks.len());
        }
    }

    (chunks, skipped)
}

/// Write the processed chunks as pretty JSON, plus `chunk_samples.json`
/// with the first few chunks next to it. Returns the sample file path.
pub fn write_chunks(path: &Path, chunks: &[Chunk]) -> AppResult<PathBuf> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    std::fs::write(path, serde_json::to_string_pretty(chunks)?)?;

    let sample_path = path.with_file_name("chunk_samples.json");
    let sample = &chunks[..chunks.len().min(SAMPLE_CHUNKS)];
    std::fs::write(&sample_path, serde_json::to_string_pretty(sample)?)?;

    tracing::info!("Processed chunks saved to {:?}", path);
    Ok(sample_path)
}

/// Read, chunk, and index `input` into `index`.
pub async fn ingest(
    input: &Path,
    chunker: &Chunker,
    index: &VectorIndex,
    options: &IngestOptions,
    progress: &ProgressReporter,
) -> AppResult<IngestReport> {
    let started = Instant::now();

    let source = input.display().to_string();
    progress.read(0, None, &source);
    let documents = read_documents(input)?;
    if documents.is_empty() {
        return Err(AppError::Ingest(format!("No documents found in {}", source)));
    }
    let read = documents.len() as u64;
    progress.read(read, Some(read), &source);

    let (chunks, skipped) =
        chunk_documents(&documents, chunker, options.min_document_chars, progress);
    let processing = processing_stats(&chunks);

    tracing::info!(
        documents = documents.len(),
        skipped,
        chunks = chunks.len(),
        avg_tokens = processing.average_tokens_per_chunk,
        "Chunking complete"
    );

    if chunks.is_empty() {
        return Err(AppError::Ingest(format!(
            "No chunks produced from {}: all {} documents were too short",
            source,
            documents.len()
        )));
    }

    if let Some(path) = &options.chunks_out {
        write_chunks(path, &chunks)?;
    }

    progress.embed(chunks.len() as u64, index.embedder().model_name());
    let added = build_index(index, &chunks, options.mode).await?;
    progress.index(
        added.records_written as u64,
        Some(chunks.len() as u64),
        index.name(),
    );

    Ok(IngestReport {
        documents_read: documents.len(),
        documents_skipped: skipped,
        chunks_created: chunks.len(),
        records_written: added.records_written,
        degraded_records: added.degraded_records,
        mode: options.mode,
        duration_secs: started.elapsed().as_secs_f64(),
        processing,
    })
}
