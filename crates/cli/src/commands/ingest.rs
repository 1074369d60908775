//! Ingest command handler.

use super::collection_config;
use clap::Args;
use medrag_core::config::AppConfig;
use medrag_knowledge::{IngestMode, LearnOptions, ProgressEvent, ProgressReporter};
use std::path::PathBuf;
use std::sync::Arc;

/// Load documents, chunk them and build the index
#[derive(Args, Debug)]
pub struct IngestCommand {
    /// JSON array file, JSONL file, or a directory of them
    pub path: PathBuf,

    /// Keep existing records instead of rebuilding the collection
    #[arg(long)]
    pub append: bool,

    /// Where to write the processed chunks
    #[arg(long)]
    pub chunks_out: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl IngestCommand {
    pub async fn execute(&self, config: &AppConfig) -> anyhow::Result<()> {
        tracing::info!("Executing ingest command for {:?}", self.path);

        let kb = collection_config(config, None)?;
        let options = LearnOptions {
            mode: if self.append {
                IngestMode::Append
            } else {
                IngestMode::Replace
            },
            chunks_out: self.chunks_out.clone(),
        };

        let progress = if self.json {
            ProgressReporter::noop()
        } else {
            ProgressReporter::new(Arc::new(|event: ProgressEvent| eprintln!("{}", event.format_simple())))
        };

        let report = medrag_knowledge::learn(config, &kb, &self.path, options, &progress).await?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&report)?);
            return Ok(());
        }

        println!(
            "Ingested {} documents ({} skipped) into '{}': {} chunks, {} records in {:.2}s",
            report.documents_read,
            report.documents_skipped,
            kb.name,
            report.chunks_created,
            report.records_written,
            report.duration_secs
        );
        println!(
            "Tokens per chunk: avg {:.1}, min {}, max {}",
            report.processing.average_tokens_per_chunk,
            report.processing.min_tokens,
            report.processing.max_tokens
        );
        if report.degraded_records > 0 {
            println!(
                "Warning: {} records have placeholder embeddings and will not be retrieved. Re-run ingest once the embedding provider is reachable.",
                report.degraded_records
            );
        }

        Ok(())
    }
}
