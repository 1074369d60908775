//! Command handlers for the MedRAG CLI.

pub mod ask;
pub mod chat;
pub mod clear;
pub mod ingest;
pub mod search;
pub mod stats;

pub use ask::AskCommand;
pub use chat::ChatCommand;
pub use clear::ClearCommand;
pub use ingest::IngestCommand;
pub use search::SearchCommand;
pub use stats::StatsCommand;

use anyhow::Context;
use medrag_core::config::AppConfig;
use medrag_knowledge::{config as kb_config, AnswerBundle, KnowledgeBaseConfig, RagAssistant};
use std::sync::Arc;

/// Collection config for the active collection, with an optional result-count override.
pub(crate) fn collection_config(
    config: &AppConfig,
    n_results: Option<usize>,
) -> anyhow::Result<KnowledgeBaseConfig> {
    let mut kb = kb_config::load_config(&config.workspace, &config.collection)
        .with_context(|| format!("Failed to load collection '{}'", config.collection))?;
    if let Some(n) = n_results {
        kb.n_results = n;
    }
    Ok(kb)
}

/// Open the active collection and build the assistant over it.
pub(crate) fn open_assistant(
    config: &AppConfig,
    n_results: Option<usize>,
) -> anyhow::Result<RagAssistant> {
    config.validate()?;
    let kb = collection_config(config, n_results)?;
    let index = medrag_knowledge::open_collection(config, &kb)
        .with_context(|| format!("Failed to open collection '{}'", kb.name))?;
    let assistant = medrag_knowledge::create_assistant(config, &kb, Arc::new(index))?;
    Ok(assistant)
}

/// Human-readable rendering of an answer and its sources.
pub(crate) fn print_answer(bundle: &AnswerBundle) {
    println!("{}", bundle.response);
    println!();

    if bundle.citations.is_empty() {
        println!("Sources: (none)");
    } else {
        println!("Sources:");
        for citation in &bundle.citations {
            println!(
                "[{}] {} ({:.2})",
                citation.number, citation.title, citation.score
            );
            if !citation.url.is_empty() {
                println!("    {}", citation.url);
            }
            println!("    {}", citation.excerpt);
        }
    }
}
