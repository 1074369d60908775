//! Search command handler: retrieval without generation.

use super::collection_config;
use clap::Args;
use medrag_core::config::AppConfig;
use medrag_knowledge::rag::context::excerpt;

/// Show the passages a query retrieves
#[derive(Args, Debug)]
pub struct SearchCommand {
    /// Query text
    pub query: String,

    /// Number of passages to return
    #[arg(short = 'n', long)]
    pub n_results: Option<usize>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl SearchCommand {
    pub async fn execute(&self, config: &AppConfig) -> anyhow::Result<()> {
        tracing::info!("Executing search command");

        let kb = collection_config(config, self.n_results)?;
        let index = medrag_knowledge::open_collection(config, &kb)?;
        let results = index.search(&self.query, kb.n_results).await?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&results)?);
            return Ok(());
        }

        if results.is_empty() {
            println!("No passages found in collection '{}'.", kb.name);
            return Ok(());
        }

        for (i, result) in results.iter().enumerate() {
            println!(
                "{}. {} [{}] relevance {:.3} (distance {:.3})",
                i + 1,
                result.metadata.title,
                result.id,
                result.relevance_score,
                result.distance
            );
            println!("   {}", excerpt(&result.content));
        }

        Ok(())
    }
}
