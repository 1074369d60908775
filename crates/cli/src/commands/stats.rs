//! Stats command handler.

use clap::Args;
use medrag_core::config::AppConfig;
use medrag_knowledge::SystemStats;

/// Show collection statistics
#[derive(Args, Debug)]
pub struct StatsCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl StatsCommand {
    pub fn execute(&self, config: &AppConfig) -> anyhow::Result<()> {
        tracing::info!("Executing stats command");

        let stats = medrag_knowledge::collection_stats(config, &config.collection)?;
        let degraded = stats.degraded_records;
        let system = SystemStats::from(stats);

        if self.json {
            println!("{}", serde_json::to_string_pretty(&system)?);
        } else {
            println!("Collection: {}", system.collection_name);
            println!("Passages:   {}", system.total_documents);
            println!("Status:     {}", system.system_status.as_str());
            if degraded > 0 {
                println!("Degraded:   {} (not retrievable, re-run ingest)", degraded);
            }
            println!("Index:      {}", config.index_path().display());
        }

        Ok(())
    }
}
