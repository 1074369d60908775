//! Interactive chat loop.

use super::{open_assistant, print_answer};
use clap::Args;
use medrag_core::config::AppConfig;
use medrag_knowledge::{SystemStats, SystemStatus};
use std::io::{BufRead, Write};

const EXIT_WORDS: &[&str] = &["exit", "quit", "יציאה"];
const STATS_WORDS: &[&str] = &["stats", "סטטיסטיקות"];

/// Interactive question loop
#[derive(Args, Debug)]
pub struct ChatCommand {
    /// Number of passages to retrieve per question
    #[arg(short = 'n', long)]
    pub n_results: Option<usize>,

    /// Show retrieval details after every answer
    #[arg(long)]
    pub debug: bool,
}

impl ChatCommand {
    pub async fn execute(&self, config: &AppConfig) -> anyhow::Result<()> {
        tracing::info!("Executing chat command");

        let assistant = open_assistant(config, self.n_results)?;

        let stats = assistant.get_system_stats();
        if stats.system_status != SystemStatus::Ready {
            anyhow::bail!(
                "Collection '{}' has no documents. Run `medrag ingest <path>` first.",
                config.collection
            );
        }

        println!("MedRAG - {} ({})", config.assistant.domain, config.assistant.institution);
        println!("Type 'exit' or 'יציאה' to leave, 'stats' or 'סטטיסטיקות' for system details.");
        println!("Ready with {} indexed passages.", stats.total_documents);
        println!();

        let stdin = std::io::stdin();
        let mut lines = stdin.lock().lines();

        loop {
            print!("> ");
            std::io::stdout().flush()?;

            let Some(line) = lines.next() else {
                break;
            };
            let query = line?;
            let query = query.trim();

            if query.is_empty() {
                continue;
            }
            if EXIT_WORDS.contains(&query.to_lowercase().as_str()) {
                break;
            }
            if STATS_WORDS.contains(&query.to_lowercase().as_str()) {
                print_stats(&assistant.get_system_stats());
                continue;
            }

            let bundle = assistant.ask(query, self.debug).await;
            println!();
            print_answer(&bundle);
            if let Some(error) = &bundle.retrieval_error {
                println!("(retrieval error: {})", error);
            }
            println!();
        }

        tracing::info!("Chat session ended");
        Ok(())
    }
}

fn print_stats(stats: &SystemStats) {
    println!("Collection: {}", stats.collection_name);
    println!("Passages:   {}", stats.total_documents);
    println!("Status:     {}", stats.system_status.as_str());
}
