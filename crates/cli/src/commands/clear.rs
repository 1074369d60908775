//! Clear command handler.

use super::collection_config;
use clap::Args;
use medrag_core::config::AppConfig;
use std::io::Write;

/// Delete every record of the collection
#[derive(Args, Debug)]
pub struct ClearCommand {
    /// Skip confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

impl ClearCommand {
    pub fn execute(&self, config: &AppConfig) -> anyhow::Result<()> {
        tracing::info!("Executing clear command");

        if !self.yes && !confirm(&config.collection)? {
            println!("Aborted.");
            return Ok(());
        }

        let kb = collection_config(config, None)?;
        let index = medrag_knowledge::open_collection(config, &kb)?;
        index.clear()?;
        index.close()?;

        println!("Collection '{}' cleared", kb.name);
        Ok(())
    }
}

fn confirm(collection: &str) -> anyhow::Result<bool> {
    print!("Delete every record of collection '{}'? [y/N] ", collection);
    std::io::stdout().flush()?;

    let mut answer = String::new();
    std::io::stdin().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}
