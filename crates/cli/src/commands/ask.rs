//! Ask command handler.

use super::{open_assistant, print_answer};
use clap::Args;
use medrag_core::config::AppConfig;

/// Ask a single question
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question
    pub query: String,

    /// Number of passages to retrieve
    #[arg(short = 'n', long)]
    pub n_results: Option<usize>,

    /// Include retrieved passages, context and guard findings
    #[arg(long)]
    pub debug: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    pub async fn execute(&self, config: &AppConfig) -> anyhow::Result<()> {
        tracing::info!("Executing ask command");

        let assistant = open_assistant(config, self.n_results)?;
        let bundle = assistant.ask(&self.query, self.debug).await;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&bundle)?);
            return Ok(());
        }

        print_answer(&bundle);

        if self.debug {
            println!();
            if let Some(error) = &bundle.retrieval_error {
                println!("Retrieval error: {}", error);
            }
            if let Some(guard) = &bundle.guard {
                if guard.override_attempt() {
                    println!("Override phrases: {}", guard.override_phrases.join(", "));
                }
                if guard.recommendation_appended {
                    println!("Consultation recommendation appended");
                }
            }
            if let Some(context) = &bundle.context {
                println!("--- context ---");
                println!("{}", context);
            }
        }

        Ok(())
    }
}
