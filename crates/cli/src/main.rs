//! MedRAG CLI
//!
//! Entry point for the `medrag` command-line tool: ingest documents into a
//! collection and ask questions answered from it.

mod commands;

use clap::{Parser, Subcommand};
use commands::{AskCommand, ChatCommand, ClearCommand, IngestCommand, SearchCommand, StatsCommand};
use medrag_core::{config::AppConfig, logging};
use std::path::PathBuf;

/// MedRAG - answers medical questions from a curated document collection
#[derive(Parser, Debug)]
#[command(name = "medrag")]
#[command(about = "Retrieval-augmented answers from a curated medical document collection", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, global = true, env = "MEDRAG_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long, global = true, env = "MEDRAG_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    /// Generation provider (openai, ollama)
    #[arg(short, long, global = true, env = "MEDRAG_PROVIDER")]
    provider: Option<String>,

    /// Generation model identifier
    #[arg(short, long, global = true, env = "MEDRAG_MODEL")]
    model: Option<String>,

    /// Collection to read from and write to
    #[arg(long, global = true, env = "MEDRAG_COLLECTION")]
    collection: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Load documents, chunk them and build the index
    Ingest(IngestCommand),

    /// Ask a single question
    Ask(AskCommand),

    /// Interactive question loop
    Chat(ChatCommand),

    /// Show the passages a query retrieves, without generation
    Search(SearchCommand),

    /// Show collection statistics
    Stats(StatsCommand),

    /// Delete every record of the collection
    Clear(ClearCommand),
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Self::Ingest(_) => "ingest",
            Self::Ask(_) => "ask",
            Self::Chat(_) => "chat",
            Self::Search(_) => "search",
            Self::Stats(_) => "stats",
            Self::Clear(_) => "clear",
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load()?.with_overrides(
        cli.workspace,
        cli.config,
        cli.provider,
        cli.model,
        cli.collection,
        cli.log_level,
        cli.verbose,
        cli.no_color,
    );

    logging::init_logging(config.log_level.as_deref(), config.no_color)?;

    tracing::info!("MedRAG CLI starting");
    tracing::debug!("Workspace: {:?}", config.workspace);
    tracing::debug!("Provider: {}", config.provider);
    tracing::debug!("Model: {}", config.model);
    tracing::debug!("Collection: {}", config.collection);

    let _span = tracing::info_span!("command", name = cli.command.name()).entered();

    let result = match cli.command {
        Commands::Ingest(cmd) => cmd.execute(&config).await,
        Commands::Ask(cmd) => cmd.execute(&config).await,
        Commands::Chat(cmd) => cmd.execute(&config).await,
        Commands::Search(cmd) => cmd.execute(&config).await,
        Commands::Stats(cmd) => cmd.execute(&config),
        Commands::Clear(cmd) => cmd.execute(&config),
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {:#}", e),
    }

    result
}
