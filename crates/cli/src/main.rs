//! docqa CLI
//!
//! Main entry point for the docqa command-line tool.
//! Turns a document into question/answer pairs with a local or hosted model.

mod commands;

use clap::{Parser, Subcommand};
use commands::{ChunksCommand, GenerateCommand, PromptsCommand, QuestionsCommand};
use docqa_core::{config::AppConfig, logging};
use std::path::PathBuf;

/// docqa - generate question/answer pairs from documents
#[derive(Parser, Debug)]
#[command(name = "docqa")]
#[command(about = "Generate question/answer pairs from documents", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, global = true, env = "DOCQA_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long, global = true, env = "DOCQA_CONFIG")]
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

    /// Generation provider (ollama, openai)
    #[arg(short, long, global = true, env = "DOCQA_PROVIDER")]
    provider: Option<String>,

    /// Generation model identifier
    #[arg(short, long, global = true, env = "DOCQA_MODEL")]
    model: Option<String>,

    /// Embedding provider (trigram, ollama, openai)
    #[arg(long, global = true, env = "DOCQA_EMBEDDING_PROVIDER")]
    embedding_provider: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate answered questions from a document
    Generate(GenerateCommand),

    /// Generate questions only, without answering them
    Questions(QuestionsCommand),

    /// Show how a document is chunked
    Chunks(ChunksCommand),

    /// List available prompts
    Prompts(PromptsCommand),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command-line arguments first (needed for logging config)
    let cli = Cli::parse();

    let config = AppConfig::load()?.with_overrides(
        cli.workspace,
        cli.config,
        cli.provider,
        cli.model,
        cli.embedding_provider,
        cli.log_level,
        cli.verbose,
        cli.no_color,
    );

    logging::init_logging(config.log_level.as_deref(), config.no_color)?;

    tracing::info!("docqa starting");
    tracing::debug!("Workspace: {:?}", config.workspace);
    tracing::debug!("Provider: {} (model: {})", config.provider, config.model);
    tracing::debug!("Embedding provider override: {:?}", config.embedding_provider);

    let command_name = match &cli.command {
        Commands::Generate(_) => "generate",
        Commands::Questions(_) => "questions",
        Commands::Chunks(_) => "chunks",
        Commands::Prompts(_) => "prompts",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    let result = match cli.command {
        Commands::Generate(cmd) => cmd.execute(&config).await,
        Commands::Questions(cmd) => cmd.execute(&config).await,
        Commands::Chunks(cmd) => cmd.execute(&config),
        Commands::Prompts(cmd) => cmd.execute(&config),
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {:#}", e),
    }

    result
}
