//! docsbot CLI
//!
//! Main entry point. Answers documentation questions from the command line or
//! from a stream of chat messages.

mod commands;

use clap::{Parser, Subcommand};
use commands::{AskCommand, ListenCommand};
use docsbot_core::{config::AppConfig, logging, AppResult};
use std::path::PathBuf;
use tracing::Instrument;

/// docsbot - grounded answers from your documentation
#[derive(Parser, Debug)]
#[command(name = "docsbot")]
#[command(about = "Grounded answers from a documentation corpus", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, global = true, env = "DOCSBOT_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long, global = true, env = "DOCSBOT_CONFIG")]
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

    /// LLM provider (openai, ollama, mock)
    #[arg(short, long, global = true, env = "DOCSBOT_PROVIDER")]
    provider: Option<String>,

    /// Model identifier
    #[arg(short, long, global = true, env = "DOCSBOT_MODEL")]
    model: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Answer one question
    Ask(AskCommand),

    /// Answer chat messages read from stdin (JSON lines)
    Listen(ListenCommand),
}

#[tokio::main]
async fn main() -> AppResult<()> {
    let cli = Cli::parse();

    // Workspace and config file decide which YAML is merged, so they go first
    let config = AppConfig::load_with(cli.workspace, cli.config)?.with_overrides(
        cli.provider,
        cli.model,
        cli.log_level,
        cli.verbose,
        cli.no_color,
    );

    // Logs go to stderr; stdout carries replies
    logging::init_logging(config.log_level.as_deref(), config.no_color, config.log_json)?;

    let command_name = match &cli.command {
        Commands::Ask(_) => "ask",
        Commands::Listen(_) => "listen",
    };
    tracing::debug!(
        workspace = %config.workspace.display(),
        provider = %config.provider,
        model = %config.model,
        corpus = %config.dataset_path().display(),
        "docsbot {} starting",
        env!("CARGO_PKG_VERSION")
    );

    let span = tracing::info_span!("command", name = command_name);
    let result = match cli.command {
        Commands::Ask(cmd) => cmd.execute(&config).instrument(span).await,
        Commands::Listen(cmd) => cmd.execute(&config).instrument(span).await,
    };

    if let Err(e) = &result {
        tracing::error!("{} failed: {}", command_name, e);
    }

    result
}
