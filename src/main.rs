//! DiffGraph CLI entry point

use clap::{Parser, Subcommand};
use diffgraph_core::{Direction, MatchStrategy};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;

#[derive(Parser)]
#[command(name = "diffgraph")]
#[command(about = "Dependency diagrams for the changes in a git working tree", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Repository root path (defaults to current directory)
    #[arg(short, long, default_value = ".")]
    root: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyse uncommitted changes and write an HTML report
    Analyze {
        /// Report file to write
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Do not open the report in a browser
        #[arg(long)]
        no_open: bool,

        /// OpenAI API key
        #[arg(long)]
        api_key: Option<String>,

        /// Analysis provider (openai or local)
        #[arg(long)]
        provider: Option<String>,

        /// Model name for the provider
        #[arg(long)]
        model: Option<String>,

        /// Reference matching strategy (exact, substring or fuzzy)
        #[arg(long)]
        matching: Option<MatchStrategy>,

        /// Diagram direction (TD or LR)
        #[arg(long)]
        direction: Option<Direction>,

        /// Stop analysing once this many tokens are used
        #[arg(long)]
        max_tokens: Option<u64>,
    },
    /// Show where settings and the API key are read from
    Env,
    /// Show version
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(format!("diffgraph={}", log_level)))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("DiffGraph v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Repository root: {}", cli.root.display());

    match cli.command {
        Commands::Analyze {
            output,
            no_open,
            api_key,
            provider,
            model,
            matching,
            direction,
            max_tokens,
        } => {
            let overrides = config::Overrides {
                provider,
                model,
                api_key,
                matching,
                direction,
                max_tokens,
                output,
                no_open,
            };
            commands::analyze(cli.root, overrides).await
        }
        Commands::Env => commands::env(cli.root),
        Commands::Version => {
            println!("DiffGraph v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
