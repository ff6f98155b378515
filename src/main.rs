use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod pipelines;

/// The main entry point for the Aftershock analysis application.
#[tokio::main]
async fn main() {
    // Load environment variables from a .env file, if one exists.
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Parse command-line arguments
    let cli = Cli::parse();

    // Load and validate the configuration file.
    let mut config = match configuration::load_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };
    // The API key is usually kept out of the config file and injected from
    // the environment at startup.
    if config.api.api_key.is_none() {
        config.api.api_key = std::env::var("COINGECKO_API_KEY").ok();
    }

    // Execute the appropriate command
    let result = match cli.command {
        Commands::Drawdown(args) => {
            pipelines::run_drawdown(&config, args.snapshot.as_deref()).await
        }
        Commands::Anchor => pipelines::run_anchor(&config).await,
        Commands::Scatter => pipelines::run_scatter(&config).await,
    };
    if let Err(e) = result {
        eprintln!("Pipeline failed: {:#}", e);
        std::process::exit(1);
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Event-relative market performance aggregation.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Average performance after sharp aggregate market-cap drops.
    Drawdown(DrawdownArgs),

    /// Performance of traditional and crypto assets since the anchor date.
    Anchor,

    /// Per-asset change since a historical date, against market cap.
    Scatter,
}

#[derive(Parser)]
struct DrawdownArgs {
    /// Rerun offline from a previously persisted raw-data snapshot instead
    /// of fetching.
    #[arg(long)]
    snapshot: Option<PathBuf>,
}
