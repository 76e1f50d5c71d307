//! skillroute CLI: the main entry point.
//!
//! Commands:
//! - `index`: Rebuild the persisted catalog index
//! - `route`: Route a query and print the outcome
//! - `context`: Accept a host's agent pick and print the enriched prompt
//! - `agents`: List catalog agents
//! - `validate`: Lint catalog definition files
//! - `serve`: Start the HTTP tool surface
//! - `status`: Show configuration, catalog, and index summary

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(
    name = "skillroute",
    about = "skillroute: semantic agent router with dynamic context enrichment",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (defaults to ~/.skillroute/config.toml)
    #[arg(short, long, global = true, env = "SKILLROUTE_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Rebuild the persisted catalog index
    Index,

    /// Route a query through the full pipeline
    Route {
        query: String,

        /// Earlier conversation turns, oldest first (repeatable)
        #[arg(long = "history")]
        history: Vec<String>,
    },

    /// Resolve a query to a host-chosen agent and print the enriched prompt
    Context {
        agent: String,
        query: String,

        /// Earlier conversation turns, oldest first (repeatable)
        #[arg(long = "history")]
        history: Vec<String>,
    },

    /// List catalog agents
    Agents,

    /// Lint catalog definition files
    Validate,

    /// Start the HTTP tool surface
    Serve {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Show configuration, catalog, and index summary
    Status,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = commands::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Index => commands::index::run(&config).await?,
        Commands::Route { query, history } => commands::route::run(&config, query, history).await?,
        Commands::Context { agent, query, history } => {
            commands::context::run(&config, &agent, &query, &history).await?
        }
        Commands::Agents => commands::agents::run(&config)?,
        Commands::Validate => commands::validate::run(&config)?,
        Commands::Serve { port } => commands::serve::run(config, port).await?,
        Commands::Status => commands::status::run(&config, cli.config.as_deref()).await?,
    }

    Ok(())
}
