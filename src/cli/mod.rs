//! CLI command handlers
//!
//! Each subcommand has its own module with handler functions.

pub mod config;
pub mod locate;
pub mod pick;
pub mod reverse;
pub mod search;
pub mod serve;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

/// Address picker engine
#[derive(Parser)]
#[command(name = "geopick")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Search for addresses
    Search(search::SearchArgs),

    /// Resolve coordinates to an address
    Reverse(reverse::ReverseArgs),

    /// Locate this machine
    Locate(locate::LocateArgs),

    /// Run an interactive picker session
    Pick(pick::PickArgs),

    /// Start web server (foreground)
    Serve(serve::ServeArgs),

    /// Manage configuration
    Config(config::ConfigArgs),
}

/// Install the log subscriber; `RUST_LOG` overrides `default`
pub fn init_logging(default: &str) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

/// Run the CLI
pub async fn run() -> crate::error::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Search(args) => search::run(args).await,
        Commands::Reverse(args) => reverse::run(args).await,
        Commands::Locate(args) => locate::run(args).await,
        Commands::Pick(args) => pick::run(args).await,
        Commands::Serve(args) => serve::run(args).await,
        Commands::Config(args) => config::run(args),
    }
}
