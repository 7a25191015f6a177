//! Search command handler
//!
//! Forward-geocodes free text and lists the ranked candidates.

use super::init_logging;
use crate::config::Config;
use crate::error::Result;
use crate::geo::{get_geocoder, GeoBackend};
use clap::Args;

/// Search command arguments
#[derive(Args)]
pub struct SearchArgs {
    /// Free-text address or place name
    pub query: String,

    /// Maximum number of results (defaults to picker.search_limit)
    #[arg(long, short = 'l')]
    pub limit: Option<usize>,

    /// Print results as JSON
    #[arg(long)]
    pub json: bool,
}

/// Run the search command
pub async fn run(args: SearchArgs) -> Result<()> {
    init_logging("warn");

    let config = Config::load()?;
    let geocoder = get_geocoder(&config.geocoder)?;
    let limit = args.limit.unwrap_or(config.picker.search_limit).max(1);

    let results = geocoder.search(args.query.trim(), limit).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }

    if results.is_empty() {
        println!("No address found");
        return Ok(());
    }

    for (i, result) in results.iter().enumerate() {
        println!("{}. {}", i + 1, result.display_name);
        println!("   {}", result.coordinates.rounded());
    }

    Ok(())
}
