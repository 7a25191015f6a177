//! Locate command handler
//!
//! Resolves this machine's position the way a picker bootstraps: device
//! position first, the configured default location otherwise.

use super::init_logging;
use crate::config::Config;
use crate::error::Result;
use crate::geo::ip_location::IpLocator;
use crate::geo::locate::{GeolocationError, PositionOptions};
use crate::picker::bootstrap::message_for;
use clap::Args;
use tracing::debug;

/// Locate command arguments
#[derive(Args)]
pub struct LocateArgs {
    /// Ignore any cached location
    #[arg(long)]
    pub fresh: bool,
}

/// Run the locate command
pub async fn run(args: LocateArgs) -> Result<()> {
    init_logging("warn");

    let config = Config::load()?;
    let locator = IpLocator::new();
    if args.fresh {
        locator.clear_cache();
    }

    let options = PositionOptions::default();
    let located = tokio::time::timeout(options.timeout, locator.locate(options.maximum_age)).await;

    match located {
        Ok(Ok(location)) => {
            let coords = location.coordinates.rounded();
            println!("{}", location.display_name);
            println!("{}", coords);
        }
        Ok(Err(e)) => {
            debug!("ip location failed: {}", e);
            eprintln!("{}", message_for(GeolocationError::PositionUnavailable, &config.messages));
            print_default(&config);
        }
        Err(_) => {
            eprintln!("{}", message_for(GeolocationError::Timeout, &config.messages));
            print_default(&config);
        }
    }

    Ok(())
}

fn print_default(config: &Config) {
    let fallback = &config.picker.default_location;
    println!("{}", fallback.label);
    println!("{:.4}, {:.4}", fallback.lat, fallback.lng);
}
