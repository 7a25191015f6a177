//! Reverse command handler
//!
//! Resolves a coordinate pair to a place name.

use super::init_logging;
use crate::config::Config;
use crate::coord::Coordinates;
use crate::error::Result;
use crate::geo::{get_geocoder, GeoBackend};
use clap::Args;

/// Reverse command arguments
#[derive(Args)]
pub struct ReverseArgs {
    /// Latitude
    #[arg(long, allow_hyphen_values = true)]
    pub lat: f64,

    /// Longitude
    #[arg(long, allow_hyphen_values = true)]
    pub lng: f64,
}

/// Run the reverse command
pub async fn run(args: ReverseArgs) -> Result<()> {
    init_logging("warn");

    let coords = Coordinates::new(args.lat, args.lng);
    coords.validate()?;
    let coords = coords.rounded();

    let config = Config::load()?;
    let geocoder = get_geocoder(&config.geocoder)?;

    match geocoder.reverse_geocode(coords).await? {
        Some(name) => println!("{}", name),
        None => println!("{}", config.messages.fallback_label),
    }

    Ok(())
}
