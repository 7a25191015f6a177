//! Server shared state
//!
//! Holds configuration and the geocoding backends shared by all requests.

use crate::config::Config;
use crate::error::Result;
use crate::geo::get_geocoder;
use crate::geo::ip_location::IpLocator;
use crate::geo::nominatim::NominatimBackend;
use std::time::Instant;

/// Shared state for the HTTP server
pub struct AppState {
    /// Configuration
    pub config: Config,

    /// Forward and reverse geocoder
    pub geocoder: NominatimBackend,

    /// Position source for `/api/location`
    pub locator: IpLocator,

    started: Instant,
}

impl AppState {
    /// Create application state with backends built from the config
    pub fn new(config: Config) -> Result<Self> {
        let geocoder = get_geocoder(&config.geocoder)?;
        Ok(Self::with_backends(config, geocoder, IpLocator::new()))
    }

    pub fn with_backends(config: Config, geocoder: NominatimBackend, locator: IpLocator) -> Self {
        Self {
            config,
            geocoder,
            locator,
            started: Instant::now(),
        }
    }

    /// Seconds since the state was created
    pub fn uptime_secs(&self) -> u64 {
        self.started.elapsed().as_secs()
    }
}
