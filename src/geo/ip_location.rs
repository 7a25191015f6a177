//! IP-based geolocation
//!
//! Uses ip-api.com as a [`PositionSource`] with file-based caching. A
//! cached answer is only reused while it is younger than the request's
//! `maximum_age`.

use crate::constants::api::IP_API_URL;
use crate::constants::geolocation::IP_LOCATION_CACHE_FILE;
use crate::coord::Coordinates;
use crate::error::{Error, Result};
use crate::geo::locate::{GeolocationError, PositionOptions, PositionSource};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::{Duration, SystemTime};
use tracing::{debug, warn};

/// A located position with a coarse place description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IpLocation {
    pub coordinates: Coordinates,
    /// City, region and country as reported by the lookup
    pub display_name: String,
}

/// IP location service with caching
#[derive(Debug)]
pub struct IpLocator {
    client: reqwest::Client,
    cache_path: Option<PathBuf>,
}

/// ip-api.com response
#[derive(Debug, Deserialize)]
struct IpApiResponse {
    status: String,
    lat: Option<f64>,
    lon: Option<f64>,
    city: Option<String>,
    #[serde(rename = "regionName")]
    region_name: Option<String>,
    country: Option<String>,
}

/// Cached location data
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CachedLocation {
    location: IpLocation,
    timestamp: u64,
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

impl IpLocator {
    /// Create a new IP locator with default cache path
    pub fn new() -> Self {
        let cache_path = dirs::cache_dir()
            .map(|p| p.join(crate::config::defaults::APP_DIR_NAME).join(IP_LOCATION_CACHE_FILE));

        Self {
            client: reqwest::Client::new(),
            cache_path,
        }
    }

    /// Create an IP locator with a specific cache path
    pub fn with_cache_path(cache_path: PathBuf) -> Self {
        Self {
            client: reqwest::Client::new(),
            cache_path: Some(cache_path),
        }
    }

    /// Create an IP locator without caching
    pub fn without_cache() -> Self {
        Self {
            client: reqwest::Client::new(),
            cache_path: None,
        }
    }

    /// Get current location based on IP address
    pub async fn locate(&self, maximum_age: Duration) -> Result<IpLocation> {
        if let Some(cached) = self.load_cache(maximum_age) {
            debug!("using cached IP location");
            return Ok(cached);
        }

        let location = self.fetch_location().await?;
        self.save_cache(&location);

        Ok(location)
    }

    /// Fetch location from ip-api.com
    async fn fetch_location(&self) -> Result<IpLocation> {
        let response = self
            .client
            .get(IP_API_URL)
            .send()
            .await
            .map_err(|e| Error::Geo(format!("IP location request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::Geo(format!(
                "IP location API returned status: {}",
                response.status()
            )));
        }

        let data: IpApiResponse = response
            .json()
            .await
            .map_err(|e| Error::Geo(format!("Failed to parse IP location response: {}", e)))?;

        Self::into_location(data)
    }

    fn into_location(data: IpApiResponse) -> Result<IpLocation> {
        if data.status != "success" {
            return Err(Error::Geo("IP location lookup failed".to_string()));
        }

        let lat = data.lat.ok_or_else(|| Error::Geo("No latitude in response".to_string()))?;
        let lng = data.lon.ok_or_else(|| Error::Geo("No longitude in response".to_string()))?;

        let display_name = [data.city, data.region_name, data.country]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(", ");

        Ok(IpLocation {
            coordinates: Coordinates::new(lat, lng),
            display_name: if display_name.is_empty() {
                "Unknown Location".to_string()
            } else {
                display_name
            },
        })
    }

    /// Load cached location if younger than `maximum_age`
    fn load_cache(&self, maximum_age: Duration) -> Option<IpLocation> {
        let cache_path = self.cache_path.as_ref()?;

        if !cache_path.exists() {
            return None;
        }

        let content = fs::read_to_string(cache_path).ok()?;
        let cached: CachedLocation = serde_json::from_str(&content).ok()?;

        if now_secs().saturating_sub(cached.timestamp) < maximum_age.as_secs() {
            Some(cached.location)
        } else {
            None
        }
    }

    /// Save location to cache
    fn save_cache(&self, location: &IpLocation) {
        let Some(cache_path) = &self.cache_path else {
            return;
        };

        if let Some(parent) = cache_path.parent() {
            let _ = fs::create_dir_all(parent);
        }

        let cached = CachedLocation {
            location: location.clone(),
            timestamp: now_secs(),
        };

        if let Ok(content) = serde_json::to_string_pretty(&cached) {
            let _ = fs::write(cache_path, content);
        }
    }

    /// Clear the cache
    pub fn clear_cache(&self) {
        if let Some(cache_path) = &self.cache_path {
            let _ = fs::remove_file(cache_path);
        }
    }
}

impl Default for IpLocator {
    fn default() -> Self {
        Self::new()
    }
}

impl PositionSource for IpLocator {
    async fn current_position(
        &self,
        options: &PositionOptions,
    ) -> std::result::Result<Coordinates, GeolocationError> {
        match self.locate(options.maximum_age).await {
            Ok(location) => Ok(location.coordinates),
            Err(e) => {
                warn!("IP geolocation failed: {}", e);
                Err(GeolocationError::PositionUnavailable)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn bangkok() -> IpLocation {
        IpLocation {
            coordinates: Coordinates::new(13.7563, 100.5018),
            display_name: "Bangkok, Thailand".to_string(),
        }
    }

    #[test]
    fn test_ip_locator_without_cache() {
        let locator = IpLocator::without_cache();
        assert!(locator.cache_path.is_none());
        assert!(locator.load_cache(Duration::from_secs(60)).is_none());
    }

    #[test]
    fn test_cache_operations() {
        let temp_dir = TempDir::new().unwrap();
        let cache_path = temp_dir.path().join("test_cache.json");
        let locator = IpLocator::with_cache_path(cache_path);

        assert!(locator.load_cache(Duration::from_secs(60)).is_none());

        locator.save_cache(&bangkok());

        let loaded = locator.load_cache(Duration::from_secs(60)).unwrap();
        assert_eq!(loaded, bangkok());

        // A zero maximum age never accepts a cached answer
        assert!(locator.load_cache(Duration::ZERO).is_none());

        locator.clear_cache();
        assert!(locator.load_cache(Duration::from_secs(60)).is_none());
    }

    #[test]
    fn test_stale_cache_is_ignored() {
        let temp_dir = TempDir::new().unwrap();
        let cache_path = temp_dir.path().join("stale.json");
        let cached = CachedLocation {
            location: bangkok(),
            timestamp: now_secs() - 120,
        };
        fs::write(&cache_path, serde_json::to_string(&cached).unwrap()).unwrap();

        let locator = IpLocator::with_cache_path(cache_path);
        assert!(locator.load_cache(Duration::from_secs(60)).is_none());
        assert!(locator.load_cache(Duration::from_secs(600)).is_some());
    }

    #[test]
    fn test_into_location() {
        let ok: IpApiResponse = serde_json::from_str(
            r#"{"status":"success","lat":13.75,"lon":100.5,"city":"Bangkok","regionName":"Bangkok","country":"Thailand"}"#,
        )
        .unwrap();
        let location = IpLocator::into_location(ok).unwrap();
        assert_eq!(location.display_name, "Bangkok, Bangkok, Thailand");

        let failed: IpApiResponse = serde_json::from_str(r#"{"status":"fail"}"#).unwrap();
        assert!(IpLocator::into_location(failed).is_err());
    }
}
