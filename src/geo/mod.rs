//! Geocoding module
//!
//! Provides forward geocoding (free text to ranked candidates), reverse
//! geocoding (coordinates to a display name) and device geolocation.

pub mod ip_location;
pub mod locate;
pub mod nominatim;

use crate::config::GeocoderConfig;
use crate::coord::Coordinates;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::future::Future;

/// A forward-geocoding candidate
///
/// Only `display_name` and `coordinates` feed back into picker state; the
/// rest is carried for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Display name (full address)
    pub display_name: String,
    /// Location of the candidate, as returned by the service
    pub coordinates: Coordinates,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub place_id: Option<u64>,
    /// Place type (e.g. "house", "city")
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub importance: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
    /// [south, north, west, east]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bounding_box: Option<[f64; 4]>,
}

impl SearchResult {
    /// Create a result with no metadata
    pub fn new(display_name: impl Into<String>, coordinates: Coordinates) -> Self {
        Self {
            display_name: display_name.into(),
            coordinates,
            place_id: None,
            kind: None,
            importance: None,
            address_type: None,
            class: None,
            bounding_box: None,
        }
    }
}

/// Trait for geocoding backends
pub trait GeoBackend: Send + Sync {
    /// Short backend name for status output
    fn name(&self) -> &'static str;

    /// Search for up to `limit` ranked candidates matching `query`
    fn search(
        &self,
        query: &str,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<SearchResult>>> + Send;

    /// Reverse geocode coordinates to a display name
    ///
    /// `Ok(None)` means the service answered but had no name for the point.
    fn reverse_geocode(
        &self,
        coords: Coordinates,
    ) -> impl Future<Output = Result<Option<String>>> + Send;

    /// Geocode a location string to its single best match
    fn geocode(&self, query: &str) -> impl Future<Output = Result<Option<SearchResult>>> + Send {
        async move { Ok(self.search(query, 1).await?.into_iter().next()) }
    }
}

/// Get the geocoding backend described by the config
pub fn get_geocoder(config: &GeocoderConfig) -> Result<nominatim::NominatimBackend> {
    nominatim::NominatimBackend::from_config(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_result_serialization() {
        let mut result = SearchResult::new("Bangkok, Thailand", Coordinates::new(13.7563, 100.5018));
        result.kind = Some("city".to_string());

        let json = serde_json::to_string(&result).unwrap();
        assert!(json.contains("\"type\":\"city\""));
        assert!(!json.contains("place_id"));

        let parsed: SearchResult = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, result);
    }
}
