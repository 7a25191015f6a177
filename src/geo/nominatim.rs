//! Nominatim geocoding backend (OpenStreetMap)
//!
//! Uses the free Nominatim API for search and reverse lookups.
//! Usage policy requires an identifying User-Agent.

use crate::config::GeocoderConfig;
use crate::constants::api::{NOMINATIM_URL, REVERSE_ZOOM, USER_AGENT};
use crate::coord::Coordinates;
use crate::error::{Error, Result};
use crate::geo::{GeoBackend, SearchResult};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// Nominatim geocoding backend
#[derive(Debug, Clone)]
pub struct NominatimBackend {
    client: reqwest::Client,
    base_url: String,
}

/// Nominatim search response item
#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
    display_name: String,
    #[serde(default)]
    place_id: Option<u64>,
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    importance: Option<f64>,
    #[serde(default)]
    addresstype: Option<String>,
    #[serde(default)]
    class: Option<String>,
    #[serde(default)]
    boundingbox: Option<Vec<String>>,
}

/// Nominatim reverse response; only the name is consumed
#[derive(Debug, Deserialize)]
struct NominatimReverse {
    #[serde(default)]
    display_name: Option<String>,
}

impl NominatimBackend {
    /// Create a backend against the public Nominatim instance
    pub fn new() -> Result<Self> {
        Self::with_base_url(NOMINATIM_URL, USER_AGENT, Duration::from_secs(10))
    }

    /// Create a backend against a specific Nominatim instance
    pub fn with_base_url(base_url: &str, user_agent: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Create a backend from the `[geocoder]` config section
    pub fn from_config(config: &GeocoderConfig) -> Result<Self> {
        Self::with_base_url(
            &config.base_url,
            &config.user_agent,
            Duration::from_secs(config.timeout_secs),
        )
    }

    /// Build the search URL for a query
    pub fn search_url(&self, query: &str, limit: usize) -> String {
        format!(
            "{}/search?format=json&q={}&limit={}&addressdetails=1",
            self.base_url,
            urlencoding::encode(query),
            limit
        )
    }

    /// Build the reverse lookup URL for a coordinate pair
    pub fn reverse_url(&self, coords: Coordinates) -> String {
        format!(
            "{}/reverse?format=json&lat={}&lon={}&zoom={}&addressdetails=1",
            self.base_url, coords.lat, coords.lng, REVERSE_ZOOM
        )
    }

    /// Parse lat/lng strings to f64
    fn parse_coords(lat: &str, lng: &str) -> Result<Coordinates> {
        let lat: f64 = lat
            .parse()
            .map_err(|_| Error::Geo(format!("Invalid latitude: {}", lat)))?;
        let lng: f64 = lng
            .parse()
            .map_err(|_| Error::Geo(format!("Invalid longitude: {}", lng)))?;
        Ok(Coordinates::new(lat, lng))
    }

    fn into_result(place: NominatimPlace) -> Result<SearchResult> {
        let coordinates = Self::parse_coords(&place.lat, &place.lon)?;

        let bounding_box = place.boundingbox.and_then(|bb| {
            let parsed: Vec<f64> = bb.iter().filter_map(|v| v.parse().ok()).collect();
            <[f64; 4]>::try_from(parsed).ok()
        });

        Ok(SearchResult {
            display_name: place.display_name,
            coordinates,
            place_id: place.place_id,
            kind: place.kind,
            importance: place.importance,
            address_type: place.addresstype,
            class: place.class,
            bounding_box,
        })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::Geocoding(format!("Nominatim request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::Geocoding(format!(
                "Nominatim returned status: {}",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| Error::Geocoding(format!("Failed to parse Nominatim response: {}", e)))
    }
}

impl GeoBackend for NominatimBackend {
    fn name(&self) -> &'static str {
        "nominatim"
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>> {
        let url = self.search_url(query, limit);
        debug!(%url, "nominatim search");

        let places: Vec<NominatimPlace> = self.get_json(&url).await?;

        // Skip individual malformed rows rather than failing the whole list
        Ok(places
            .into_iter()
            .filter_map(|p| Self::into_result(p).ok())
            .collect())
    }

    async fn reverse_geocode(&self, coords: Coordinates) -> Result<Option<String>> {
        let url = self.reverse_url(coords);
        debug!(%url, "nominatim reverse");

        let result: NominatimReverse = self.get_json(&url).await?;
        Ok(result.display_name.filter(|name| !name.trim().is_empty()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend() -> NominatimBackend {
        NominatimBackend::with_base_url("https://geo.example.org/", "geopick-test", Duration::from_secs(1))
            .unwrap()
    }

    #[test]
    fn test_parse_coords() {
        let c = NominatimBackend::parse_coords("13.7563", "100.5018").unwrap();
        assert!((c.lat - 13.7563).abs() < 0.0001);
        assert!((c.lng - 100.5018).abs() < 0.0001);
    }

    #[test]
    fn test_parse_coords_invalid() {
        assert!(NominatimBackend::parse_coords("invalid", "0").is_err());
        assert!(NominatimBackend::parse_coords("0", "invalid").is_err());
    }

    #[test]
    fn test_search_url() {
        let url = backend().search_url("100 Bangkok", 5);
        assert_eq!(
            url,
            "https://geo.example.org/search?format=json&q=100%20Bangkok&limit=5&addressdetails=1"
        );
    }

    #[test]
    fn test_reverse_url() {
        let url = backend().reverse_url(Coordinates::new(13.7367, 100.5232));
        assert_eq!(
            url,
            "https://geo.example.org/reverse?format=json&lat=13.7367&lon=100.5232&zoom=14&addressdetails=1"
        );
    }

    #[test]
    fn test_place_conversion() {
        let json = r#"[{
            "place_id": 123,
            "lat": "13.7465",
            "lon": "100.5348",
            "display_name": "Siam, Pathum Wan, Bangkok",
            "type": "suburb",
            "importance": 0.52,
            "addresstype": "suburb",
            "class": "place",
            "boundingbox": ["13.73", "13.76", "100.52", "100.55"]
        }, {
            "lat": "13.7",
            "lon": "100.5",
            "display_name": "Minimal"
        }]"#;

        let places: Vec<NominatimPlace> = serde_json::from_str(json).unwrap();
        let results: Vec<SearchResult> = places
            .into_iter()
            .map(|p| NominatimBackend::into_result(p).unwrap())
            .collect();

        assert_eq!(results[0].place_id, Some(123));
        assert_eq!(results[0].kind.as_deref(), Some("suburb"));
        assert_eq!(results[0].bounding_box, Some([13.73, 13.76, 100.52, 100.55]));
        assert_eq!(results[1].display_name, "Minimal");
        assert!(results[1].bounding_box.is_none());
    }

    #[test]
    fn test_reverse_without_name() {
        let parsed: NominatimReverse = serde_json::from_str(r#"{"error":"Unable to geocode"}"#).unwrap();
        assert!(parsed.display_name.is_none());
    }

    #[test]
    fn test_backend_creation() {
        let backend = NominatimBackend::new().unwrap();
        assert!(format!("{:?}", backend).contains("NominatimBackend"));
        assert_eq!(backend.name(), "nominatim");
    }
}
