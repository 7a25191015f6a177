//! Configuration management
//!
//! Loads and saves configuration from XDG-compliant paths.
//! Config location: ~/.config/geopick/config.toml

pub mod defaults;

use crate::constants::{api, geo, picker};
use crate::error::{Error, Result};
use defaults::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Geocoding service settings
    #[serde(default)]
    pub geocoder: GeocoderConfig,

    /// Picker timing and behavior
    #[serde(default)]
    pub picker: PickerConfig,

    /// Map widget settings
    #[serde(default)]
    pub map: MapConfig,

    /// Server settings
    #[serde(default)]
    pub server: ServerConfig,

    /// User-facing messages
    #[serde(default)]
    pub messages: MessagesConfig,
}

/// Geocoding service settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeocoderConfig {
    /// Nominatim-compatible base URL
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// User agent sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "default_geocoder_timeout")]
    pub timeout_secs: u64,
}

/// Picker timing and behavior
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PickerConfig {
    #[serde(default = "default_reverse_debounce")]
    pub reverse_debounce_ms: u64,

    #[serde(default = "default_search_debounce")]
    pub search_debounce_ms: u64,

    /// Suggestions requested per search
    #[serde(default = "default_search_limit")]
    pub search_limit: usize,

    #[serde(default = "default_pin_throttle")]
    pub pin_throttle_ms: u64,

    /// Lifetime of transient notices
    #[serde(default = "default_notice")]
    pub notice_ms: u64,

    /// Recenter when a new point is farther than this from the view center
    #[serde(default = "default_recenter_threshold")]
    pub recenter_threshold_m: f64,

    /// Pan threshold for numeric coordinate edits
    #[serde(default = "default_pan_threshold")]
    pub pan_threshold_m: f64,

    /// Location used when geolocation is unavailable
    #[serde(default)]
    pub default_location: DefaultLocationConfig,
}

/// Fallback location
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultLocationConfig {
    #[serde(default = "default_lat")]
    pub lat: f64,

    #[serde(default = "default_lng")]
    pub lng: f64,

    #[serde(default = "default_label")]
    pub label: String,
}

/// Map widget settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapConfig {
    #[serde(default = "default_tile_url")]
    pub tile_url: String,

    #[serde(default = "default_attribution")]
    pub attribution: String,

    #[serde(default = "default_zoom")]
    pub zoom: u8,

    #[serde(default = "default_min_zoom")]
    pub min_zoom: u8,

    #[serde(default = "default_max_zoom")]
    pub max_zoom: u8,
}

/// Server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

/// User-facing messages, overridable for localization
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessagesConfig {
    #[serde(default = "default_msg_unsupported")]
    pub unsupported: String,

    #[serde(default = "default_msg_permission_denied")]
    pub permission_denied: String,

    #[serde(default = "default_msg_position_unavailable")]
    pub position_unavailable: String,

    #[serde(default = "default_msg_timeout")]
    pub timeout: String,

    #[serde(default = "default_msg_unknown")]
    pub unknown: String,

    #[serde(default = "default_label_current_location")]
    pub current_location: String,

    #[serde(default = "default_label_fallback")]
    pub fallback_label: String,

    #[serde(default = "default_msg_no_address_found")]
    pub no_address_found: String,
}

// Default value functions for serde
fn default_base_url() -> String {
    api::NOMINATIM_URL.to_string()
}
fn default_user_agent() -> String {
    api::USER_AGENT.to_string()
}
fn default_geocoder_timeout() -> u64 {
    DEFAULT_GEOCODER_TIMEOUT_SECS
}
fn default_reverse_debounce() -> u64 {
    picker::REVERSE_DEBOUNCE_MS
}
fn default_search_debounce() -> u64 {
    picker::SEARCH_DEBOUNCE_MS
}
fn default_search_limit() -> usize {
    picker::SEARCH_LIMIT
}
fn default_pin_throttle() -> u64 {
    picker::PIN_THROTTLE_MS
}
fn default_notice() -> u64 {
    picker::NOTICE_MS
}
fn default_recenter_threshold() -> f64 {
    picker::RECENTER_THRESHOLD_METERS
}
fn default_pan_threshold() -> f64 {
    picker::PAN_THRESHOLD_METERS
}
fn default_lat() -> f64 {
    geo::DEFAULT_LAT
}
fn default_lng() -> f64 {
    geo::DEFAULT_LNG
}
fn default_label() -> String {
    geo::DEFAULT_LABEL.to_string()
}
fn default_tile_url() -> String {
    api::OSM_TILE_URL.to_string()
}
fn default_attribution() -> String {
    api::OSM_ATTRIBUTION.to_string()
}
fn default_zoom() -> u8 {
    picker::ZOOM
}
fn default_min_zoom() -> u8 {
    picker::MIN_ZOOM
}
fn default_max_zoom() -> u8 {
    picker::MAX_ZOOM
}
fn default_host() -> String {
    DEFAULT_HOST.to_string()
}
fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_msg_unsupported() -> String {
    MSG_UNSUPPORTED.to_string()
}
fn default_msg_permission_denied() -> String {
    MSG_PERMISSION_DENIED.to_string()
}
fn default_msg_position_unavailable() -> String {
    MSG_POSITION_UNAVAILABLE.to_string()
}
fn default_msg_timeout() -> String {
    MSG_TIMEOUT.to_string()
}
fn default_msg_unknown() -> String {
    MSG_UNKNOWN.to_string()
}
fn default_label_current_location() -> String {
    LABEL_CURRENT_LOCATION.to_string()
}
fn default_label_fallback() -> String {
    LABEL_FALLBACK.to_string()
}
fn default_msg_no_address_found() -> String {
    MSG_NO_ADDRESS_FOUND.to_string()
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            user_agent: default_user_agent(),
            timeout_secs: default_geocoder_timeout(),
        }
    }
}

impl Default for PickerConfig {
    fn default() -> Self {
        Self {
            reverse_debounce_ms: default_reverse_debounce(),
            search_debounce_ms: default_search_debounce(),
            search_limit: default_search_limit(),
            pin_throttle_ms: default_pin_throttle(),
            notice_ms: default_notice(),
            recenter_threshold_m: default_recenter_threshold(),
            pan_threshold_m: default_pan_threshold(),
            default_location: DefaultLocationConfig::default(),
        }
    }
}

impl Default for DefaultLocationConfig {
    fn default() -> Self {
        Self {
            lat: default_lat(),
            lng: default_lng(),
            label: default_label(),
        }
    }
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            tile_url: default_tile_url(),
            attribution: default_attribution(),
            zoom: default_zoom(),
            min_zoom: default_min_zoom(),
            max_zoom: default_max_zoom(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for MessagesConfig {
    fn default() -> Self {
        Self {
            unsupported: default_msg_unsupported(),
            permission_denied: default_msg_permission_denied(),
            position_unavailable: default_msg_position_unavailable(),
            timeout: default_msg_timeout(),
            unknown: default_msg_unknown(),
            current_location: default_label_current_location(),
            fallback_label: default_label_fallback(),
            no_address_found: default_msg_no_address_found(),
        }
    }
}

fn parse_value<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| Error::Config(format!("Invalid value for {}: {}", key, value)))
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|p| p.join(APP_DIR_NAME))
            .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))
    }

    /// Get the config file path
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join(CONFIG_FILE_NAME))
    }

    /// Load configuration from the default path
    ///
    /// Creates default config if file doesn't exist
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from a specific path, creating it if missing
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = fs::read_to_string(path)
                .map_err(|e| Error::Config(format!("Failed to read config file: {}", e)))?;

            toml::from_str(&content)
                .map_err(|e| Error::Config(format!("Failed to parse config file: {}", e)))
        } else {
            let config = Config::default();
            config.save_to(path)?;
            Ok(config)
        }
    }

    /// Save configuration to the default path
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    /// Save configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                Error::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;

        fs::write(path, content)
            .map_err(|e| Error::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// Get a configuration value by key path
    ///
    /// Key format: "section.key"
    /// Returns the value as a string, or None if not found
    pub fn get(&self, key: &str) -> Option<String> {
        let parts: Vec<&str> = key.split('.').collect();

        match parts.as_slice() {
            ["geocoder", "base_url"] => Some(self.geocoder.base_url.clone()),
            ["geocoder", "user_agent"] => Some(self.geocoder.user_agent.clone()),
            ["geocoder", "timeout_secs"] => Some(self.geocoder.timeout_secs.to_string()),

            ["picker", "reverse_debounce_ms"] => Some(self.picker.reverse_debounce_ms.to_string()),
            ["picker", "search_debounce_ms"] => Some(self.picker.search_debounce_ms.to_string()),
            ["picker", "search_limit"] => Some(self.picker.search_limit.to_string()),
            ["picker", "pin_throttle_ms"] => Some(self.picker.pin_throttle_ms.to_string()),
            ["picker", "notice_ms"] => Some(self.picker.notice_ms.to_string()),
            ["picker", "default_location", "lat"] => Some(self.picker.default_location.lat.to_string()),
            ["picker", "default_location", "lng"] => Some(self.picker.default_location.lng.to_string()),
            ["picker", "default_location", "label"] => Some(self.picker.default_location.label.clone()),

            ["map", "tile_url"] => Some(self.map.tile_url.clone()),
            ["map", "zoom"] => Some(self.map.zoom.to_string()),

            ["server", "host"] => Some(self.server.host.clone()),
            ["server", "port"] => Some(self.server.port.to_string()),

            _ => None,
        }
    }

    /// Set a configuration value by key path
    ///
    /// Returns error if key is invalid or value type is wrong
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let parts: Vec<&str> = key.split('.').collect();

        match parts.as_slice() {
            ["geocoder", "base_url"] => self.geocoder.base_url = value.to_string(),
            ["geocoder", "user_agent"] => self.geocoder.user_agent = value.to_string(),
            ["geocoder", "timeout_secs"] => self.geocoder.timeout_secs = parse_value(key, value)?,

            ["picker", "reverse_debounce_ms"] => {
                self.picker.reverse_debounce_ms = parse_value(key, value)?
            }
            ["picker", "search_debounce_ms"] => {
                self.picker.search_debounce_ms = parse_value(key, value)?
            }
            ["picker", "search_limit"] => self.picker.search_limit = parse_value(key, value)?,
            ["picker", "pin_throttle_ms"] => self.picker.pin_throttle_ms = parse_value(key, value)?,
            ["picker", "notice_ms"] => self.picker.notice_ms = parse_value(key, value)?,
            ["picker", "default_location", "lat"] => {
                let lat: f64 = parse_value(key, value)?;
                if !(-90.0..=90.0).contains(&lat) {
                    return Err(Error::Config(format!("Latitude out of range: {}", value)));
                }
                self.picker.default_location.lat = lat;
            }
            ["picker", "default_location", "lng"] => {
                let lng: f64 = parse_value(key, value)?;
                if !(-180.0..=180.0).contains(&lng) {
                    return Err(Error::Config(format!("Longitude out of range: {}", value)));
                }
                self.picker.default_location.lng = lng;
            }
            ["picker", "default_location", "label"] => {
                self.picker.default_location.label = value.to_string()
            }

            ["map", "tile_url"] => self.map.tile_url = value.to_string(),
            ["map", "zoom"] => self.map.zoom = parse_value(key, value)?,

            ["server", "host"] => self.server.host = value.to_string(),
            ["server", "port"] => self.server.port = parse_value(key, value)?,

            _ => {
                return Err(Error::Config(format!("Unknown config key: {}", key)));
            }
        }

        Ok(())
    }

    /// List all available config keys
    pub fn available_keys() -> Vec<&'static str> {
        vec![
            "geocoder.base_url",
            "geocoder.user_agent",
            "geocoder.timeout_secs",
            "picker.reverse_debounce_ms",
            "picker.search_debounce_ms",
            "picker.search_limit",
            "picker.pin_throttle_ms",
            "picker.notice_ms",
            "picker.default_location.lat",
            "picker.default_location.lng",
            "picker.default_location.label",
            "map.tile_url",
            "map.zoom",
            "server.host",
            "server.port",
        ]
    }

    /// Get server address as "host:port"
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
