//! Centralized constants for the geopick crate
//!
//! This module consolidates constants that are used across multiple modules
//! to avoid duplication and ensure consistency.

/// Geographic constants
pub mod geo {
    /// Mean Earth radius in meters (WGS84 approximation)
    pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

    /// Decimal places kept on every stored or emitted coordinate
    pub const COORD_DECIMALS: i32 = 4;

    /// Fallback location used when geolocation is unavailable (Bangkok)
    pub const DEFAULT_LAT: f64 = 13.7563;
    pub const DEFAULT_LNG: f64 = 100.5018;
    pub const DEFAULT_LABEL: &str = "Bangkok";
}

/// External API endpoints
pub mod api {
    /// OpenStreetMap Nominatim geocoding API
    pub const NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org";

    /// IP geolocation API (free, no key required)
    pub const IP_API_URL: &str = "http://ip-api.com/json";

    /// OpenStreetMap raster tiles
    pub const OSM_TILE_URL: &str = "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png";

    /// Attribution required by the OSM tile usage policy
    pub const OSM_ATTRIBUTION: &str = "© OpenStreetMap contributors";

    /// Nominatim zoom level for reverse lookups (neighbourhood / suburb)
    pub const REVERSE_ZOOM: u8 = 14;

    /// User agent sent to public geocoding services
    pub const USER_AGENT: &str = concat!("geopick/", env!("CARGO_PKG_VERSION"));
}

/// Picker timing and geometry
pub mod picker {
    /// Quiet period before a reverse lookup fires
    pub const REVERSE_DEBOUNCE_MS: u64 = 300;

    /// Quiet period before a search-as-you-type request fires
    pub const SEARCH_DEBOUNCE_MS: u64 = 150;

    /// Suggestions requested per search
    pub const SEARCH_LIMIT: usize = 5;

    /// Minimum spacing between two effective pin placements
    pub const PIN_THROTTLE_MS: u64 = 300;

    /// Lifetime of a transient notice
    pub const NOTICE_MS: u64 = 5_000;

    /// Lifetime of the marker popup after a coordinate change
    pub const POPUP_MS: u64 = 2_000;

    /// Delay between first usable coordinates and map creation
    pub const MAP_INIT_DELAY_MS: u64 = 100;

    /// Duration of the fly-to animation after a search selection
    pub const FLY_DURATION_MS: u64 = 1_500;

    /// Distance from the view center beyond which the view recenters
    pub const RECENTER_THRESHOLD_METERS: f64 = 1_000.0;

    /// Pan threshold while coordinates are edited numerically
    pub const PAN_THRESHOLD_METERS: f64 = 100.0;

    /// Map zoom at creation and after a fly-to
    pub const ZOOM: u8 = 15;

    /// Tile layer zoom bounds
    pub const MIN_ZOOM: u8 = 3;
    pub const MAX_ZOOM: u8 = 19;
}

/// Geolocation request settings
pub mod geolocation {
    pub const TIMEOUT_MS: u64 = 10_000;
    pub const MAXIMUM_AGE_MS: u64 = 60_000;

    /// IP location cache file name
    pub const IP_LOCATION_CACHE_FILE: &str = "ip_location_cache.json";
}
