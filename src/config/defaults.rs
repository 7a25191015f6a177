//! Default configuration values
//!
//! Named constants for user-facing defaults. Timing defaults live in
//! [`crate::constants::picker`].

/// Default server host
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default server port
pub const DEFAULT_PORT: u16 = 7878;

/// Default geocoder request timeout in seconds
pub const DEFAULT_GEOCODER_TIMEOUT_SECS: u64 = 10;

/// Shown when the device position cannot be read at all
pub const MSG_UNSUPPORTED: &str = "Geolocation is not supported; showing the default location";

/// Shown when the user refused the location permission
pub const MSG_PERMISSION_DENIED: &str = "Location permission was denied; showing the default location";

/// Shown when no position fix could be obtained
pub const MSG_POSITION_UNAVAILABLE: &str = "Your position is unavailable; showing the default location";

/// Shown when the position request timed out
pub const MSG_TIMEOUT: &str = "Locating you took too long; showing the default location";

/// Shown for any other geolocation failure
pub const MSG_UNKNOWN: &str = "Could not determine your location; showing the default location";

/// Label for a located position that has no reverse-geocoded name
pub const LABEL_CURRENT_LOCATION: &str = "Current location";

/// Label used when reverse geocoding fails
pub const LABEL_FALLBACK: &str = "Selected location";

/// Blocking alert when a direct geocode finds nothing
pub const MSG_NO_ADDRESS_FOUND: &str = "No address found";

/// Config file name
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Application directory name (for XDG paths)
pub const APP_DIR_NAME: &str = "geopick";
