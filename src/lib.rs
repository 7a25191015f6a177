//! geopick: address picker engine
//!
//! A library and CLI tool that keeps a location (coordinates plus a
//! human-readable address) in sync with a map surface, geolocation,
//! search-as-you-type and pin drops, backed by OpenStreetMap Nominatim.
//!
//! ## Features
//!
//! - Geolocation bootstrap with default-location fallback
//! - Debounced, deduplicated reverse geocoding
//! - Debounced address search with cancellation and keyboard navigation
//! - Throttled pin-drop placement
//! - HTTP API + CLI interface
//!
//! ## Quick Start
//!
//! ```rust
//! use geopick::coord::{distance::haversine_distance, Coordinates};
//!
//! let siam = Coordinates::new(13.745_61, 100.534_19).rounded();
//! assert_eq!(siam.key(), "13.7456,100.5342");
//! assert!(siam.is_usable());
//!
//! let bangkok = Coordinates::new(13.7563, 100.5018);
//! let meters = haversine_distance(bangkok, siam);
//! println!("{} is {:.0} m from the default location", siam, meters);
//! ```

pub mod cli;
pub mod config;
pub mod constants;
pub mod coord;
pub mod error;
pub mod geo;
pub mod map;
pub mod picker;
pub mod server;

// Re-export commonly used types
pub use config::Config;
pub use coord::Coordinates;
pub use error::{Error, Result};
pub use picker::{AddressPicker, PickerHandle, PickerState};
