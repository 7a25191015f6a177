//! Map widget abstraction
//!
//! [`MapSurface`] is the imperative, stateful map object the picker drives:
//! one view, one tile layer, markers with popups, a container carrying
//! data attributes, and registered event listeners. The picker owns exactly
//! one surface per mounted instance.

pub mod headless;

use crate::config::MapConfig;
use crate::coord::Coordinates;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub use headless::HeadlessMap;

/// Container data attribute that carries the current pin mode
pub const PIN_MODE_ATTR: &str = "data-pin-mode";

/// Identifier of a marker on a surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MarkerId(pub u64);

/// Options fixed at map creation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapOptions {
    pub center: Coordinates,
    pub zoom: u8,
    pub dragging: bool,
    pub scroll_wheel_zoom: bool,
    pub double_click_zoom: bool,
    pub prefer_canvas: bool,
    /// Container size in pixels, when the embedder fixes one
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl MapOptions {
    /// Standard picker options centered on `center`
    pub fn centered(center: Coordinates, zoom: u8) -> Self {
        Self {
            center,
            zoom,
            dragging: true,
            scroll_wheel_zoom: true,
            double_click_zoom: false,
            prefer_canvas: true,
            width: None,
            height: None,
        }
    }
}

/// Raster tile layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileLayer {
    pub url_template: String,
    pub attribution: String,
    pub min_zoom: u8,
    pub max_zoom: u8,
}

impl TileLayer {
    pub fn from_config(config: &MapConfig) -> Self {
        Self {
            url_template: config.tile_url.clone(),
            attribution: config.attribution.clone(),
            min_zoom: config.min_zoom,
            max_zoom: config.max_zoom,
        }
    }
}

/// Cursor shown over the map
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cursor {
    /// Normal pan/drag cursor
    Grab,
    /// Pin placement cursor
    Crosshair,
}

/// Map events the picker listens to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MapEvent {
    Click,
}

/// How the view should follow a coordinate change
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ViewMove {
    /// Animated recenter when the point is farther than the threshold
    Recenter { threshold_meters: f64 },
    /// Animated fly-to regardless of distance
    FlyTo { zoom: u8, duration: Duration },
}

/// An imperative map widget
pub trait MapSurface: Send {
    /// Create the widget inside its container
    fn create(&mut self, options: &MapOptions);

    fn add_tile_layer(&mut self, layer: &TileLayer);

    /// Current view center, if the widget has one
    fn center(&self) -> Option<Coordinates>;

    fn pan_to(&mut self, center: Coordinates, animate: bool);

    fn fly_to(&mut self, center: Coordinates, zoom: u8, duration: Duration);

    fn add_marker(&mut self, at: Coordinates, popup: &str) -> MarkerId;

    fn remove_marker(&mut self, id: MarkerId);

    fn set_popup(&mut self, id: MarkerId, text: &str);

    fn open_popup(&mut self, id: MarkerId);

    fn close_popup(&mut self, id: MarkerId);

    fn set_cursor(&mut self, cursor: Cursor);

    /// Write a data attribute on the widget container
    fn set_data(&mut self, key: &str, value: &str);

    /// Read a data attribute from the widget container
    fn data(&self, key: &str) -> Option<String>;

    fn listen(&mut self, event: MapEvent);

    fn is_listening(&self, event: MapEvent) -> bool;

    /// Detach every listener
    fn off_all(&mut self);

    /// Destroy the widget; the surface may be created again afterwards
    fn destroy(&mut self);
}
