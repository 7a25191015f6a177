//! Map renderer
//!
//! Single-slot ownership of the map widget and its marker: the widget is
//! created at most once per mount, the marker is always replaced rather
//! than moved, and teardown is idempotent.

use crate::coord::distance::exceeds;
use crate::coord::Coordinates;
use crate::map::{
    Cursor, MapEvent, MapOptions, MapSurface, MarkerId, TileLayer, ViewMove, PIN_MODE_ATTR,
};
use crate::picker::pin::PinMode;
use tracing::debug;

pub struct MapRenderer<S> {
    surface: S,
    tile_layer: TileLayer,
    zoom: u8,
    width: Option<u32>,
    height: Option<u32>,
    initialized: bool,
    tearing_down: bool,
    marker: Option<MarkerId>,
}

impl<S: MapSurface> MapRenderer<S> {
    pub fn new(surface: S, tile_layer: TileLayer, zoom: u8) -> Self {
        Self {
            surface,
            tile_layer,
            zoom,
            width: None,
            height: None,
            initialized: false,
            tearing_down: false,
            marker: None,
        }
    }

    /// Fix the container size passed to the widget at creation
    pub fn with_size(mut self, width: Option<u32>, height: Option<u32>) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Create the widget centered on `center`
    ///
    /// Returns false when already initialized or when `center` is not a
    /// usable coordinate pair.
    pub fn initialize(&mut self, center: Coordinates) -> bool {
        if self.initialized || !center.is_usable() {
            return false;
        }

        let mut options = MapOptions::centered(center, self.zoom);
        options.width = self.width;
        options.height = self.height;

        self.surface.create(&options);
        self.surface.add_tile_layer(&self.tile_layer);
        self.surface.listen(MapEvent::Click);
        self.initialized = true;

        debug!(%center, "map initialized");
        true
    }

    /// Move the view for a coordinate change
    pub fn move_view(&mut self, to: Coordinates, view: ViewMove) {
        if !self.initialized {
            return;
        }
        match view {
            ViewMove::Recenter { threshold_meters } => {
                if exceeds(self.surface.center(), to, threshold_meters) {
                    self.surface.pan_to(to, true);
                }
            }
            ViewMove::FlyTo { zoom, duration } => {
                self.surface.fly_to(to, zoom, duration);
            }
        }
    }

    /// Remove the current marker and add a fresh one with its popup open
    pub fn replace_marker(&mut self, at: Coordinates, popup: &str) -> Option<MarkerId> {
        if !self.initialized {
            return None;
        }
        if let Some(old) = self.marker.take() {
            self.surface.remove_marker(old);
        }
        let id = self.surface.add_marker(at, popup);
        self.surface.open_popup(id);
        self.marker = Some(id);
        Some(id)
    }

    /// Close the popup of `id` if it is still the current marker
    pub fn close_popup(&mut self, id: MarkerId) {
        if self.marker == Some(id) {
            self.surface.close_popup(id);
        }
    }

    pub fn set_popup_text(&mut self, text: &str) {
        if let Some(id) = self.marker {
            self.surface.set_popup(id, text);
        }
    }

    /// Publish the pin mode on the container and switch the cursor
    pub fn set_pin_mode(&mut self, mode: PinMode) {
        self.surface.set_data(PIN_MODE_ATTR, mode.as_attr());
        self.surface.set_cursor(match mode {
            PinMode::On => Cursor::Crosshair,
            PinMode::Off => Cursor::Grab,
        });
    }

    /// Pin mode as currently written on the container
    pub fn pin_mode(&self) -> PinMode {
        PinMode::from_attr(self.surface.data(PIN_MODE_ATTR).as_deref())
    }

    /// Whether a click on the widget reaches a registered handler
    pub fn accepts_clicks(&self) -> bool {
        self.initialized && self.surface.is_listening(MapEvent::Click)
    }

    /// Detach listeners, drop the marker and destroy the widget
    pub fn teardown(&mut self) {
        if self.tearing_down {
            return;
        }
        self.tearing_down = true;

        if self.initialized {
            self.surface.off_all();
            if let Some(id) = self.marker.take() {
                self.surface.remove_marker(id);
            }
            self.surface.destroy();
            debug!("map destroyed");
        }
        self.marker = None;
        self.initialized = false;
        self.tearing_down = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MapConfig;
    use crate::map::headless::{HeadlessMap, MapOp};
    use std::time::Duration;

    fn renderer() -> (MapRenderer<HeadlessMap>, HeadlessMap) {
        let map = HeadlessMap::recording();
        let renderer = MapRenderer::new(map.clone(), TileLayer::from_config(&MapConfig::default()), 15)
            .with_size(None, Some(400));
        (renderer, map)
    }

    const BKK: Coordinates = Coordinates { lat: 13.7563, lng: 100.5018 };

    #[test]
    fn test_initialize_once() {
        let (mut r, map) = renderer();
        assert!(!r.initialize(Coordinates::new(0.0, 0.0)));
        assert!(r.initialize(BKK));
        assert!(!r.initialize(BKK));

        let state = map.snapshot();
        let options = state.options.unwrap();
        assert_eq!(options.zoom, 15);
        assert!(!options.double_click_zoom);
        assert!(options.prefer_canvas);
        assert_eq!(options.height, Some(400));
        assert_eq!(state.tile_layers.len(), 1);
        assert_eq!(state.tile_layers[0].min_zoom, 3);
        assert_eq!(state.tile_layers[0].max_zoom, 19);
        assert_eq!(map.count_ops(|op| matches!(op, MapOp::Create { .. })), 1);
        assert!(r.accepts_clicks());
    }

    #[test]
    fn test_marker_replaced_not_moved() {
        let (mut r, map) = renderer();
        r.initialize(BKK);

        let first = r.replace_marker(BKK, "a").unwrap();
        let second = r.replace_marker(Coordinates::new(13.76, 100.5), "b").unwrap();

        assert_ne!(first, second);
        assert_eq!(map.marker_count(), 1);
        assert_eq!(map.count_ops(|op| matches!(op, MapOp::RemoveMarker { .. })), 1);
        assert!(map.single_marker().unwrap().popup_open);

        // Closing a replaced marker's popup does nothing
        r.close_popup(first);
        assert!(map.single_marker().unwrap().popup_open);
        r.close_popup(second);
        assert!(!map.single_marker().unwrap().popup_open);
    }

    #[test]
    fn test_recenter_threshold() {
        let (mut r, map) = renderer();
        r.initialize(BKK);

        // ~410 m away: inside 1000 m, outside 100 m
        let nearby = Coordinates::new(13.7600, 100.5018);
        r.move_view(nearby, ViewMove::Recenter { threshold_meters: 1000.0 });
        assert_eq!(map.count_ops(|op| matches!(op, MapOp::PanTo { .. })), 0);

        r.move_view(nearby, ViewMove::Recenter { threshold_meters: 100.0 });
        assert_eq!(map.count_ops(|op| matches!(op, MapOp::PanTo { .. })), 1);

        r.move_view(
            BKK,
            ViewMove::FlyTo { zoom: 15, duration: Duration::from_millis(1500) },
        );
        assert_eq!(
            map.count_ops(|op| matches!(op, MapOp::FlyTo { duration_ms: 1500, zoom: 15, .. })),
            1
        );
    }

    #[test]
    fn test_pin_mode_round_trips_through_container() {
        let (mut r, map) = renderer();
        assert_eq!(r.pin_mode(), PinMode::Off);
        r.set_pin_mode(PinMode::On);
        assert_eq!(r.pin_mode(), PinMode::On);
        assert_eq!(map.snapshot().cursor, Some(Cursor::Crosshair));
        r.set_pin_mode(PinMode::Off);
        assert_eq!(map.snapshot().cursor, Some(Cursor::Grab));
    }

    #[test]
    fn test_teardown_is_idempotent() {
        let (mut r, map) = renderer();
        r.initialize(BKK);
        r.replace_marker(BKK, "a");

        r.teardown();
        r.teardown();

        assert!(!r.is_initialized());
        assert!(!r.accepts_clicks());
        assert_eq!(map.marker_count(), 0);
        assert_eq!(map.count_ops(|op| matches!(op, MapOp::Destroy)), 1);
        assert_eq!(map.count_ops(|op| matches!(op, MapOp::OffAll)), 1);

        // A fresh mount may initialize again
        assert!(r.initialize(BKK));
    }
}
