//! In-memory map surface
//!
//! Keeps the full widget state behind a shared handle, so a clone kept
//! outside the picker can observe what the picker did. The operation log
//! is only kept by surfaces built with [`HeadlessMap::recording`].

use crate::coord::Coordinates;
use crate::map::{Cursor, MapEvent, MapOptions, MapSurface, MarkerId, TileLayer};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// One recorded surface call
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum MapOp {
    Create { center: Coordinates, zoom: u8 },
    AddTileLayer { min_zoom: u8, max_zoom: u8 },
    PanTo { center: Coordinates, animate: bool },
    FlyTo { center: Coordinates, zoom: u8, duration_ms: u64 },
    AddMarker { id: MarkerId, at: Coordinates },
    RemoveMarker { id: MarkerId },
    OpenPopup { id: MarkerId },
    ClosePopup { id: MarkerId },
    SetCursor { cursor: Cursor },
    OffAll,
    Destroy,
}

/// A marker on the headless surface
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeadlessMarker {
    pub at: Coordinates,
    pub popup: String,
    pub popup_open: bool,
}

/// Observable widget state
#[derive(Debug, Clone, Default, Serialize)]
pub struct HeadlessState {
    pub created: bool,
    pub options: Option<MapOptions>,
    pub tile_layers: Vec<TileLayer>,
    pub center: Option<Coordinates>,
    pub zoom: Option<u8>,
    pub markers: BTreeMap<u64, HeadlessMarker>,
    pub cursor: Option<Cursor>,
    pub data: HashMap<String, String>,
    #[serde(skip)]
    pub listeners: HashSet<MapEvent>,
    pub ops: Vec<MapOp>,
    recording: bool,
    next_marker: u64,
}

impl HeadlessState {
    fn record(&mut self, op: MapOp) {
        if self.recording {
            self.ops.push(op);
        }
    }
}

/// Map surface with no rendering backend
#[derive(Debug, Clone, Default)]
pub struct HeadlessMap {
    inner: Arc<Mutex<HeadlessState>>,
}

impl HeadlessMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// A surface that also logs every operation
    pub fn recording() -> Self {
        let map = Self::default();
        map.lock().recording = true;
        map
    }

    fn lock(&self) -> MutexGuard<'_, HeadlessState> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Copy of the current widget state
    pub fn snapshot(&self) -> HeadlessState {
        self.lock().clone()
    }

    /// Number of markers currently on the map
    pub fn marker_count(&self) -> usize {
        self.lock().markers.len()
    }

    /// The only marker, if exactly one exists
    pub fn single_marker(&self) -> Option<HeadlessMarker> {
        let state = self.lock();
        match state.markers.len() {
            1 => state.markers.values().next().cloned(),
            _ => None,
        }
    }

    /// Count of recorded operations matching `pred`
    pub fn count_ops(&self, pred: impl Fn(&MapOp) -> bool) -> usize {
        self.lock().ops.iter().filter(|op| pred(op)).count()
    }
}

impl MapSurface for HeadlessMap {
    fn create(&mut self, options: &MapOptions) {
        let mut state = self.lock();
        state.created = true;
        state.center = Some(options.center);
        state.zoom = Some(options.zoom);
        state.options = Some(options.clone());
        state.record(MapOp::Create {
            center: options.center,
            zoom: options.zoom,
        });
    }

    fn add_tile_layer(&mut self, layer: &TileLayer) {
        let mut state = self.lock();
        state.tile_layers.push(layer.clone());
        state.record(MapOp::AddTileLayer {
            min_zoom: layer.min_zoom,
            max_zoom: layer.max_zoom,
        });
    }

    fn center(&self) -> Option<Coordinates> {
        let state = self.lock();
        if state.created {
            state.center
        } else {
            None
        }
    }

    fn pan_to(&mut self, center: Coordinates, animate: bool) {
        let mut state = self.lock();
        state.center = Some(center);
        state.record(MapOp::PanTo { center, animate });
    }

    fn fly_to(&mut self, center: Coordinates, zoom: u8, duration: Duration) {
        let mut state = self.lock();
        state.center = Some(center);
        state.zoom = Some(zoom);
        state.record(MapOp::FlyTo {
            center,
            zoom,
            duration_ms: duration.as_millis() as u64,
        });
    }

    fn add_marker(&mut self, at: Coordinates, popup: &str) -> MarkerId {
        let mut state = self.lock();
        state.next_marker += 1;
        let id = MarkerId(state.next_marker);
        state.markers.insert(
            id.0,
            HeadlessMarker {
                at,
                popup: popup.to_string(),
                popup_open: false,
            },
        );
        state.record(MapOp::AddMarker { id, at });
        id
    }

    fn remove_marker(&mut self, id: MarkerId) {
        let mut state = self.lock();
        if state.markers.remove(&id.0).is_some() {
            state.record(MapOp::RemoveMarker { id });
        }
    }

    fn set_popup(&mut self, id: MarkerId, text: &str) {
        if let Some(marker) = self.lock().markers.get_mut(&id.0) {
            marker.popup = text.to_string();
        }
    }

    fn open_popup(&mut self, id: MarkerId) {
        let mut state = self.lock();
        if let Some(marker) = state.markers.get_mut(&id.0) {
            marker.popup_open = true;
            state.record(MapOp::OpenPopup { id });
        }
    }

    fn close_popup(&mut self, id: MarkerId) {
        let mut state = self.lock();
        if let Some(marker) = state.markers.get_mut(&id.0) {
            marker.popup_open = false;
            state.record(MapOp::ClosePopup { id });
        }
    }

    fn set_cursor(&mut self, cursor: Cursor) {
        let mut state = self.lock();
        state.cursor = Some(cursor);
        state.record(MapOp::SetCursor { cursor });
    }

    fn set_data(&mut self, key: &str, value: &str) {
        self.lock().data.insert(key.to_string(), value.to_string());
    }

    fn data(&self, key: &str) -> Option<String> {
        self.lock().data.get(key).cloned()
    }

    fn listen(&mut self, event: MapEvent) {
        self.lock().listeners.insert(event);
    }

    fn is_listening(&self, event: MapEvent) -> bool {
        self.lock().listeners.contains(&event)
    }

    fn off_all(&mut self) {
        let mut state = self.lock();
        state.listeners.clear();
        state.record(MapOp::OffAll);
    }

    fn destroy(&mut self) {
        let mut state = self.lock();
        state.created = false;
        state.center = None;
        state.zoom = None;
        state.options = None;
        state.tile_layers.clear();
        state.markers.clear();
        state.cursor = None;
        state.record(MapOp::Destroy);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clone_observes_same_widget() {
        let map = HeadlessMap::new();
        let mut surface = map.clone();

        surface.create(&MapOptions::centered(Coordinates::new(13.7563, 100.5018), 15));
        let id = surface.add_marker(Coordinates::new(13.7563, 100.5018), "Bangkok");
        surface.open_popup(id);

        let marker = map.single_marker().unwrap();
        assert_eq!(marker.popup, "Bangkok");
        assert!(marker.popup_open);
        assert_eq!(map.center(), Some(Coordinates::new(13.7563, 100.5018)));
    }

    #[test]
    fn test_center_requires_creation() {
        let mut map = HeadlessMap::recording();
        assert!(map.center().is_none());
        map.create(&MapOptions::centered(Coordinates::new(1.0, 2.0), 15));
        map.destroy();
        assert!(map.center().is_none());
        assert_eq!(map.count_ops(|op| matches!(op, MapOp::Destroy)), 1);
    }

    #[test]
    fn test_plain_surface_keeps_no_log() {
        let mut map = HeadlessMap::new();
        for i in 0..100 {
            let id = map.add_marker(Coordinates::new(13.0, 100.0 + i as f64 * 0.001), "");
            map.open_popup(id);
            map.remove_marker(id);
        }
        assert!(map.snapshot().ops.is_empty());
        assert_eq!(map.count_ops(|_| true), 0);
    }

    #[test]
    fn test_data_attributes_and_listeners() {
        let mut map = HeadlessMap::new();
        map.set_data("data-pin-mode", "true");
        assert_eq!(map.data("data-pin-mode").as_deref(), Some("true"));

        map.listen(MapEvent::Click);
        assert!(map.is_listening(MapEvent::Click));
        map.off_all();
        assert!(!map.is_listening(MapEvent::Click));
    }
}
