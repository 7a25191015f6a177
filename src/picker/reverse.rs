//! Debounced reverse geocoding
//!
//! Two independent guards: the debounce timer coalesces bursts of
//! coordinate changes into one lookup, and the key memo skips lookups for a
//! location that is already resolved or already in flight.

use crate::coord::Coordinates;
use crate::geo::locate::PositionSource;
use crate::geo::GeoBackend;
use crate::map::MapSurface;
use crate::picker::timer::Debouncer;
use crate::picker::{Event, Picker};
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, warn};

#[derive(Debug, Default)]
pub(crate) struct ReverseGeocoder {
    pub debounce: Debouncer,
    last_resolved: Option<String>,
    in_flight: Option<String>,
    tasks: JoinSet<()>,
}

impl ReverseGeocoder {
    /// Record a key whose name is already known
    pub fn remember(&mut self, key: String) {
        self.last_resolved = Some(key);
    }

    fn should_lookup(&self, key: &str) -> bool {
        self.last_resolved.as_deref() != Some(key) && self.in_flight.as_deref() != Some(key)
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Cancel the pending timer and every lookup still running
    pub fn shutdown(&mut self) {
        self.debounce.cancel();
        self.tasks.abort_all();
        self.in_flight = None;
    }
}

impl<G, P, S> Picker<G, P, S>
where
    G: GeoBackend + 'static,
    P: PositionSource + 'static,
    S: MapSurface + 'static,
{
    pub(super) fn schedule_reverse(&mut self, coords: Coordinates) {
        self.reverse
            .debounce
            .schedule(self.settings.reverse_debounce, &self.events, |generation| {
                Event::ReverseDue { generation, coords }
            });
    }

    pub(super) fn on_reverse_due(&mut self, generation: u64, coords: Coordinates) {
        if !self.reverse.debounce.fire(generation) {
            return;
        }

        let key = coords.key();
        if !self.reverse.should_lookup(&key) {
            debug!(%key, "reverse lookup skipped, already resolved");
            return;
        }

        self.reverse.in_flight = Some(key.clone());
        self.state.geocoding = true;

        // Reap finished lookups so the set does not grow
        while self.reverse.tasks.try_join_next().is_some() {}

        let geocoder = Arc::clone(&self.geocoder);
        let tx = self.events.clone();
        self.reverse.tasks.spawn(async move {
            let name = match geocoder.reverse_geocode(coords).await {
                Ok(name) => name,
                Err(e) => {
                    warn!(%key, "reverse geocoding failed: {}", e);
                    None
                }
            };
            let _ = tx.send(Event::ReverseResolved { key, name });
        });
    }

    pub(super) fn on_reverse_resolved(&mut self, key: String, name: Option<String>) {
        if self.reverse.in_flight.as_deref() == Some(key.as_str()) {
            self.reverse.in_flight = None;
        }
        self.state.geocoding = self.reverse.is_busy();

        // The location moved on while this lookup ran
        if self.state.coordinates.map(|c| c.key()).as_deref() != Some(key.as_str()) {
            debug!(%key, "stale reverse result dropped");
            return;
        }

        let label = match name {
            Some(name) => {
                self.reverse.remember(key);
                name
            }
            None => self.settings.messages.fallback_label.clone(),
        };

        self.set_resolved_name(label);
    }
}
