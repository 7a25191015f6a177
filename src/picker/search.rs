//! Search-as-you-type
//!
//! Keystrokes are debounced, and each search that starts aborts the one
//! still in flight. Results are tagged with a sequence number so a result
//! that was already queued when its request was superseded never reaches
//! the suggestion list.

use crate::geo::locate::PositionSource;
use crate::geo::{GeoBackend, SearchResult};
use crate::map::{MapSurface, ViewMove};
use crate::picker::timer::Debouncer;
use crate::picker::{Event, Key, Picker};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Outcome of a direct single-result geocode
#[derive(Debug)]
pub(crate) enum DirectOutcome {
    Found(SearchResult),
    NotFound,
    Failed,
}

#[derive(Debug, Default)]
pub(crate) struct SearchController {
    pub debounce: Debouncer,
    in_flight: Option<JoinHandle<()>>,
    seq: u64,
    direct: Option<JoinHandle<()>>,
    direct_seq: u64,
}

impl SearchController {
    fn abort_in_flight(&mut self) {
        if let Some(handle) = self.in_flight.take() {
            handle.abort();
        }
    }

    /// Stop search-as-you-type; results already queued become stale
    pub fn cancel_suggestions(&mut self) {
        self.debounce.cancel();
        self.abort_in_flight();
        self.seq += 1;
    }

    /// Cancel suggestions and any direct geocode
    pub fn cancel_all(&mut self) {
        self.cancel_suggestions();
        if let Some(handle) = self.direct.take() {
            handle.abort();
        }
        self.direct_seq += 1;
    }
}

/// Next highlighted index when cycling through `len` suggestions
pub(crate) fn cycle(current: Option<usize>, len: usize, key: Key) -> Option<usize> {
    if len == 0 {
        return None;
    }
    match (key, current) {
        (Key::ArrowDown, None) => Some(0),
        (Key::ArrowDown, Some(i)) => Some((i + 1) % len),
        (Key::ArrowUp, None) => Some(len - 1),
        (Key::ArrowUp, Some(i)) => Some((i + len - 1) % len),
        _ => current,
    }
}

impl<G, P, S> Picker<G, P, S>
where
    G: GeoBackend + 'static,
    P: PositionSource + 'static,
    S: MapSurface + 'static,
{
    pub(super) fn on_address_input(&mut self, text: String) {
        self.state.address = text.clone();
        self.callbacks.emit_address(&text);

        if text.trim().is_empty() {
            self.search.cancel_all();
            self.state.suggestions.clear();
            self.state.suggestions_visible = false;
            self.state.highlighted = None;
            self.state.searching = false;
            return;
        }

        self.search
            .debounce
            .schedule(self.settings.search_debounce, &self.events, |generation| {
                Event::SearchDue {
                    generation,
                    query: text,
                }
            });
    }

    pub(super) fn on_search_due(&mut self, generation: u64, query: String) {
        if !self.search.debounce.fire(generation) {
            return;
        }

        self.search.abort_in_flight();
        self.search.seq += 1;
        self.state.searching = true;

        let seq = self.search.seq;
        let limit = self.settings.search_limit;
        let geocoder = Arc::clone(&self.geocoder);
        let tx = self.events.clone();
        self.search.in_flight = Some(tokio::spawn(async move {
            let results = match geocoder.search(&query, limit).await {
                Ok(results) => results,
                Err(e) => {
                    warn!(%query, "address search failed: {}", e);
                    Vec::new()
                }
            };
            let _ = tx.send(Event::SearchResolved { seq, results });
        }));
    }

    pub(super) fn on_search_resolved(&mut self, seq: u64, results: Vec<SearchResult>) {
        if seq != self.search.seq {
            debug!(seq, "superseded search result dropped");
            return;
        }

        self.search.in_flight = None;
        self.state.searching = false;
        self.state.suggestions_visible = !results.is_empty();
        self.state.suggestions = results;
        self.state.highlighted = None;
    }

    pub(super) fn on_key(&mut self, key: Key) {
        match key {
            Key::ArrowDown | Key::ArrowUp => {
                if self.state.suggestions_visible {
                    self.state.highlighted =
                        cycle(self.state.highlighted, self.state.suggestions.len(), key);
                }
            }
            Key::Escape => {
                self.search.cancel_suggestions();
                self.state.suggestions_visible = false;
                self.state.highlighted = None;
                self.state.searching = false;
            }
            Key::Enter => {
                let highlighted = self
                    .state
                    .highlighted
                    .filter(|_| self.state.suggestions_visible);
                match highlighted {
                    Some(index) => self.on_select_suggestion(index),
                    None => self.geocode_typed_address(),
                }
            }
        }
    }

    pub(super) fn on_select_suggestion(&mut self, index: usize) {
        let Some(result) = self.state.suggestions.get(index).cloned() else {
            debug!(index, "no suggestion at index");
            return;
        };
        self.commit_result(result);
    }

    /// Adopt a search result as the authoritative location
    fn commit_result(&mut self, result: SearchResult) {
        self.end_bootstrap();
        self.search.cancel_all();
        self.reverse.debounce.cancel();

        let coords = result.coordinates.rounded();
        self.reverse.remember(coords.key());

        self.state.address = result.display_name.clone();
        self.state.location_name = Some(result.display_name.clone());
        self.state.suggestions_visible = false;
        self.state.highlighted = None;
        self.state.searching = false;

        let view = ViewMove::FlyTo {
            zoom: self.settings.zoom,
            duration: self.settings.fly_duration,
        };
        self.adopt(coords, view, true);
        self.callbacks.emit_address(&result.display_name);
    }

    /// Enter without a highlighted suggestion: best single match
    fn geocode_typed_address(&mut self) {
        let query = self.state.address.trim().to_string();
        self.search.cancel_all();
        self.state.suggestions_visible = false;
        self.state.highlighted = None;
        self.state.searching = false;

        if query.is_empty() {
            return;
        }

        let seq = self.search.direct_seq;
        let geocoder = Arc::clone(&self.geocoder);
        let tx = self.events.clone();
        self.search.direct = Some(tokio::spawn(async move {
            let outcome = match geocoder.geocode(&query).await {
                Ok(Some(result)) => DirectOutcome::Found(result),
                Ok(None) => DirectOutcome::NotFound,
                Err(e) => {
                    warn!(%query, "direct geocode failed: {}", e);
                    DirectOutcome::Failed
                }
            };
            let _ = tx.send(Event::GeocodeResolved { seq, outcome });
        }));
    }

    pub(super) fn on_geocode_resolved(&mut self, seq: u64, outcome: DirectOutcome) {
        if seq != self.search.direct_seq {
            return;
        }
        self.search.direct = None;

        match outcome {
            DirectOutcome::Found(result) => self.commit_result(result),
            DirectOutcome::NotFound => {
                self.state.alert = Some(self.settings.messages.no_address_found.clone());
            }
            DirectOutcome::Failed => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_down() {
        assert_eq!(cycle(None, 3, Key::ArrowDown), Some(0));
        assert_eq!(cycle(Some(0), 3, Key::ArrowDown), Some(1));
        assert_eq!(cycle(Some(2), 3, Key::ArrowDown), Some(0));
    }

    #[test]
    fn test_cycle_up() {
        assert_eq!(cycle(None, 3, Key::ArrowUp), Some(2));
        assert_eq!(cycle(Some(0), 3, Key::ArrowUp), Some(2));
        assert_eq!(cycle(Some(2), 3, Key::ArrowUp), Some(1));
    }

    #[test]
    fn test_cycle_empty() {
        assert_eq!(cycle(None, 0, Key::ArrowDown), None);
        assert_eq!(cycle(Some(1), 0, Key::ArrowUp), None);
    }
}
