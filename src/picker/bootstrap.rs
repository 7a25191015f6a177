//! Geolocation bootstrap
//!
//! Resolves the first location of a mount: embedder-supplied coordinates,
//! the device position, or the configured default location.

use crate::config::MessagesConfig;
use crate::coord::Coordinates;
use crate::geo::locate::{GeolocationError, PositionSource};
use crate::geo::GeoBackend;
use crate::map::{MapSurface, ViewMove};
use crate::picker::{Event, Notice, Picker};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A successfully located position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Located {
    pub coordinates: Coordinates,
    /// Reverse-geocoded name, if the lookup succeeded
    pub name: Option<String>,
}

/// User-facing message for a geolocation failure
pub fn message_for(error: GeolocationError, messages: &MessagesConfig) -> &str {
    match error {
        GeolocationError::PermissionDenied => &messages.permission_denied,
        GeolocationError::PositionUnavailable => &messages.position_unavailable,
        GeolocationError::Timeout => &messages.timeout,
        GeolocationError::Unknown => &messages.unknown,
        GeolocationError::Unsupported => &messages.unsupported,
    }
}

impl<G, P, S> Picker<G, P, S>
where
    G: GeoBackend + 'static,
    P: PositionSource + 'static,
    S: MapSurface + 'static,
{
    pub(super) fn bootstrap(&mut self) {
        let initial = self
            .props
            .initial_coordinates
            .filter(|c| c.is_usable() && c.validate().is_ok());

        if let Some(initial) = initial {
            let coords = initial.rounded();
            self.state.coordinates = Some(coords);
            if let Some(address) = self.props.initial_address.clone() {
                self.reverse.remember(coords.key());
                self.state.location_name = Some(address.clone());
                self.state.address = address;
            }
            self.state.loading = false;
            self.sync_map(self.recenter());
            info!(%coords, "picker mounted at supplied coordinates");
            return;
        }

        if let Some(address) = self.props.initial_address.clone() {
            self.state.address = address;
        }

        if !self.locator.is_supported() {
            self.fall_back(GeolocationError::Unsupported);
            return;
        }

        let locator = Arc::clone(&self.locator);
        let geocoder = Arc::clone(&self.geocoder);
        let options = self.settings.position_options;
        let tx = self.events.clone();

        self.locate_task = Some(tokio::spawn(async move {
            let position =
                tokio::time::timeout(options.timeout, locator.current_position(&options)).await;

            let outcome = match position {
                Ok(Ok(coords)) if coords.validate().is_ok() => {
                    let coords = coords.rounded();
                    let name = match geocoder.reverse_geocode(coords).await {
                        Ok(name) => name,
                        Err(e) => {
                            warn!("reverse geocoding of current position failed: {}", e);
                            None
                        }
                    };
                    Ok(Located {
                        coordinates: coords,
                        name,
                    })
                }
                Ok(Ok(_)) => Err(GeolocationError::PositionUnavailable),
                Ok(Err(e)) => Err(e),
                Err(_) => Err(GeolocationError::Timeout),
            };

            let _ = tx.send(Event::Located(outcome));
        }));
    }

    pub(super) fn on_located(&mut self, outcome: Result<Located, GeolocationError>) {
        self.locate_task = None;

        if !self.state.loading {
            debug!("geolocation result after user selection dropped");
            return;
        }

        let located = match outcome {
            Ok(located) => located,
            Err(e) => {
                self.fall_back(e);
                return;
            }
        };

        info!(coords = %located.coordinates, "current position located");

        let label = match located.name {
            Some(name) => {
                self.reverse.remember(located.coordinates.key());
                name
            }
            None => self.settings.messages.current_location.clone(),
        };

        self.resolve_initial(located.coordinates, label);
    }

    /// A location chosen by the user ends any pending geolocation
    pub(super) fn end_bootstrap(&mut self) {
        if let Some(task) = self.locate_task.take() {
            task.abort();
            info!("geolocation abandoned for user selection");
        }
        self.state.loading = false;
    }

    /// Adopt the default location and surface why
    fn fall_back(&mut self, error: GeolocationError) {
        warn!("geolocation unavailable ({}), using default location", error);

        let message = message_for(error, &self.settings.messages).to_string();
        self.show_notice(error, message);

        let coords = self.settings.default_location;
        let label = self.settings.default_label.clone();
        self.resolve_initial(coords, label);
    }

    /// Terminal step of every geolocation path: each callback fires once
    fn resolve_initial(&mut self, coords: Coordinates, label: String) {
        self.state.loading = false;
        self.state.location_name = Some(label.clone());
        self.state.address = label.clone();

        self.adopt(coords, self.recenter(), true);
        self.callbacks.emit_address(&label);
    }

    fn show_notice(&mut self, kind: GeolocationError, message: String) {
        self.next_notice_id += 1;
        self.state.notice = Some(Notice {
            id: self.next_notice_id,
            kind,
            message,
        });
        self.notice_timer
            .schedule(self.settings.notice_duration, &self.events, Event::NoticeExpired);
    }

    pub(super) fn on_notice_expired(&mut self, generation: u64) {
        if self.notice_timer.fire(generation) {
            self.state.notice = None;
        }
    }

    fn recenter(&self) -> ViewMove {
        ViewMove::Recenter {
            threshold_meters: self.settings.recenter_threshold_m,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_for_each_error() {
        let messages = MessagesConfig::default();
        let all = [
            GeolocationError::PermissionDenied,
            GeolocationError::PositionUnavailable,
            GeolocationError::Timeout,
            GeolocationError::Unknown,
            GeolocationError::Unsupported,
        ];
        let texts: std::collections::HashSet<&str> =
            all.iter().map(|e| message_for(*e, &messages)).collect();
        assert_eq!(texts.len(), all.len());
        assert_eq!(
            message_for(GeolocationError::PermissionDenied, &messages),
            messages.permission_denied
        );
    }
}
