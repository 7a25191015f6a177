//! Pin-drop interaction
//!
//! Pin mode is a two-state machine: OFF→ON on toggle, ON→OFF on toggle or
//! after a successful placement. The click handler reads the mode from the
//! map container attribute, so it always sees the latest toggle.

use crate::coord::Coordinates;
use crate::geo::GeoBackend;
use crate::geo::locate::PositionSource;
use crate::map::{MapSurface, ViewMove};
use crate::picker::Picker;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Whether map clicks set the location
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PinMode {
    #[default]
    Off,
    On,
}

impl PinMode {
    pub fn toggled(self) -> Self {
        match self {
            Self::Off => Self::On,
            Self::On => Self::Off,
        }
    }

    pub fn as_attr(self) -> &'static str {
        match self {
            Self::Off => "false",
            Self::On => "true",
        }
    }

    pub fn from_attr(value: Option<&str>) -> Self {
        match value {
            Some("true") => Self::On,
            _ => Self::Off,
        }
    }
}

/// At most one accepted placement per interval
#[derive(Debug)]
pub(crate) struct PinThrottle {
    interval: Duration,
    last: Option<Instant>,
}

impl PinThrottle {
    pub fn new(interval: Duration) -> Self {
        Self { interval, last: None }
    }

    pub fn try_acquire(&mut self, now: Instant) -> bool {
        match self.last {
            Some(last) if now.saturating_duration_since(last) < self.interval => false,
            _ => {
                self.last = Some(now);
                true
            }
        }
    }
}

impl<G, P, S> Picker<G, P, S>
where
    G: GeoBackend + 'static,
    P: PositionSource + 'static,
    S: MapSurface + 'static,
{
    pub(super) fn on_toggle_pin_mode(&mut self) {
        self.state.pin_mode = self.state.pin_mode.toggled();
        self.map.set_pin_mode(self.state.pin_mode);
        debug!(mode = ?self.state.pin_mode, "pin mode toggled");
    }

    pub(super) fn on_map_click(&mut self, at: Coordinates) {
        if !self.map.accepts_clicks() {
            debug!("map click before initialization ignored");
            return;
        }

        // Read through the container, not the picker field
        if self.map.pin_mode() == PinMode::Off {
            return;
        }

        if at.validate().is_err() {
            debug!(%at, "pin outside valid range ignored");
            return;
        }

        if !self.pin_throttle.try_acquire(Instant::now()) {
            debug!("pin placement throttled");
            return;
        }

        self.end_bootstrap();
        let view = ViewMove::Recenter {
            threshold_meters: self.settings.recenter_threshold_m,
        };
        self.adopt(at, view, false);

        self.state.pin_mode = PinMode::Off;
        self.map.set_pin_mode(PinMode::Off);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_machine() {
        assert_eq!(PinMode::default(), PinMode::Off);
        assert_eq!(PinMode::Off.toggled(), PinMode::On);
        assert_eq!(PinMode::On.toggled(), PinMode::Off);
    }

    #[test]
    fn test_attr_round_trip() {
        for mode in [PinMode::Off, PinMode::On] {
            assert_eq!(PinMode::from_attr(Some(mode.as_attr())), mode);
        }
        assert_eq!(PinMode::from_attr(None), PinMode::Off);
        assert_eq!(PinMode::from_attr(Some("yes")), PinMode::Off);
    }

    #[tokio::test(start_paused = true)]
    async fn test_throttle() {
        let mut throttle = PinThrottle::new(Duration::from_millis(300));
        let start = Instant::now();

        assert!(throttle.try_acquire(start));
        assert!(!throttle.try_acquire(start + Duration::from_millis(100)));
        assert!(!throttle.try_acquire(start + Duration::from_millis(299)));
        assert!(throttle.try_acquire(start + Duration::from_millis(300)));
    }
}
