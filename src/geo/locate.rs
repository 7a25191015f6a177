//! Device geolocation
//!
//! A [`PositionSource`] answers "where am I?" once. The picker bootstrap
//! enforces the timeout itself, so sources only need to report a position
//! or a classified failure.

use crate::constants::geolocation::{MAXIMUM_AGE_MS, TIMEOUT_MS};
use crate::coord::Coordinates;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

/// Classified geolocation failure
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeolocationError {
    #[error("location permission denied")]
    PermissionDenied,

    #[error("position unavailable")]
    PositionUnavailable,

    #[error("location request timed out")]
    Timeout,

    #[error("unknown geolocation error")]
    Unknown,

    #[error("geolocation is not supported")]
    Unsupported,
}

/// Options for a one-shot position request
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionOptions {
    pub enable_high_accuracy: bool,
    pub timeout: Duration,
    /// Oldest cached position a source may answer with
    pub maximum_age: Duration,
}

impl Default for PositionOptions {
    fn default() -> Self {
        Self {
            enable_high_accuracy: true,
            timeout: Duration::from_millis(TIMEOUT_MS),
            maximum_age: Duration::from_millis(MAXIMUM_AGE_MS),
        }
    }
}

/// A source of the user's current position
pub trait PositionSource: Send + Sync {
    /// Whether this source can answer at all
    ///
    /// The picker skips the request and falls back immediately when false.
    fn is_supported(&self) -> bool {
        true
    }

    /// Request the current position once
    fn current_position(
        &self,
        options: &PositionOptions,
    ) -> impl Future<Output = std::result::Result<Coordinates, GeolocationError>> + Send;
}

/// A source that always answers with the same position
#[derive(Debug, Clone, Copy)]
pub struct FixedPosition(pub Coordinates);

impl PositionSource for FixedPosition {
    async fn current_position(
        &self,
        _options: &PositionOptions,
    ) -> std::result::Result<Coordinates, GeolocationError> {
        Ok(self.0)
    }
}

/// A source for environments with no location capability
#[derive(Debug, Clone, Copy, Default)]
pub struct Unsupported;

impl PositionSource for Unsupported {
    fn is_supported(&self) -> bool {
        false
    }

    async fn current_position(
        &self,
        _options: &PositionOptions,
    ) -> std::result::Result<Coordinates, GeolocationError> {
        Err(GeolocationError::Unsupported)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = PositionOptions::default();
        assert!(options.enable_high_accuracy);
        assert_eq!(options.timeout, Duration::from_secs(10));
        assert_eq!(options.maximum_age, Duration::from_secs(60));
    }

    #[tokio::test]
    async fn test_fixed_position() {
        let source = FixedPosition(Coordinates::new(13.736717, 100.523186));
        let position = source.current_position(&PositionOptions::default()).await.unwrap();
        assert_eq!(position.lat, 13.736717);
    }

    #[tokio::test]
    async fn test_unsupported() {
        let source = Unsupported;
        assert!(!source.is_supported());
        let err = source.current_position(&PositionOptions::default()).await.unwrap_err();
        assert_eq!(err, GeolocationError::Unsupported);
    }
}
