//! HTTP API routes
//!
//! Defines all REST API endpoints for the server.

use crate::coord::Coordinates;
use crate::error::Error;
use crate::geo::locate::{GeolocationError, PositionOptions};
use crate::geo::{GeoBackend, SearchResult};
use crate::map::{TileLayer, PIN_MODE_ATTR};
use crate::picker::bootstrap::message_for;
use crate::server::state::AppState;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::warn;

/// Upper bound on `limit` for `/api/search`
const MAX_SEARCH_LIMIT: usize = 10;

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/status", get(status_handler))
        .route("/api/reverse", get(reverse_handler))
        .route("/api/search", get(search_handler))
        .route("/api/location", get(location_handler))
        .route("/api/map", get(map_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// API error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub error: String,
    pub code: String,
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self.code.as_str() {
            "UPSTREAM_ERROR" => StatusCode::BAD_GATEWAY,
            "INTERNAL_ERROR" => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status(), Json(self)).into_response()
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        let code = match &err {
            Error::InvalidCoordinates(_) => "INVALID_COORDINATES",
            Error::Config(_) => "CONFIG_ERROR",
            Error::Http(_) | Error::Geocoding(_) | Error::Geo(_) => "UPSTREAM_ERROR",
            _ => "INTERNAL_ERROR",
        };
        ApiError {
            error: err.to_string(),
            code: code.to_string(),
        }
    }
}

/// Server status response
#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub running: bool,
    pub version: String,
    pub geocoder: String,
    pub uptime_secs: u64,
}

/// Get server status
///
/// GET /api/status
async fn status_handler(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    Json(StatusResponse {
        running: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
        geocoder: state.geocoder.name().to_string(),
        uptime_secs: state.uptime_secs(),
    })
}

/// Coordinate query parameters
///
/// Taken as text so malformed values produce an `INVALID_COORDINATES`
/// error instead of a bare extractor rejection.
#[derive(Debug, Deserialize)]
pub struct ReverseQuery {
    pub lat: Option<String>,
    pub lng: Option<String>,
}

impl ReverseQuery {
    fn coordinates(&self) -> Result<Coordinates, Error> {
        let parse = |name: &str, value: &Option<String>| {
            value
                .as_deref()
                .map(str::trim)
                .and_then(|v| v.parse::<f64>().ok())
                .ok_or_else(|| Error::InvalidCoordinates(format!("missing or malformed {}", name)))
        };

        let coords = Coordinates::new(parse("lat", &self.lat)?, parse("lng", &self.lng)?);
        coords.validate()?;
        Ok(coords.rounded())
    }
}

/// Reverse geocoding response
#[derive(Debug, Serialize, Deserialize)]
pub struct ReverseResponse {
    pub lat: f64,
    pub lng: f64,
    /// Deduplication key of the rounded pair
    pub key: String,
    pub display_name: String,
    /// False when `display_name` is the fallback label
    pub resolved: bool,
}

/// Resolve coordinates to a place name
///
/// GET /api/reverse?lat=..&lng=..
async fn reverse_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ReverseQuery>,
) -> Result<Json<ReverseResponse>, ApiError> {
    let coords = query.coordinates()?;

    let name = match state.geocoder.reverse_geocode(coords).await {
        Ok(name) => name,
        Err(e) => {
            warn!(key = %coords.key(), "reverse geocoding failed: {}", e);
            None
        }
    };

    let resolved = name.is_some();
    Ok(Json(ReverseResponse {
        lat: coords.lat,
        lng: coords.lng,
        key: coords.key(),
        display_name: name.unwrap_or_else(|| state.config.messages.fallback_label.clone()),
        resolved,
    }))
}

/// Search query parameters
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
    pub limit: Option<usize>,
}

/// Search response
#[derive(Debug, Serialize, Deserialize)]
pub struct SearchResponse {
    pub results: Vec<SearchResult>,
}

/// Search for addresses
///
/// GET /api/search?q=..&limit=..
async fn search_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<SearchResponse>, ApiError> {
    let text = query.q.as_deref().map(str::trim).unwrap_or_default();
    if text.is_empty() {
        return Ok(Json(SearchResponse { results: Vec::new() }));
    }

    let limit = query
        .limit
        .unwrap_or(state.config.picker.search_limit)
        .clamp(1, MAX_SEARCH_LIMIT);

    let results = state.geocoder.search(text, limit).await?;
    Ok(Json(SearchResponse { results }))
}

/// Location response
#[derive(Debug, Serialize, Deserialize)]
pub struct LocationResponse {
    pub lat: f64,
    pub lng: f64,
    pub display_name: String,
    /// True when the default location was used
    pub fallback: bool,
    /// Why the default location was used
    pub message: Option<String>,
}

/// Get the caller's location, or the default location
///
/// GET /api/location
async fn location_handler(State(state): State<Arc<AppState>>) -> Json<LocationResponse> {
    let options = PositionOptions::default();
    let located =
        tokio::time::timeout(options.timeout, state.locator.locate(options.maximum_age)).await;

    let error = match located {
        Ok(Ok(location)) => {
            let coords = location.coordinates.rounded();
            return Json(LocationResponse {
                lat: coords.lat,
                lng: coords.lng,
                display_name: location.display_name,
                fallback: false,
                message: None,
            });
        }
        Ok(Err(e)) => {
            warn!("ip location failed: {}", e);
            GeolocationError::PositionUnavailable
        }
        Err(_) => GeolocationError::Timeout,
    };

    let default = &state.config.picker.default_location;
    let coords = Coordinates::new(default.lat, default.lng).rounded();
    Json(LocationResponse {
        lat: coords.lat,
        lng: coords.lng,
        display_name: default.label.clone(),
        fallback: true,
        message: Some(message_for(error, &state.config.messages).to_string()),
    })
}

/// Map defaults for clients rendering their own surface
#[derive(Debug, Serialize, Deserialize)]
pub struct MapResponse {
    pub tile_layer: TileLayer,
    pub zoom: u8,
    pub default_center: Coordinates,
    pub default_label: String,
    pub pin_mode_attr: String,
}

/// Get map configuration
///
/// GET /api/map
async fn map_handler(State(state): State<Arc<AppState>>) -> Json<MapResponse> {
    let config = &state.config;
    let default = &config.picker.default_location;
    Json(MapResponse {
        tile_layer: TileLayer::from_config(&config.map),
        zoom: config.map.zoom,
        default_center: Coordinates::new(default.lat, default.lng).rounded(),
        default_label: default.label.clone(),
        pin_mode_attr: PIN_MODE_ATTR.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::geo::ip_location::IpLocator;
    use crate::geo::nominatim::NominatimBackend;
    use axum::body::{Body, Bytes};
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use std::time::Duration;
    use tower::ServiceExt;

    /// State whose geocoder points at a closed local port
    fn create_test_state() -> Arc<AppState> {
        let geocoder =
            NominatimBackend::with_base_url("http://127.0.0.1:9", "geopick-test", Duration::from_secs(2))
                .unwrap();
        Arc::new(AppState::with_backends(
            Config::default(),
            geocoder,
            IpLocator::without_cache(),
        ))
    }

    async fn get(uri: &str) -> (StatusCode, Bytes) {
        let app = create_router(create_test_state());
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, body)
    }

    #[tokio::test]
    async fn test_status_endpoint() {
        let (status, body) = get("/api/status").await;
        assert_eq!(status, StatusCode::OK);

        let status: StatusResponse = serde_json::from_slice(&body).unwrap();
        assert!(status.running);
        assert_eq!(status.geocoder, "nominatim");
        assert_eq!(status.version, env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn test_map_endpoint() {
        let (status, body) = get("/api/map").await;
        assert_eq!(status, StatusCode::OK);

        let map: MapResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(map.zoom, 15);
        assert_eq!(map.tile_layer.min_zoom, 3);
        assert_eq!(map.tile_layer.max_zoom, 19);
        assert_eq!(map.tile_layer.attribution, "© OpenStreetMap contributors");
        assert_eq!(map.default_center, Coordinates::new(13.7563, 100.5018));
        assert_eq!(map.pin_mode_attr, "data-pin-mode");
    }

    #[tokio::test]
    async fn test_reverse_invalid_coordinates() {
        for uri in [
            "/api/reverse?lat=95&lng=100.5",
            "/api/reverse?lat=13.7&lng=181",
            "/api/reverse?lat=north&lng=100.5",
            "/api/reverse?lat=13.7",
        ] {
            let (status, body) = get(uri).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);

            let err: ApiError = serde_json::from_slice(&body).unwrap();
            assert_eq!(err.code, "INVALID_COORDINATES");
        }
    }

    #[tokio::test]
    async fn test_reverse_failure_uses_fallback_label() {
        let (status, body) = get("/api/reverse?lat=13.736717&lng=100.523186").await;
        assert_eq!(status, StatusCode::OK);

        let reverse: ReverseResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(reverse.key, "13.7367,100.5232");
        assert_eq!(reverse.lat, 13.7367);
        assert_eq!(reverse.display_name, "Selected location");
        assert!(!reverse.resolved);
    }

    #[tokio::test]
    async fn test_search_empty_query() {
        for uri in ["/api/search", "/api/search?q=", "/api/search?q=%20%20"] {
            let (status, body) = get(uri).await;
            assert_eq!(status, StatusCode::OK);

            let search: SearchResponse = serde_json::from_slice(&body).unwrap();
            assert!(search.results.is_empty());
        }
    }

    #[tokio::test]
    async fn test_search_upstream_failure() {
        let (status, body) = get("/api/search?q=Bangkok&limit=50").await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);

        let err: ApiError = serde_json::from_slice(&body).unwrap();
        assert_eq!(err.code, "UPSTREAM_ERROR");
    }

    #[test]
    fn test_error_codes() {
        let err = ApiError::from(Error::InvalidCoordinates("lat".to_string()));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let err = ApiError::from(Error::Geocoding("down".to_string()));
        assert_eq!(err.code, "UPSTREAM_ERROR");
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);

        let err = ApiError::from(Error::Unmounted);
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
