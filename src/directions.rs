//! Driving directions between two points.
//!
//! [`DirectionsProvider`] is the seam the controller talks to. The shipped
//! implementation, [`OsrmDirections`], queries an OSRM server over HTTP.

use crate::config::DirectionsConfig;
use crate::models::{Coordinate, Route, TransportType};
use reqwest::Client;
use serde::Deserialize;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionsRequest {
    pub source: Coordinate,
    pub destination: Coordinate,
    pub transport_type: TransportType,
}

#[derive(Error, Debug)]
pub enum DirectionsError {
    #[error("API Error ({code}): {message}")]
    Api { code: String, message: String },

    #[error("Underlying request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Failed to parse JSON response: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Computes candidate routes for a request.
///
/// The returned future must not borrow the provider: the controller spawns
/// it and hands the result back through the event channel.
pub trait DirectionsProvider: Send + Sync + 'static {
    fn calculate(
        &self,
        request: DirectionsRequest,
    ) -> impl Future<Output = Result<Vec<Route>, DirectionsError>> + Send + 'static;
}

// --- Data Structures for parsing OSRM responses ---
#[derive(Deserialize)]
struct OsrmResponse {
    code: String,
    message: Option<String>,
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Deserialize)]
struct OsrmRoute {
    distance: f64,
    duration: f64,
    geometry: OsrmGeometry,
}

#[derive(Deserialize)]
struct OsrmGeometry {
    coordinates: Vec<[f64; 2]>,
}

pub struct OsrmDirections {
    client: Client,
    base_url: String,
}

impl OsrmDirections {
    pub fn new(config: &DirectionsConfig) -> Result<Self, DirectionsError> {
        Ok(Self {
            client: Client::builder()
                .timeout(Duration::from_secs(config.timeout_seconds))
                .build()?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn route_url(&self, request: &DirectionsRequest) -> String {
        // OSRM wants lon,lat pairs.
        format!(
            "{}/route/v1/{}/{},{};{},{}?overview=full&geometries=geojson&alternatives=true",
            self.base_url,
            request.transport_type.profile(),
            request.source.longitude,
            request.source.latitude,
            request.destination.longitude,
            request.destination.latitude,
        )
    }
}

impl DirectionsProvider for OsrmDirections {
    fn calculate(
        &self,
        request: DirectionsRequest,
    ) -> impl Future<Output = Result<Vec<Route>, DirectionsError>> + Send + 'static {
        let client = self.client.clone();
        let url = self.route_url(&request);

        async move {
            debug!("[DIRECTIONS] GET {}", url);
            let text = client.get(&url).send().await?.text().await?;
            parse_routes(&text).map_err(|e| {
                error!("Failed to read directions response. URL: {}\nError: {}", url, e);
                e
            })
        }
    }
}

/// Turns an OSRM `route` service body into routes, in the server's order.
fn parse_routes(body: &str) -> Result<Vec<Route>, DirectionsError> {
    let response: OsrmResponse = serde_json::from_str(body)?;
    if response.code != "Ok" {
        return Err(DirectionsError::Api {
            message: response.message.unwrap_or_default(),
            code: response.code,
        });
    }

    Ok(response
        .routes
        .into_iter()
        .map(|r| Route {
            polyline: r
                .geometry
                .coordinates
                .into_iter()
                .map(|[lon, lat]| Coordinate::new(lat, lon))
                .collect(),
            distance_m: r.distance,
            expected_travel_time_s: r.duration,
        })
        .collect())
}
