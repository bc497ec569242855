use std::time::Instant;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use crate::config::UpstreamConfig;
use crate::models::{Coordinate, LineString, RouteResult};
use crate::{HouseSearchError, Result};

/// Source of driving routes
#[async_trait]
pub trait RouteProvider: Send + Sync {
    async fn route(&self, source: Coordinate, destination: Coordinate) -> Result<RouteResult>;
}

/// Route between two optional endpoints; both are required.
#[instrument(skip(provider))]
pub async fn get_route(
    provider: &dyn RouteProvider,
    source: Option<Coordinate>,
    destination: Option<Coordinate>,
) -> Result<RouteResult> {
    let (Some(source), Some(destination)) = (source, destination) else {
        return Err(HouseSearchError::invalid_argument(
            "Both src and dest are required",
        ));
    };

    let route = provider.route(source, destination).await?;
    debug!(
        "Route with {} points, {:.0}m, {:.0}s",
        route.geometry.len(),
        route.distance_meters,
        route.duration_seconds
    );
    Ok(route)
}

/// Client for OSRM compatible routing services
pub struct OsrmClient {
    client: Client,
    base_url: String,
    profile: String,
}

#[derive(Debug, Deserialize)]
struct OsrmResponse {
    code: String,
    message: Option<String>,
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Debug, Deserialize)]
struct OsrmRoute {
    geometry: LineString,
    duration: f64,
    distance: f64,
}

impl OsrmResponse {
    /// Translate the first route alternative
    fn into_route(self) -> Result<RouteResult> {
        match self.code.as_str() {
            "Ok" => {}
            "NoRoute" | "NoSegment" => {
                return Err(HouseSearchError::not_found("No route found"));
            }
            code => {
                return Err(HouseSearchError::service_unavailable(format!(
                    "Routing service returned {code}: {}",
                    self.message.unwrap_or_default()
                )));
            }
        }

        let route = self
            .routes
            .into_iter()
            .next()
            .ok_or_else(|| HouseSearchError::not_found("No route found"))?;

        Ok(RouteResult {
            geometry: route.geometry.to_coordinates()?,
            duration_seconds: route.duration,
            distance_meters: route.distance,
        })
    }
}

impl OsrmClient {
    pub fn new(client: Client, config: &UpstreamConfig) -> Self {
        Self {
            client,
            base_url: config.routing_base_url.trim_end_matches('/').to_string(),
            profile: config.routing_profile.clone(),
        }
    }

    fn route_url(&self, source: &Coordinate, destination: &Coordinate) -> String {
        // OSRM takes longitude first
        format!(
            "{}/route/v1/{}/{},{};{},{}?overview=full&geometries=geojson",
            self.base_url,
            self.profile,
            source.longitude,
            source.latitude,
            destination.longitude,
            destination.latitude
        )
    }
}

#[async_trait]
impl RouteProvider for OsrmClient {
    #[instrument(skip(self))]
    async fn route(&self, source: Coordinate, destination: Coordinate) -> Result<RouteResult> {
        let url = self.route_url(&source, &destination);
        let start_time = Instant::now();

        let response = self.client.get(&url).send().await?;
        let status = response.status();

        // OSRM reports NoRoute and friends with a 400 and a JSON body
        let body = response.text().await?;
        let parsed: OsrmResponse = serde_json::from_str(&body).map_err(|e| {
            warn!("Unparseable routing response (HTTP {status}): {e}");
            HouseSearchError::service_unavailable(format!(
                "Failed to parse routing response (HTTP {status}): {e}"
            ))
        })?;

        info!(
            "Routing call finished in {:.3}s with code {}",
            start_time.elapsed().as_secs_f64(),
            parsed.code
        );

        parsed.into_route()
    }
}
