//! Location Resolution Module
//!
//! Turns the caller's IP address into a [`LocationInfo`] by asking an
//! ip-api.com compatible geolocation service. When the service cannot place
//! the caller (private address, lookup reported as failed) the fixed
//! [`LocationInfo::fallback`] is returned instead of an error. Only transport
//! level failures surface as errors.

use std::net::IpAddr;
use std::time::Instant;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use crate::config::UpstreamConfig;
use crate::models::{Coordinate, LocationInfo};
use crate::{HouseSearchError, Result};

/// Source of IP based geolocation
#[async_trait]
pub trait IpLocationProvider: Send + Sync {
    /// Look up `ip`, or the caller's public address when `None`.
    ///
    /// Returns `Ok(None)` when the provider answered but could not place the
    /// address.
    async fn lookup(&self, ip: Option<IpAddr>) -> Result<Option<LocationInfo>>;
}

/// Service for resolving client addresses
pub struct LocationResolver;

impl LocationResolver {
    /// Resolve the client address into a location, degrading to the fallback
    #[instrument(skip(provider))]
    pub async fn resolve(
        provider: &dyn IpLocationProvider,
        client_ip: Option<IpAddr>,
    ) -> Result<LocationInfo> {
        let hint = match client_ip.map(|ip| ip.to_canonical()) {
            None => None,
            Some(ip) if ip.is_loopback() || ip.is_unspecified() => {
                debug!("Local client address {ip}, letting the provider infer it");
                None
            }
            Some(ip) if is_private(&ip) => {
                debug!("Private client address {ip}, using fallback location");
                return Ok(LocationInfo::fallback());
            }
            Some(ip) => Some(ip),
        };

        match provider.lookup(hint).await? {
            Some(location) => {
                debug!(
                    "Resolved {:?} to {} at ({})",
                    hint,
                    location.city,
                    location.coordinate.format_coordinates()
                );
                Ok(location)
            }
            None => {
                warn!("IP lookup could not place {:?}, using fallback location", hint);
                Ok(LocationInfo::fallback())
            }
        }
    }
}

/// Addresses a public geolocation service cannot place
pub(crate) fn is_private(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => v4.is_private() || v4.is_link_local(),
        IpAddr::V6(v6) => v6.is_unique_local() || v6.is_unicast_link_local(),
    }
}

/// Client for ip-api.com style JSON endpoints
pub struct IpApiClient {
    client: Client,
    base_url: String,
}

/// ip-api.com response body
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IpApiResponse {
    status: String,
    message: Option<String>,
    lat: Option<f64>,
    lon: Option<f64>,
    city: Option<String>,
    region_name: Option<String>,
    country: Option<String>,
}

impl IpApiResponse {
    fn into_location(self) -> Option<LocationInfo> {
        if self.status != "success" {
            debug!(
                "IP lookup reported {}: {}",
                self.status,
                self.message.as_deref().unwrap_or("no message")
            );
            return None;
        }

        let coordinate = Coordinate::new(self.lat?, self.lon?).ok()?;
        Some(LocationInfo {
            coordinate,
            city: self.city.unwrap_or_default(),
            region: self.region_name.unwrap_or_default(),
            country: self.country.unwrap_or_default(),
        })
    }
}

impl IpApiClient {
    pub fn new(client: Client, config: &UpstreamConfig) -> Self {
        Self {
            client,
            base_url: config.ip_location_base_url.trim_end_matches('/').to_string(),
        }
    }

    fn lookup_url(&self, ip: Option<IpAddr>) -> String {
        match ip {
            Some(ip) => format!("{}/json/{ip}", self.base_url),
            None => format!("{}/json/", self.base_url),
        }
    }
}

#[async_trait]
impl IpLocationProvider for IpApiClient {
    #[instrument(skip(self))]
    async fn lookup(&self, ip: Option<IpAddr>) -> Result<Option<LocationInfo>> {
        let url = self.lookup_url(ip);
        let start_time = Instant::now();

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(HouseSearchError::service_unavailable(format!(
                "IP location service returned HTTP {status}"
            )));
        }

        let body: IpApiResponse = response.json().await.map_err(|e| {
            HouseSearchError::service_unavailable(format!(
                "Failed to parse IP location response: {e}"
            ))
        })?;

        info!(
            "IP lookup finished in {:.3}s with status {}",
            start_time.elapsed().as_secs_f64(),
            body.status
        );

        Ok(body.into_location())
    }
}
