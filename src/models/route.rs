//! Driving route model
//!
//! Routes are kept latitude-first internally. The routing provider and the map
//! client both speak GeoJSON, which is longitude-first, so the wire format
//! goes through [`LineString`].

use serde::{Deserialize, Serialize};

use super::Coordinate;
use crate::{HouseSearchError, Result};

/// A driving route between two points
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "WireRoute", into = "WireRoute")]
pub struct RouteResult {
    /// Path of the route, latitude-first
    pub geometry: Vec<Coordinate>,
    /// Expected travel time in seconds
    pub duration_seconds: f64,
    /// Route length in meters
    pub distance_meters: f64,
}

/// GeoJSON `LineString` geometry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineString {
    #[serde(rename = "type")]
    pub kind: String,
    /// `[longitude, latitude]` pairs
    pub coordinates: Vec<[f64; 2]>,
}

impl LineString {
    pub const TYPE: &'static str = "LineString";

    #[must_use]
    pub fn from_coordinates(points: &[Coordinate]) -> Self {
        Self {
            kind: Self::TYPE.to_string(),
            coordinates: points.iter().map(Coordinate::to_lng_lat).collect(),
        }
    }

    /// Swap every `[lng, lat]` pair into a [`Coordinate`]
    pub fn to_coordinates(&self) -> Result<Vec<Coordinate>> {
        if self.kind != Self::TYPE {
            return Err(HouseSearchError::service_unavailable(format!(
                "Expected {} geometry, got {}",
                Self::TYPE,
                self.kind
            )));
        }

        self.coordinates
            .iter()
            .map(|pair| Coordinate::from_lng_lat(*pair))
            .collect()
    }
}

#[derive(Serialize, Deserialize)]
struct WireRoute {
    geometry: LineString,
    duration: f64,
    distance: f64,
}

impl From<RouteResult> for WireRoute {
    fn from(route: RouteResult) -> Self {
        Self {
            geometry: LineString::from_coordinates(&route.geometry),
            duration: route.duration_seconds,
            distance: route.distance_meters,
        }
    }
}

impl TryFrom<WireRoute> for RouteResult {
    type Error = HouseSearchError;

    fn try_from(wire: WireRoute) -> Result<Self> {
        Ok(Self {
            geometry: wire.geometry.to_coordinates()?,
            duration_seconds: wire.duration,
            distance_meters: wire.distance,
        })
    }
}
