//! Location model for geographic coordinates and IP-derived metadata

use serde::{Deserialize, Serialize};

use crate::{HouseSearchError, Result};

/// A point on the map in decimal degrees
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct Coordinate {
    /// Latitude in decimal degrees
    pub latitude: f64,
    /// Longitude in decimal degrees
    pub longitude: f64,
}

impl Coordinate {
    /// Create a coordinate, rejecting non-finite or out-of-range values
    pub fn new(latitude: f64, longitude: f64) -> Result<Self> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(HouseSearchError::invalid_argument(format!(
                "Latitude must be between -90 and 90, got: {latitude}"
            )));
        }

        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(HouseSearchError::invalid_argument(format!(
                "Longitude must be between -180 and 180, got: {longitude}"
            )));
        }

        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Build from a `[lat, lng]` pair as sent by the map client
    pub fn from_lat_lng(pair: [f64; 2]) -> Result<Self> {
        Self::new(pair[0], pair[1])
    }

    /// Build from a `[lng, lat]` pair as emitted by GeoJSON providers
    pub fn from_lng_lat(pair: [f64; 2]) -> Result<Self> {
        Self::new(pair[1], pair[0])
    }

    /// Longitude-first pair, the GeoJSON / OSRM convention
    #[must_use]
    pub fn to_lng_lat(&self) -> [f64; 2] {
        [self.longitude, self.latitude]
    }

    /// Format location as coordinates string
    #[must_use]
    pub fn format_coordinates(&self) -> String {
        format!("{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

/// Where the IP lookup places the user
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct LocationInfo {
    #[serde(flatten)]
    pub coordinate: Coordinate,
    pub city: String,
    pub region: String,
    pub country: String,
}

impl LocationInfo {
    /// Location reported when the lookup cannot place the caller
    #[must_use]
    pub fn fallback() -> Self {
        Self {
            coordinate: Coordinate {
                latitude: 28.6139,
                longitude: 77.2090,
            },
            city: "New Delhi".to_string(),
            region: "Delhi".to_string(),
            country: "India".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(91.0, 0.0)]
    #[case(-90.5, 0.0)]
    #[case(0.0, 180.1)]
    #[case(0.0, -181.0)]
    #[case(f64::NAN, 0.0)]
    #[case(0.0, f64::INFINITY)]
    fn test_coordinate_rejects_out_of_range(#[case] lat: f64, #[case] lng: f64) {
        let err = Coordinate::new(lat, lng).unwrap_err();
        assert!(matches!(err, HouseSearchError::InvalidArgument { .. }));
    }

    #[test]
    fn test_coordinate_accepts_bounds() {
        assert!(Coordinate::new(90.0, 180.0).is_ok());
        assert!(Coordinate::new(-90.0, -180.0).is_ok());
    }

    #[test]
    fn test_coordinate_order_conversions() {
        let from_client = Coordinate::from_lat_lng([52.52, 13.405]).unwrap();
        let from_geojson = Coordinate::from_lng_lat([13.405, 52.52]).unwrap();
        assert_eq!(from_client, from_geojson);
        assert_eq!(from_client.to_lng_lat(), [13.405, 52.52]);
    }

    #[test]
    fn test_location_info_serializes_flat() {
        let value = serde_json::to_value(LocationInfo::fallback()).unwrap();
        assert_eq!(value["latitude"], 28.6139);
        assert_eq!(value["longitude"], 77.2090);
        assert_eq!(value["city"], "New Delhi");
        assert_eq!(value["region"], "Delhi");
        assert_eq!(value["country"], "India");
    }
}
