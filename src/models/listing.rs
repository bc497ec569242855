use serde::{Deserialize, Serialize};

use super::Coordinate;

/// A synthetic house on the map. Generated per request, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "WireListing", into = "WireListing")]
pub struct HouseListing {
    pub coordinate: Coordinate,
    pub price: u32,
}

/// Shape the map client expects: `{lat, lng, price}`
#[derive(Serialize, Deserialize)]
struct WireListing {
    lat: f64,
    lng: f64,
    price: u32,
}

impl From<HouseListing> for WireListing {
    fn from(listing: HouseListing) -> Self {
        Self {
            lat: listing.coordinate.latitude,
            lng: listing.coordinate.longitude,
            price: listing.price,
        }
    }
}

impl From<WireListing> for HouseListing {
    fn from(wire: WireListing) -> Self {
        Self {
            coordinate: Coordinate {
                latitude: wire.lat,
                longitude: wire.lng,
            },
            price: wire.price,
        }
    }
}
