//! `house_search` - backend for a map based house search demo
//!
//! Locates the user by IP, fabricates house listings around a point on the
//! map, and proxies driving routes between two points. Geolocation and routing
//! are delegated to public upstream services (ip-api.com and OSRM by default).

pub mod api;
pub mod config;
pub mod error;
pub mod listings;
pub mod location_resolver;
pub mod models;
pub mod routing;
pub mod telemetry;
pub mod web;

// Re-export core types for public API
pub use config::HouseSearchConfig;
pub use error::HouseSearchError;
pub use location_resolver::{IpApiClient, IpLocationProvider, LocationResolver};
pub use models::{Coordinate, HouseListing, LocationInfo, RouteResult};
pub use routing::{OsrmClient, RouteProvider};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, HouseSearchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
