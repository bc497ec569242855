//! Data models for the house search backend
//!
//! This module contains the core domain models organized by concern:
//! - Location: coordinates and IP-derived location info
//! - Listing: generated house listings
//! - Route: driving routes returned by the routing provider

pub mod listing;
pub mod location;
pub mod route;

// Re-export all public types for convenient access
pub use listing::HouseListing;
pub use location::{Coordinate, LocationInfo};
pub use route::{LineString, RouteResult};
