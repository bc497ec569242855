//! Mock house listings
//!
//! There is no listings database behind this service. Houses are fabricated on
//! every request by sampling points uniformly (by area) inside a circle around
//! the requested center, each with a random asking price.
//!
//! Meters are converted to degrees with a flat [`METERS_PER_DEGREE`] factor.
//! That is only accurate near the equator: longitude degrees shrink with
//! latitude, so the sampled disk becomes an ellipse further north or south, and
//! large radii are not geodesically correct either.

use std::f64::consts::TAU;
use std::ops::Range;

use rand::{Rng, RngExt};
use tracing::instrument;

use crate::models::{Coordinate, HouseListing};
use crate::{HouseSearchError, Result};

/// Approximate length of one degree of latitude at the equator
pub const METERS_PER_DEGREE: f64 = 111_300.0;

/// Asking prices are drawn from this range
pub const PRICE_RANGE: Range<u32> = 200_000..700_000;

/// Generate `count` listings uniformly distributed inside the circle
#[instrument(level = "debug")]
pub fn generate(center: Coordinate, radius_meters: f64, count: usize) -> Result<Vec<HouseListing>> {
    generate_with(&mut rand::rng(), center, radius_meters, count)
}

/// Same as [`generate`] but driven by the given random number generator
pub fn generate_with<R: Rng + ?Sized>(
    rng: &mut R,
    center: Coordinate,
    radius_meters: f64,
    count: usize,
) -> Result<Vec<HouseListing>> {
    if !radius_meters.is_finite() || radius_meters < 0.0 {
        return Err(HouseSearchError::invalid_argument(format!(
            "Radius must be a non-negative number of meters, got: {radius_meters}"
        )));
    }

    let radius_degrees = radius_meters / METERS_PER_DEGREE;

    let listings = (0..count)
        .map(|_| {
            // sqrt keeps the density uniform per unit area
            let r = radius_degrees * rng.random::<f64>().sqrt();
            let theta = rng.random_range(0.0..TAU);

            HouseListing {
                coordinate: Coordinate {
                    latitude: center.latitude + r * theta.cos(),
                    longitude: center.longitude + r * theta.sin(),
                },
                price: rng.random_range(PRICE_RANGE),
            }
        })
        .collect();

    Ok(listings)
}
