//! Great-circle distance and bounding-box math.
//!
//! Pure functions over degree-valued coordinates. The bounding box is a
//! rectangular superset of the circular search area, so callers that need a
//! true radius must re-filter with `distance_meters`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Mean Earth radius in meters (haversine).
const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Meters per degree of latitude.
const METERS_PER_DEGREE_LAT: f64 = 111_194.0;

/// |cos(latitude)| below this is treated as polar degeneracy.
const POLE_COS_EPSILON: f64 = 1e-6;

/// Geographic coordinate in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// Axis-aligned lat/lon rectangle around a center point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub lat_min: f64,
    pub lat_max: f64,
    pub lon_min: f64,
    pub lon_max: f64,
}

/// Coordinate math errors
#[derive(Debug, PartialEq)]
pub enum GeoError {
    /// Longitude extent is undefined because cos(latitude) vanishes near the poles
    UndefinedBoundingBox { lat: f64 },
}

impl fmt::Display for GeoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeoError::UndefinedBoundingBox { lat } => {
                write!(f, "Bounding box undefined at latitude {}", lat)
            }
        }
    }
}

/// Great-circle distance between two coordinates in meters.
///
/// Haversine over a spherical Earth. Callers use this for radius-inclusion
/// filters down to meter scale, so no planar shortcut is taken.
pub fn distance_meters(a: Coordinate, b: Coordinate) -> f64 {
    let phi1 = a.lat.to_radians();
    let phi2 = b.lat.to_radians();
    let delta_phi = (b.lat - a.lat).to_radians();
    let delta_lambda = (b.lon - a.lon).to_radians();

    let h = (delta_phi / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (delta_lambda / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_M * c
}

/// Bounding box extending `radius_meters` from `center` along each axis.
///
/// The longitude extent scales with 1/cos(latitude) and becomes undefined
/// near the poles; rather than return an infinite box, this fails with
/// `UndefinedBoundingBox` when |cos(latitude)| drops below a small epsilon.
pub fn bounding_box(center: Coordinate, radius_meters: f64) -> Result<BoundingBox, GeoError> {
    let cos_lat = center.lat.to_radians().cos();
    if cos_lat.abs() < POLE_COS_EPSILON {
        return Err(GeoError::UndefinedBoundingBox { lat: center.lat });
    }

    let lat_delta = radius_meters / METERS_PER_DEGREE_LAT;
    let lon_delta = radius_meters / (METERS_PER_DEGREE_LAT * cos_lat);

    Ok(BoundingBox {
        lat_min: center.lat - lat_delta,
        lat_max: center.lat + lat_delta,
        lon_min: center.lon - lon_delta,
        lon_max: center.lon + lon_delta,
    })
}
