//! Signal-weighted position estimation.
//!
//! A scan's resolved access points are combined into a single coordinate by
//! weighting each location with the linear-power equivalent of its RSSI.
//! This is a plain weighted centroid: no outlier rejection, no path-loss
//! distance model, no per-entry confidence. That simplification is
//! deliberate, not an oversight.

use crate::geo::Coordinate;
use std::fmt;

/// A resolved observation: where a beacon is and how strongly it was heard.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightedObservation {
    pub position: Coordinate,
    pub rssi_dbm: f64,
}

/// Estimation errors
#[derive(Debug, PartialEq)]
pub enum EstimateError {
    /// No observations to estimate from
    NoObservations,
    /// Weights summed to zero or a non-finite value
    DegenerateWeights,
}

impl fmt::Display for EstimateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EstimateError::NoObservations => write!(f, "No observations to estimate from"),
            EstimateError::DegenerateWeights => write!(f, "Observation weights are degenerate"),
        }
    }
}

/// Signal-weighted centroid of the observations.
///
/// Each observation contributes with weight 10^(rssi/10), so a beacon heard
/// at -60 dBm pulls the estimate 100x harder than one at -80 dBm. The
/// result does not depend on observation order beyond floating-point
/// rounding.
///
/// Weights cannot reach zero for any realistic RSSI, but extreme inputs can
/// underflow; the sum is checked before dividing so the caller sees a typed
/// error instead of a NaN coordinate.
pub fn weighted_centroid(
    observations: &[WeightedObservation],
) -> Result<Coordinate, EstimateError> {
    if observations.is_empty() {
        return Err(EstimateError::NoObservations);
    }

    let mut weight_sum = 0.0;
    let mut lat_sum = 0.0;
    let mut lon_sum = 0.0;
    for obs in observations {
        let weight = 10f64.powf(obs.rssi_dbm / 10.0);
        weight_sum += weight;
        lat_sum += weight * obs.position.lat;
        lon_sum += weight * obs.position.lon;
    }

    if weight_sum <= 0.0 || !weight_sum.is_finite() {
        return Err(EstimateError::DegenerateWeights);
    }

    Ok(Coordinate {
        lat: lat_sum / weight_sum,
        lon: lon_sum / weight_sum,
    })
}
