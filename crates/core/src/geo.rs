//! Great-circle distance and unit conversions.

use crate::types::Coordinate;

/// Mean Earth radius used by the haversine formula.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Meters per second to kilometers per hour.
pub const MPS_TO_KMH: f64 = 3.6;

/// Haversine distance in kilometers between two points given in degrees.
pub fn distance_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();

    let half_lat = (d_lat / 2.0).sin();
    let half_lon = (d_lon / 2.0).sin();
    let a = half_lat * half_lat
        + lat1.to_radians().cos() * lat2.to_radians().cos() * half_lon * half_lon;

    // Rounding can push `a` a hair past 1 for antipodal points.
    let a = a.clamp(0.0, 1.0);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_KM * c
}

/// [`distance_km`] over two [`Coordinate`]s.
pub fn distance_between(a: Coordinate, b: Coordinate) -> f64 {
    distance_km(a.latitude, a.longitude, b.latitude, b.longitude)
}

pub fn ms_to_kmh(mps: f64) -> f64 {
    mps * MPS_TO_KMH
}
