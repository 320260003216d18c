//! # Geographic Utilities
//!
//! Distance and framing helpers for recorded activity routes.
//!
//! ## Overview
//!
//! | Function | Description |
//! |----------|-------------|
//! | [`haversine_distance`] | Great-circle distance between two GPS points |
//! | [`polyline_length`] | Total length of a route in meters |
//! | [`compute_bounds`] | Bounding box of a route |
//! | [`compute_center`] | Center of a route's bounding box |
//! | [`mps_to_kmh`] | Sensor speed (m/s) to display speed (km/h) |
//! | [`average_speed_kmh`] | Average speed from distance and net duration |
//!
//! ## Example
//!
//! ```rust
//! use activity_engine::{GpsPoint, geo_utils};
//!
//! let track = vec![
//!     GpsPoint::new(0.0, 0.0),
//!     GpsPoint::new(0.0, 0.001),
//!     GpsPoint::new(0.0, 0.002),
//! ];
//!
//! let length = geo_utils::polyline_length(&track);
//! assert!((length - 222.39).abs() < 0.5);
//! ```
//!
//! ## Algorithm Notes
//!
//! ### Haversine Formula
//!
//! Distances are computed with the haversine formula on a sphere of radius
//! [`EARTH_RADIUS_METERS`] (the WGS84 mean radius rounded to 6,371 km). The
//! formula is spelled out here rather than delegated to `geo::Haversine`, whose
//! radius is 6,371,008.8 m, so that recorded session distances are reproducible
//! to the bit across platforms.
//!
//! Reference: [Haversine formula (Wikipedia)](https://en.wikipedia.org/wiki/Haversine_formula)

use geo::{BoundingRect, Coord, LineString};
use crate::{GpsPoint, Bounds};

/// Sphere radius used for every distance in this crate, in meters.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Conversion factor from meters per second to kilometers per hour.
pub const MPS_TO_KMH: f64 = 3.6;

const MS_PER_HOUR: f64 = 3_600_000.0;

// =============================================================================
// Distance Functions
// =============================================================================

/// Calculate the great-circle distance between two GPS points using the Haversine formula.
///
/// Returns the distance in meters along a spherical Earth of radius
/// [`EARTH_RADIUS_METERS`]. Coincident points return exactly `0.0`.
///
/// # Example
///
/// ```rust
/// use activity_engine::{GpsPoint, geo_utils};
///
/// let a = GpsPoint::new(0.0, 0.0);
/// let b = GpsPoint::new(0.0, 1.0);
///
/// let distance = geo_utils::haversine_distance(&a, &b);
/// assert!((distance - 111_195.0).abs() < 50.0);
/// ```
#[inline]
pub fn haversine_distance(p1: &GpsPoint, p2: &GpsPoint) -> f64 {
    let phi1 = p1.latitude.to_radians();
    let phi2 = p2.latitude.to_radians();
    let delta_phi = (p2.latitude - p1.latitude).to_radians();
    let delta_lambda = (p2.longitude - p1.longitude).to_radians();

    let sin_dphi = (delta_phi / 2.0).sin();
    let sin_dlambda = (delta_lambda / 2.0).sin();
    let a = sin_dphi * sin_dphi + phi1.cos() * phi2.cos() * sin_dlambda * sin_dlambda;

    // Rounding can push `a` a hair above 1 for antipodal points; sqrt(1 - a) would be NaN.
    let a = a.clamp(0.0, 1.0);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_METERS * c
}

/// Calculate the total length of a polyline (GPS track) in meters.
///
/// Sums the haversine distance between consecutive points. Empty or single-point
/// tracks return 0.0.
pub fn polyline_length(points: &[GpsPoint]) -> f64 {
    if points.len() < 2 {
        return 0.0;
    }

    points
        .windows(2)
        .map(|w| haversine_distance(&w[0], &w[1]))
        .sum()
}

// =============================================================================
// Speed Functions
// =============================================================================

/// Convert a sensor speed in m/s to km/h, clamped to zero.
///
/// Location providers report `-1` or `None` when speed is unknown; both map to 0.
#[inline]
pub fn mps_to_kmh(speed_mps: Option<f64>) -> f64 {
    match speed_mps {
        Some(v) if v.is_finite() && v > 0.0 => v * MPS_TO_KMH,
        _ => 0.0,
    }
}

/// Average speed in km/h for `distance_meters` covered in `duration_ms`.
///
/// Returns 0 when the duration is zero or negative.
#[inline]
pub fn average_speed_kmh(distance_meters: f64, duration_ms: i64) -> f64 {
    if duration_ms <= 0 {
        return 0.0;
    }
    (distance_meters / 1000.0) / (duration_ms as f64 / MS_PER_HOUR)
}

// =============================================================================
// Bounding Box Functions
// =============================================================================

fn to_line_string(points: &[GpsPoint]) -> LineString<f64> {
    points
        .iter()
        .map(|p| Coord { x: p.longitude, y: p.latitude })
        .collect::<Vec<_>>()
        .into()
}

/// Compute the bounding box of a GPS track.
///
/// Returns `None` for an empty track.
///
/// # Example
///
/// ```rust
/// use activity_engine::{GpsPoint, geo_utils};
///
/// let track = vec![
///     GpsPoint::new(51.5000, -0.1300),
///     GpsPoint::new(51.5100, -0.1200),
///     GpsPoint::new(51.5050, -0.1250),
/// ];
///
/// let bounds = geo_utils::compute_bounds(&track).unwrap();
/// assert_eq!(bounds.min_lat, 51.5000);
/// assert_eq!(bounds.max_lng, -0.1200);
/// ```
pub fn compute_bounds(points: &[GpsPoint]) -> Option<Bounds> {
    let rect = to_line_string(points).bounding_rect()?;
    Some(Bounds {
        min_lat: rect.min().y,
        max_lat: rect.max().y,
        min_lng: rect.min().x,
        max_lng: rect.max().x,
    })
}

/// Center of the track's bounding box, used to frame the map on a route.
///
/// Returns `None` for an empty track.
pub fn compute_center(points: &[GpsPoint]) -> Option<GpsPoint> {
    let center = to_line_string(points).bounding_rect()?.center();
    Some(GpsPoint::new(center.y, center.x))
}

// =============================================================================
// Unit Tests
// =============================================================================
