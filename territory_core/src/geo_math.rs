//! GeoMath - stateless geodesy helpers for territory claims.
//!
//! - Great-circle distance (haversine) for spacing, speed and closure checks
//! - Spherical-corrected shoelace area for the claimed ring
//! - Strict planar segment intersection over raw (longitude, latitude)
//!
//! Non-finite coordinates never panic: distances and areas computed from
//! them collapse to `0.0`.

use geo::kernels::{Kernel, Orientation};
use geo::{Coord, GeoNum, HaversineDistance, Point};
use serde::{Deserialize, Serialize};

use crate::error::{Result, TerritoryError};

/// Earth radius used by the area approximation (meters).
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

// =============================================================================
// GEO POINT
// =============================================================================

/// A WGS-84 position in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    /// Creates a point without validation.
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Creates a point, rejecting non-finite or out-of-range coordinates.
    pub fn try_new(latitude: f64, longitude: f64) -> Result<Self> {
        if !latitude.is_finite() || !longitude.is_finite() {
            return Err(TerritoryError::invalid_input(format!(
                "non-finite coordinate ({latitude}, {longitude})"
            )));
        }
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(TerritoryError::invalid_input(format!(
                "latitude {latitude} out of range"
            )));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(TerritoryError::invalid_input(format!(
                "longitude {longitude} out of range"
            )));
        }
        Ok(Self::new(latitude, longitude))
    }

    /// True when both coordinates are finite numbers.
    pub fn is_finite(&self) -> bool {
        self.latitude.is_finite() && self.longitude.is_finite()
    }

    /// Planar coordinate with x = longitude, y = latitude.
    pub fn to_coord(self) -> Coord<f64> {
        Coord {
            x: self.longitude,
            y: self.latitude,
        }
    }
}

impl From<GeoPoint> for Point<f64> {
    fn from(p: GeoPoint) -> Self {
        Point::new(p.longitude, p.latitude)
    }
}

impl std::fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.6}, {:.6})", self.latitude, self.longitude)
    }
}

// =============================================================================
// DISTANCE
// =============================================================================

/// Great-circle distance between two points in meters.
///
/// Symmetric, and exactly `0.0` for identical points.
pub fn distance(a: GeoPoint, b: GeoPoint) -> f64 {
    if !a.is_finite() || !b.is_finite() {
        return 0.0;
    }
    if a == b {
        return 0.0;
    }
    let d = Point::from(a).haversine_distance(&Point::from(b));
    if d.is_finite() {
        d
    } else {
        0.0
    }
}

/// Total walked length along consecutive points (meters).
pub fn path_length(points: &[GeoPoint]) -> f64 {
    points.windows(2).map(|w| distance(w[0], w[1])).sum()
}

// =============================================================================
// AREA
// =============================================================================

/// Area of the ring described by `points` in square meters.
///
/// The ring is implicitly closed (last point wraps to the first). Each edge
/// contributes `(lon2 - lon1) * (2 + sin(lat1) + sin(lat2))` in radians and
/// the magnitude of the sum is scaled by `R² / 2`.
///
/// Known limitation: this is an approximation that holds for claims up to a
/// few km². Larger rings drift from the true spherical area.
pub fn polygon_area(points: &[GeoPoint]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }

    let n = points.len();
    let mut sum = 0.0;
    for i in 0..n {
        let p1 = points[i];
        let p2 = points[(i + 1) % n];

        let lon1 = p1.longitude.to_radians();
        let lon2 = p2.longitude.to_radians();
        let lat1 = p1.latitude.to_radians();
        let lat2 = p2.latitude.to_radians();

        sum += (lon2 - lon1) * (2.0 + lat1.sin() + lat2.sin());
    }

    let area = sum.abs() * EARTH_RADIUS_M * EARTH_RADIUS_M / 2.0;
    if area.is_finite() {
        area
    } else {
        0.0
    }
}

// =============================================================================
// SEGMENT INTERSECTION
// =============================================================================

/// Strict crossing test between segments `p1-p2` and `p3-p4`.
///
/// Coordinates are treated as planar (x = longitude, y = latitude). Each
/// segment's endpoints must lie strictly on opposite sides of the other
/// segment's line; collinear and touching configurations (including shared
/// endpoints) are not crossings.
pub fn segments_intersect(p1: GeoPoint, p2: GeoPoint, p3: GeoPoint, p4: GeoPoint) -> bool {
    if !(p1.is_finite() && p2.is_finite() && p3.is_finite() && p4.is_finite()) {
        return false;
    }

    let (a, b, c, d) = (p1.to_coord(), p2.to_coord(), p3.to_coord(), p4.to_coord());

    let d1 = orient(c, d, a);
    let d2 = orient(c, d, b);
    let d3 = orient(a, b, c);
    let d4 = orient(a, b, d);

    opposite(d1, d2) && opposite(d3, d4)
}

fn orient(p: Coord<f64>, q: Coord<f64>, r: Coord<f64>) -> Orientation {
    <f64 as GeoNum>::Ker::orient2d(p, q, r)
}

fn opposite(a: Orientation, b: Orientation) -> bool {
    matches!(
        (a, b),
        (Orientation::Clockwise, Orientation::CounterClockwise)
            | (Orientation::CounterClockwise, Orientation::Clockwise)
    )
}

// =============================================================================
// TESTS
// =============================================================================
