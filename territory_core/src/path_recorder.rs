//! PathRecorder - accumulates the claim boundary.

use serde::{Deserialize, Serialize};

use crate::fix::TimedFix;
use crate::geo_math::{distance, GeoPoint};

/// The accumulating claim boundary.
///
/// Points are only appended by [`PathRecorder`] and `closed` is only set by
/// the closure detector. Once closed, the points never change until the
/// path is cleared.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackedPath {
    points: Vec<GeoPoint>,
    closed: bool,
}

impl TrackedPath {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn points(&self) -> &[GeoPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn first(&self) -> Option<GeoPoint> {
        self.points.first().copied()
    }

    pub fn last(&self) -> Option<GeoPoint> {
        self.points.last().copied()
    }

    /// Drops all points and reopens the path.
    pub fn clear(&mut self) {
        self.points.clear();
        self.closed = false;
    }

    pub(crate) fn push(&mut self, point: GeoPoint) {
        debug_assert!(!self.closed, "closed path must not grow");
        self.points.push(point);
    }

    pub(crate) fn mark_closed(&mut self) {
        self.closed = true;
    }
}

impl From<Vec<GeoPoint>> for TrackedPath {
    fn from(points: Vec<GeoPoint>) -> Self {
        Self {
            points,
            closed: false,
        }
    }
}

/// Decides whether a fix extends the path.
#[derive(Debug, Clone)]
pub struct PathRecorder {
    /// Strict lower bound on the gap to the last recorded point (meters)
    min_spacing_m: f64,
}

impl PathRecorder {
    pub fn new(min_spacing_m: f64) -> Self {
        Self { min_spacing_m }
    }

    /// Appends `fix` when it is the first point or lies more than the
    /// minimum spacing from the last recorded point.
    ///
    /// Only call with fixes the speed guard judged `Normal`. A closed path
    /// is never extended.
    pub fn try_record(&self, path: &mut TrackedPath, fix: &TimedFix) -> bool {
        if path.is_closed() {
            return false;
        }

        let Some(last) = path.last() else {
            path.push(fix.point);
            return true;
        };

        if distance(last, fix.point) > self.min_spacing_m {
            path.push(fix.point);
            true
        } else {
            false
        }
    }
}

impl Default for PathRecorder {
    fn default() -> Self {
        Self::new(10.0)
    }
}
