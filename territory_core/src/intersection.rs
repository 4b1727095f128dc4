//! SelfIntersectionChecker - detects paths that cross themselves.
//!
//! Works on the open polyline (no implicit closing segment) and treats
//! (longitude, latitude) as planar coordinates, which is adequate at the
//! sub-kilometer scale of a single claim.

use crate::geo_math::{segments_intersect, GeoPoint};

/// Pairwise segment crossing scan with a head/tail exclusion window.
#[derive(Debug, Clone)]
pub struct SelfIntersectionChecker {
    /// Segments at each end whose mutual crossings are ignored
    skip_segments: usize,
}

impl SelfIntersectionChecker {
    pub fn new(skip_segments: usize) -> Self {
        Self { skip_segments }
    }

    /// True when any two non-adjacent segments cross.
    pub fn has_self_intersection(&self, points: &[GeoPoint]) -> bool {
        self.find_self_intersection(points).is_some()
    }

    /// Returns the first crossing pair of segment indices `(i, j)`, `i < j`.
    ///
    /// Segment `k` joins `points[k]` and `points[k + 1]`. Adjacent segments
    /// are never compared. Pairs where `i` is within the first
    /// `skip_segments` and `j` within the last `skip_segments` are skipped so
    /// the approach back to the start is not mistaken for a crossing.
    pub fn find_self_intersection(&self, points: &[GeoPoint]) -> Option<(usize, usize)> {
        if points.len() < 4 {
            return None;
        }

        let segments = points.len() - 1;
        let tail_start = segments.saturating_sub(self.skip_segments);

        for i in 0..segments {
            for j in (i + 2)..segments {
                if i < self.skip_segments && j >= tail_start {
                    continue;
                }
                if segments_intersect(points[i], points[i + 1], points[j], points[j + 1]) {
                    return Some((i, j));
                }
            }
        }
        None
    }
}

impl Default for SelfIntersectionChecker {
    fn default() -> Self {
        Self::new(2)
    }
}
