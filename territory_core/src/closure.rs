//! ClosureDetector - one-way loop closure flag.

use tracing::info;

use crate::config::ClosureConfig;
use crate::geo_math::distance;
use crate::path_recorder::TrackedPath;

/// Watches the distance from the latest point back to the start.
#[derive(Debug, Clone)]
pub struct ClosureDetector {
    min_points: usize,
    threshold_m: f64,
}

impl ClosureDetector {
    pub fn new(config: &ClosureConfig) -> Self {
        Self {
            min_points: config.min_points,
            threshold_m: config.threshold_m,
        }
    }

    /// Returns true exactly once: on the call that closes the path.
    ///
    /// Already-closed paths are left untouched and report `false`.
    pub fn check(&self, path: &mut TrackedPath) -> bool {
        if path.is_closed() || path.len() < self.min_points {
            return false;
        }

        let (Some(first), Some(last)) = (path.first(), path.last()) else {
            return false;
        };

        let gap = distance(last, first);
        if gap <= self.threshold_m {
            path.mark_closed();
            info!(points = path.len(), gap_m = gap, "loop closed");
            true
        } else {
            false
        }
    }
}

impl Default for ClosureDetector {
    fn default() -> Self {
        Self::new(&ClosureConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo_math::GeoPoint;

    const PER_METER: f64 = 1.0 / 111_195.0;

    /// Ten points walking east and back along a parallel, ending at `end`.
    fn loop_ending_at(end: GeoPoint) -> TrackedPath {
        let mut points: Vec<GeoPoint> = (0..5)
            .map(|i| GeoPoint::new(0.0, i as f64 * 20.0 * PER_METER))
            .collect();
        points.extend(
            (0..4)
                .rev()
                .map(|i| GeoPoint::new(40.0 * PER_METER, i as f64 * 20.0 * PER_METER)),
        );
        points.push(end);
        TrackedPath::from(points)
    }

    #[test]
    fn test_closure_at_exact_threshold_boundary() {
        let end = GeoPoint::new(30.0 * PER_METER, 0.0);
        let gap = distance(end, GeoPoint::new(0.0, 0.0));

        // Threshold set to the exact measured gap: inclusive comparison closes
        let at_boundary = ClosureDetector::new(&ClosureConfig {
            threshold_m: gap,
            ..ClosureConfig::default()
        });
        let mut path = loop_ending_at(end);
        assert!(at_boundary.check(&mut path));
        assert!(path.is_closed());

        // 0.1 m short of the gap: stays open
        let below = ClosureDetector::new(&ClosureConfig {
            threshold_m: gap - 0.1,
            ..ClosureConfig::default()
        });
        let mut path = loop_ending_at(end);
        assert!(!below.check(&mut path));
        assert!(!path.is_closed());
    }

    #[test]
    fn test_default_threshold_30_vs_30_1_meters() {
        let detector = ClosureDetector::default();

        let mut inside = loop_ending_at(GeoPoint::new(29.9 * PER_METER, 0.0));
        assert!(detector.check(&mut inside));

        let mut outside = loop_ending_at(GeoPoint::new(30.1 * PER_METER, 0.0));
        assert!(!detector.check(&mut outside));
    }

    #[test]
    fn test_requires_minimum_points() {
        let detector = ClosureDetector::default();
        let mut path = TrackedPath::from(vec![
            GeoPoint::new(0.0, 0.0),
            GeoPoint::new(0.0, 20.0 * PER_METER),
            GeoPoint::new(0.0, 5.0 * PER_METER),
        ]);
        assert!(!detector.check(&mut path));
    }

    #[test]
    fn test_closure_is_idempotent() {
        let detector = ClosureDetector::default();
        let mut path = loop_ending_at(GeoPoint::new(10.0 * PER_METER, 0.0));

        assert!(detector.check(&mut path));
        let snapshot = path.clone();

        for _ in 0..5 {
            assert!(!detector.check(&mut path));
        }
        assert_eq!(path, snapshot);
    }
}
