//! SpeedGuard - anti-cheat movement filter.
//!
//! Classifies the movement between the last accepted fix and a new one:
//! walking pace passes, short spikes are dropped with a warning, and
//! vehicle-like speeds abort the session.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::SpeedLimits;
use crate::fix::TimedFix;
use crate::geo_math::distance;

/// Outcome of a speed evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "speed_kmh", rename_all = "snake_case")]
pub enum SpeedVerdict {
    /// Plausible walking pace; the fix may be recorded
    Normal,
    /// Suspicious spike; the fix is dropped but the session continues
    Warn(f64),
    /// Implausible speed; the caller must stop the session
    Abort(f64),
}

impl SpeedVerdict {
    /// Measured speed, when one was computed above the warning limit.
    pub fn speed_kmh(&self) -> Option<f64> {
        match self {
            SpeedVerdict::Normal => None,
            SpeedVerdict::Warn(kmh) | SpeedVerdict::Abort(kmh) => Some(*kmh),
        }
    }
}

/// Last accepted fix used for speed deltas.
///
/// Distinct from the last recorded path point: speed is evaluated on every
/// tick even when the fix is too close to be recorded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpeedState {
    pub last_fix: Option<TimedFix>,
}

/// Speed gate with configurable thresholds.
#[derive(Debug, Clone)]
pub struct SpeedGuard {
    limits: SpeedLimits,
    state: SpeedState,
}

impl SpeedGuard {
    pub fn new(limits: SpeedLimits) -> Self {
        Self {
            limits,
            state: SpeedState::default(),
        }
    }

    /// Classifies `fix` against the last accepted fix.
    ///
    /// The state advances to `fix` unless the verdict is `Abort`.
    pub fn evaluate(&mut self, fix: TimedFix) -> SpeedVerdict {
        let Some(last) = self.state.last_fix else {
            self.state.last_fix = Some(fix);
            return SpeedVerdict::Normal;
        };

        // Duplicate or out-of-order timestamps carry no speed information
        let Some(secs) = fix.seconds_since(&last) else {
            self.state.last_fix = Some(fix);
            return SpeedVerdict::Normal;
        };

        let speed_kmh = distance(last.point, fix.point) / secs * 3.6;

        if speed_kmh > self.limits.abort_kmh {
            warn!(speed_kmh, limit = self.limits.abort_kmh, "speed above abort limit");
            return SpeedVerdict::Abort(speed_kmh);
        }

        self.state.last_fix = Some(fix);

        if speed_kmh > self.limits.warn_kmh {
            debug!(speed_kmh, limit = self.limits.warn_kmh, "speed spike, dropping fix");
            SpeedVerdict::Warn(speed_kmh)
        } else {
            SpeedVerdict::Normal
        }
    }

    pub fn state(&self) -> &SpeedState {
        &self.state
    }

    /// Forgets the last accepted fix.
    pub fn reset(&mut self) {
        self.state = SpeedState::default();
    }
}

impl Default for SpeedGuard {
    fn default() -> Self {
        Self::new(SpeedLimits::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo_math::GeoPoint;
    use std::time::Duration;

    /// Longitude offset (degrees) that is ~100 m east of the origin at the equator.
    fn hundred_meters_east() -> GeoPoint {
        let origin = GeoPoint::new(0.0, 0.0);
        let per_degree = distance(origin, GeoPoint::new(0.0, 1.0));
        GeoPoint::new(0.0, 100.0 / per_degree)
    }

    fn fix(point: GeoPoint, secs: u64) -> TimedFix {
        TimedFix::new(point, Duration::from_secs(secs))
    }

    fn guard_after_origin() -> SpeedGuard {
        let mut guard = SpeedGuard::default();
        assert_eq!(guard.evaluate(fix(GeoPoint::new(0.0, 0.0), 0)), SpeedVerdict::Normal);
        guard
    }

    #[test]
    fn test_first_fix_is_normal() {
        let mut guard = SpeedGuard::default();
        assert_eq!(guard.evaluate(fix(GeoPoint::new(5.0, 5.0), 100)), SpeedVerdict::Normal);
        assert!(guard.state().last_fix.is_some());
    }

    #[test]
    fn test_72_kmh_aborts() {
        let mut guard = guard_after_origin();
        match guard.evaluate(fix(hundred_meters_east(), 5)) {
            SpeedVerdict::Abort(kmh) => assert!((kmh - 72.0).abs() < 0.1, "got {kmh}"),
            other => panic!("expected abort, got {other:?}"),
        }
        // Abort leaves the state on the previous fix
        assert_eq!(guard.state().last_fix.unwrap().timestamp, Duration::ZERO);
    }

    #[test]
    fn test_24_kmh_warns() {
        let mut guard = guard_after_origin();
        match guard.evaluate(fix(hundred_meters_east(), 15)) {
            SpeedVerdict::Warn(kmh) => assert!((kmh - 24.0).abs() < 0.1, "got {kmh}"),
            other => panic!("expected warn, got {other:?}"),
        }
        assert_eq!(
            guard.state().last_fix.unwrap().timestamp,
            Duration::from_secs(15)
        );
    }

    #[test]
    fn test_12_kmh_is_normal() {
        let mut guard = guard_after_origin();
        assert_eq!(guard.evaluate(fix(hundred_meters_east(), 30)), SpeedVerdict::Normal);
    }

    #[test]
    fn test_duplicate_timestamp_is_normal() {
        let mut guard = guard_after_origin();
        assert_eq!(guard.evaluate(fix(hundred_meters_east(), 0)), SpeedVerdict::Normal);
    }

    #[test]
    fn test_reset_forgets_last_fix() {
        let mut guard = guard_after_origin();
        guard.reset();
        assert!(guard.state().last_fix.is_none());
        // A far jump right after reset is a fresh first fix
        assert_eq!(guard.evaluate(fix(hundred_meters_east(), 1)), SpeedVerdict::Normal);
    }

    #[test]
    fn test_verdict_speed() {
        assert_eq!(SpeedVerdict::Normal.speed_kmh(), None);
        assert_eq!(SpeedVerdict::Warn(20.0).speed_kmh(), Some(20.0));
    }
}
