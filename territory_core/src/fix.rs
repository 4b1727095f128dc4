//! Validated location observations.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use territory_env::RawFix;

use crate::error::{Result, TerritoryError};
use crate::geo_math::GeoPoint;

/// A location observation the engine is willing to use.
///
/// Timestamps are monotonic offsets from the host's session time base;
/// the engine only ever compares them with each other.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimedFix {
    pub point: GeoPoint,
    pub timestamp: Duration,
}

impl TimedFix {
    pub fn new(point: GeoPoint, timestamp: Duration) -> Self {
        Self { point, timestamp }
    }

    /// Seconds elapsed since `earlier`, or `None` when this fix is not
    /// strictly newer.
    pub fn seconds_since(&self, earlier: &TimedFix) -> Option<f64> {
        self.timestamp
            .checked_sub(earlier.timestamp)
            .filter(|dt| !dt.is_zero())
            .map(|dt| dt.as_secs_f64())
    }
}

impl TryFrom<RawFix> for TimedFix {
    type Error = TerritoryError;

    fn try_from(raw: RawFix) -> Result<Self> {
        if let Some(accuracy) = raw.accuracy_m {
            if !accuracy.is_finite() || accuracy < 0.0 {
                return Err(TerritoryError::invalid_input(format!(
                    "accuracy {accuracy} is not a usable radius"
                )));
            }
        }
        let point = GeoPoint::try_new(raw.latitude, raw.longitude)?;
        Ok(Self::new(point, raw.timestamp))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_fix_conversion() {
        let raw = RawFix::new(48.1, 11.5, Duration::from_secs(4));
        let fix = TimedFix::try_from(raw).unwrap();
        assert_eq!(fix.point, GeoPoint::new(48.1, 11.5));
        assert_eq!(fix.timestamp, Duration::from_secs(4));
    }

    #[test]
    fn test_nan_fix_rejected() {
        let raw = RawFix::new(f64::NAN, 11.5, Duration::from_secs(4));
        assert!(matches!(
            TimedFix::try_from(raw),
            Err(TerritoryError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_negative_accuracy_rejected() {
        let raw = RawFix::new(1.0, 1.0, Duration::ZERO).with_accuracy(-3.0);
        assert!(TimedFix::try_from(raw).is_err());
    }

    #[test]
    fn test_seconds_since() {
        let a = TimedFix::new(GeoPoint::new(0.0, 0.0), Duration::from_secs(10));
        let b = TimedFix::new(GeoPoint::new(0.0, 0.0), Duration::from_millis(12_500));
        assert_eq!(b.seconds_since(&a), Some(2.5));
        assert_eq!(a.seconds_since(&b), None);
        assert_eq!(a.seconds_since(&a), None);
    }
}
