//! Tracking configuration.
//!
//! Every threshold the engine applies lives here so hosts can tune them
//! from a JSON document. Missing fields fall back to the design defaults.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{Result, TerritoryError};

/// Speed gating thresholds (km/h).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeedLimits {
    /// Above this the fix is dropped with a warning (default: 15 km/h)
    pub warn_kmh: f64,

    /// Above this the session is aborted (default: 30 km/h)
    pub abort_kmh: f64,
}

impl Default for SpeedLimits {
    fn default() -> Self {
        Self {
            warn_kmh: 15.0,
            abort_kmh: 30.0,
        }
    }
}

/// Loop closure parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClosureConfig {
    /// Minimum recorded points before closure is considered (default: 10)
    pub min_points: usize,

    /// Maximum distance between last and first point to close (default: 30 m)
    pub threshold_m: f64,

    /// Segments at each end of the path excluded from crossing checks
    /// against each other (default: 2).
    ///
    /// Walking back to the start legitimately brings the tail close to the
    /// head; this masks crossings between them.
    pub skip_segments: usize,
}

impl Default for ClosureConfig {
    fn default() -> Self {
        Self {
            min_points: 10,
            threshold_m: 30.0,
            skip_segments: 2,
        }
    }
}

/// Acceptance thresholds for a closed claim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationThresholds {
    /// Minimum number of points (default: 10)
    pub min_points: usize,

    /// Minimum walked length along the path (default: 50 m)
    pub min_distance_m: f64,

    /// Minimum enclosed area (default: 100 m²)
    pub min_area_m2: f64,
}

impl Default for ValidationThresholds {
    fn default() -> Self {
        Self {
            min_points: 10,
            min_distance_m: 50.0,
            min_area_m2: 100.0,
        }
    }
}

/// Configuration for a [`crate::TerritoryEngine`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    /// Sampling tick period (default: 2 s)
    #[serde(with = "duration_secs")]
    pub tick_interval: Duration,

    /// Minimum spacing between recorded points (default: 10 m)
    pub min_spacing_m: f64,

    /// Speed gating thresholds
    pub speed: SpeedLimits,

    /// Loop closure detection
    pub closure: ClosureConfig,

    /// Claim acceptance thresholds
    pub validation: ValidationThresholds,

    /// Hard cap on recorded points; bounds the O(n²) crossing scan (default: 500)
    pub max_points: usize,

    /// Hard cap on session length measured on fix timestamps (default: 2 h)
    #[serde(with = "duration_secs")]
    pub max_session_duration: Duration,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(2),
            min_spacing_m: 10.0,
            speed: SpeedLimits::default(),
            closure: ClosureConfig::default(),
            validation: ValidationThresholds::default(),
            max_points: 500,
            max_session_duration: Duration::from_secs(2 * 60 * 60),
        }
    }
}

impl TrackingConfig {
    /// Parses a JSON document and validates it.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serializes the configuration as pretty JSON.
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Sets the sampling tick period.
    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }

    /// Sets the closure distance threshold.
    pub fn with_closure_threshold(mut self, meters: f64) -> Self {
        self.closure.threshold_m = meters;
        self
    }

    /// Sets the number of head/tail segments excluded from crossing checks.
    pub fn with_skip_segments(mut self, segments: usize) -> Self {
        self.closure.skip_segments = segments;
        self
    }

    /// Sets the recorded point cap.
    pub fn with_max_points(mut self, max_points: usize) -> Self {
        self.max_points = max_points;
        self
    }

    /// Sets the maximum session duration.
    pub fn with_max_session_duration(mut self, duration: Duration) -> Self {
        self.max_session_duration = duration;
        self
    }

    /// Checks that the thresholds are usable together.
    pub fn validate(&self) -> Result<()> {
        if self.tick_interval.is_zero() {
            return Err(TerritoryError::invalid_config("tick_interval must be > 0"));
        }
        if !(self.min_spacing_m.is_finite() && self.min_spacing_m >= 0.0) {
            return Err(TerritoryError::invalid_config(
                "min_spacing_m must be a non-negative number",
            ));
        }
        let (warn_kmh, abort_kmh) = (self.speed.warn_kmh, self.speed.abort_kmh);
        let ordered = 0.0 < warn_kmh && warn_kmh <= abort_kmh;
        if !(warn_kmh.is_finite() && abort_kmh.is_finite() && ordered) {
            return Err(TerritoryError::invalid_config(format!(
                "speed limits must satisfy 0 < warn ({warn_kmh}) <= abort ({abort_kmh})"
            )));
        }
        if !(self.closure.threshold_m.is_finite() && self.closure.threshold_m > 0.0) {
            return Err(TerritoryError::invalid_config(
                "closure.threshold_m must be > 0",
            ));
        }
        if self.closure.min_points < 3 {
            return Err(TerritoryError::invalid_config(
                "closure.min_points must be at least 3",
            ));
        }
        if 2 * self.closure.skip_segments >= self.closure.min_points {
            return Err(TerritoryError::invalid_config(format!(
                "closure.skip_segments ({}) must stay below half of closure.min_points ({})",
                self.closure.skip_segments, self.closure.min_points
            )));
        }
        let v = &self.validation;
        if !(v.min_distance_m.is_finite() && v.min_distance_m >= 0.0) {
            return Err(TerritoryError::invalid_config(
                "validation.min_distance_m must be a non-negative number",
            ));
        }
        if !(v.min_area_m2.is_finite() && v.min_area_m2 >= 0.0) {
            return Err(TerritoryError::invalid_config(
                "validation.min_area_m2 must be a non-negative number",
            ));
        }
        if self.max_points < self.closure.min_points {
            return Err(TerritoryError::invalid_config(format!(
                "max_points ({}) is below closure.min_points ({})",
                self.max_points, self.closure.min_points
            )));
        }
        if self.max_session_duration.is_zero() {
            return Err(TerritoryError::invalid_config(
                "max_session_duration must be > 0",
            ));
        }
        Ok(())
    }
}

/// Durations are written as fractional seconds in config documents.
mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_f64(d.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(d)?;
        Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
    }
}
