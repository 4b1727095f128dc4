//! Ground truth walker for simulation.
//!
//! The Walker owns the "true" route of a simulated player:
//! - Piecewise-linear legs in a local east/north frame (meters)
//! - Constant speed per leg, optional pauses
//! - GPS fix generation (with Gaussian noise)

use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use territory_core::geo_math::{GeoPoint, EARTH_RADIUS_M};
use territory_env::RawFix;

/// Meters spanned by one degree of latitude.
const METERS_PER_DEGREE: f64 = EARTH_RADIUS_M * std::f64::consts::PI / 180.0;

/// One piece of a route.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "leg", rename_all = "snake_case")]
pub enum Leg {
    /// Straight walk to `(east_m, north_m)` at a constant speed
    Walk {
        east_m: f64,
        north_m: f64,
        speed_kmh: f64,
    },
    /// Standing still
    Pause { secs: f64 },
}

/// A planned route in meters relative to the walker's origin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    start: (f64, f64),
    legs: Vec<Leg>,
}

impl Route {
    /// Starts a route at `(east_m, north_m)`.
    pub fn new(east_m: f64, north_m: f64) -> Self {
        Self {
            start: (east_m, north_m),
            legs: Vec::new(),
        }
    }

    pub fn walk_to(mut self, east_m: f64, north_m: f64, speed_kmh: f64) -> Self {
        self.legs.push(Leg::Walk {
            east_m,
            north_m,
            speed_kmh,
        });
        self
    }

    pub fn pause(mut self, secs: f64) -> Self {
        self.legs.push(Leg::Pause { secs });
        self
    }


    /// Total time to walk the route.
    pub fn duration_secs(&self) -> f64 {
        self.spans().map(|span| span.secs).sum()
    }

    /// Total distance walked (meters).
    pub fn length_m(&self) -> f64 {
        self.spans()
            .map(|span| (span.to.0 - span.from.0).hypot(span.to.1 - span.from.1))
            .sum()
    }

    /// Position at `t` seconds into the route, clamped to its ends.
    pub fn position_at(&self, t: f64) -> (f64, f64) {
        let mut elapsed = 0.0;
        let mut position = self.start;
        for span in self.spans() {
            if t < elapsed + span.secs {
                let f = (t - elapsed) / span.secs;
                return (
                    span.from.0 + (span.to.0 - span.from.0) * f,
                    span.from.1 + (span.to.1 - span.from.1) * f,
                );
            }
            elapsed += span.secs;
            position = span.to;
        }
        position
    }

    fn spans(&self) -> impl Iterator<Item = Span> + '_ {
        let mut from = self.start;
        self.legs.iter().map(move |leg| {
            let span = match *leg {
                Leg::Walk {
                    east_m,
                    north_m,
                    speed_kmh,
                } => {
                    let to = (east_m, north_m);
                    let length = (to.0 - from.0).hypot(to.1 - from.1);
                    let speed_mps = speed_kmh / 3.6;
                    let secs = if speed_mps > 0.0 { length / speed_mps } else { 0.0 };
                    Span { from, to, secs }
                }
                Leg::Pause { secs } => Span {
                    from,
                    to: from,
                    secs: secs.max(0.0),
                },
            };
            from = span.to;
            span
        })
    }
}

#[derive(Debug, Clone, Copy)]
struct Span {
    from: (f64, f64),
    to: (f64, f64),
    secs: f64,
}

/// True position of the walker at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TruthSample {
    pub timestamp: Duration,
    pub point: GeoPoint,
    pub east_m: f64,
    pub north_m: f64,
}

/// The Walker - turns a route into ground truth and noisy fixes.
pub struct Walker {
    /// RNG for GPS noise
    rng: ChaCha8Rng,

    /// Geographic anchor of the local frame
    origin: GeoPoint,

    /// Horizontal noise standard deviation (meters)
    noise_std_m: f64,

    /// Per-axis noise distribution (None when noise is disabled)
    noise: Option<Normal<f64>>,
}

impl Walker {
    /// Creates a noise-free walker anchored at `origin`.
    pub fn new(rng: ChaCha8Rng, origin: GeoPoint) -> Self {
        Self {
            rng,
            origin,
            noise_std_m: 0.0,
            noise: None,
        }
    }

    /// Sets the horizontal noise standard deviation.
    ///
    /// Non-positive or non-finite values disable noise.
    pub fn with_noise(mut self, std_m: f64) -> Self {
        self.noise = if std_m > 0.0 {
            Normal::new(0.0, std_m).ok()
        } else {
            None
        };
        self.noise_std_m = if self.noise.is_some() { std_m } else { 0.0 };
        self
    }

    pub fn origin(&self) -> GeoPoint {
        self.origin
    }

    pub fn noise_std_m(&self) -> f64 {
        self.noise_std_m
    }

    /// Converts local east/north meters to a geographic point.
    pub fn to_geo(&self, east_m: f64, north_m: f64) -> GeoPoint {
        let meters_per_degree_lon = METERS_PER_DEGREE * self.origin.latitude.to_radians().cos();
        GeoPoint::new(
            self.origin.latitude + north_m / METERS_PER_DEGREE,
            self.origin.longitude + east_m / meters_per_degree_lon,
        )
    }

    /// Samples the route every `interval`, from t = 0 to its end.
    pub fn trajectory(&self, route: &Route, interval: Duration) -> Vec<TruthSample> {
        let step = interval.as_secs_f64();
        if step <= 0.0 {
            return Vec::new();
        }
        let total = route.duration_secs();
        let count = (total / step).floor() as u64;

        (0..=count)
            .map(|k| {
                let timestamp = interval * k as u32;
                let (east_m, north_m) = route.position_at(timestamp.as_secs_f64());
                TruthSample {
                    timestamp,
                    point: self.to_geo(east_m, north_m),
                    east_m,
                    north_m,
                }
            })
            .collect()
    }

    /// Generates a noisy fix for a truth sample.
    pub fn sense(&mut self, sample: &TruthSample) -> RawFix {
        let (de, dn) = match &self.noise {
            Some(normal) => (normal.sample(&mut self.rng), normal.sample(&mut self.rng)),
            None => (0.0, 0.0),
        };
        let point = self.to_geo(sample.east_m + de, sample.north_m + dn);
        let fix = RawFix::new(point.latitude, point.longitude, sample.timestamp);
        if self.noise_std_m > 0.0 {
            fix.with_accuracy(self.noise_std_m)
        } else {
            fix
        }
    }

    /// Ground truth plus one noisy fix per sample.
    pub fn walk(&mut self, route: &Route, interval: Duration) -> (Vec<TruthSample>, Vec<RawFix>) {
        let truth = self.trajectory(route, interval);
        let fixes = truth.iter().map(|sample| self.sense(sample)).collect();
        (truth, fixes)
    }
}
