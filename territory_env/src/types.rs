//! Common types for the territory environment abstraction.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

/// Unique identifier for a tracking session.
///
/// Uses UUID v4 for global uniqueness without coordination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    /// Creates a new random SessionId.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a deterministic SessionId from a seed (for simulation).
    pub fn from_seed(seed: u64) -> Self {
        let mut bytes = [0u8; 16];
        bytes[0..8].copy_from_slice(&seed.to_le_bytes());
        bytes[8..16].copy_from_slice(&seed.wrapping_mul(0x517cc1b727220a95).to_le_bytes());
        Self(Uuid::from_bytes(bytes))
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Show first 8 chars for readability
        write!(f, "{}", &self.0.to_string()[..8])
    }
}

/// A location observation exactly as the platform delivered it.
///
/// This is a transport-layer value: coordinates are not validated here.
/// The engine converts it into a checked fix before using it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawFix {
    /// Latitude in WGS-84 degrees
    pub latitude: f64,

    /// Longitude in WGS-84 degrees
    pub longitude: f64,

    /// Monotonic timestamp relative to the session's time base
    pub timestamp: Duration,

    /// Reported horizontal accuracy in meters, when the platform provides one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accuracy_m: Option<f64>,
}

impl RawFix {
    /// Creates a raw fix without an accuracy estimate.
    pub fn new(latitude: f64, longitude: f64, timestamp: Duration) -> Self {
        Self {
            latitude,
            longitude,
            timestamp,
            accuracy_m: None,
        }
    }

    /// Attaches a horizontal accuracy estimate.
    pub fn with_accuracy(mut self, accuracy_m: f64) -> Self {
        self.accuracy_m = Some(accuracy_m);
        self
    }
}
