//! JSON exporter for offline inspection of simulated sessions.
//!
//! Exports ground truth, raw fixes and per-tick outcomes so a run can be
//! plotted next to the path the engine actually recorded.

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use territory_core::{GeoPoint, TickOutcome, TrackingConfig, TrackingSnapshot};
use territory_env::RawFix;

/// A single tick of simulation data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimFrame {
    /// Simulation time in seconds
    pub time_sec: f64,

    /// What the tick did
    pub outcome: TickOutcome,

    /// Recorded path length after the tick
    pub points: usize,
}

/// Complete simulation export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimExport {
    /// Scenario name
    pub scenario: String,

    /// Seed used
    pub seed: u64,

    /// Engine configuration the scenario ran with
    pub config: TrackingConfig,

    /// Duration in seconds
    pub duration_sec: f64,

    /// True walker positions, one per fix
    pub truth: Vec<GeoPoint>,

    /// Fixes as delivered to the engine
    pub fixes: Vec<RawFix>,

    /// All frames
    pub frames: Vec<SimFrame>,

    /// Engine state at the end of the run
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<TrackingSnapshot>,

    /// Final results
    pub passed: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
}

impl SimExport {
    /// Creates a new export container.
    pub fn new(scenario: &str, seed: u64, config: &TrackingConfig) -> Self {
        Self {
            scenario: scenario.to_string(),
            seed,
            config: config.clone(),
            duration_sec: 0.0,
            truth: Vec::new(),
            fixes: Vec::new(),
            frames: Vec::new(),
            snapshot: None,
            passed: false,
            failure_reason: None,
        }
    }

    /// Adds a frame.
    pub fn add_frame(&mut self, frame: SimFrame) {
        self.duration_sec = frame.time_sec;
        self.frames.push(frame);
    }

    /// Finalizes the export.
    pub fn finalize(
        &mut self,
        snapshot: TrackingSnapshot,
        passed: bool,
        failure_reason: Option<String>,
    ) {
        self.snapshot = Some(snapshot);
        self.passed = passed;
        self.failure_reason = failure_reason;
    }

    /// Writes to a JSON file.
    pub fn write_to_file(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        let mut file = File::create(path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frames_extend_duration() {
        let mut export = SimExport::new("square_walk", 42, &TrackingConfig::default());
        export.add_frame(SimFrame {
            time_sec: 2.0,
            outcome: TickOutcome::NoFix,
            points: 0,
        });
        export.add_frame(SimFrame {
            time_sec: 4.0,
            outcome: TickOutcome::Recorded { points: 1 },
            points: 1,
        });

        assert_eq!(export.duration_sec, 4.0);
        assert_eq!(export.frames.len(), 2);
    }

    #[test]
    fn test_json_shape() {
        let mut export = SimExport::new("vehicle", 7, &TrackingConfig::default());
        export.add_frame(SimFrame {
            time_sec: 2.0,
            outcome: TickOutcome::Skipped,
            points: 3,
        });

        let json = serde_json::to_value(&export).unwrap();
        assert_eq!(json["scenario"], "vehicle");
        assert_eq!(json["frames"][0]["outcome"]["outcome"], "skipped");
        assert_eq!(json["config"]["tick_interval"], 2.0);
        assert!(json.get("snapshot").is_none());
        assert!(json.get("failure_reason").is_none());
    }
}
