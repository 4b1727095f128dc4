//! Walking scenarios for deterministic simulation.

use std::time::Duration;
use territory_core::{AbortReason, SessionState, TrackingConfig};

use crate::walker::Route;

/// Normal walking pace (km/h).
const WALK_KMH: f64 = 5.0;

/// Scenario identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenarioId {
    /// SIM-001: clean 150 m square walked at 5 km/h
    SquareWalk,

    /// SIM-002: same square with 1.5 m GPS noise
    NoisySquare,

    /// SIM-003: bow-tie loop whose diagonals cross
    FigureEight,

    /// SIM-004: 60 m out-and-back one meter apart
    NarrowLoop,

    /// SIM-005: driving at 50 km/h
    Vehicle,

    /// SIM-006: square with a short 20 km/h jog on one edge
    JoggingSpike,

    /// SIM-007: standing still for ten minutes under 2 m noise
    StationaryDrift,

    /// SIM-008: tiny 8 m square with 2 m point spacing
    ShortWalk,
}

/// Outcome a scenario must produce to pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Expectation {
    /// Valid territory of roughly `area_m2`, within `tolerance` (fraction)
    Claimed {
        area_m2: f64,
        tolerance: f64,
        min_speed_warnings: u64,
    },
    /// Closed and rejected for the given failure kind
    Rejected(&'static str),
    /// Aborted by the speed guard
    SpeedAbort,
    /// Feed ended before the loop closed
    Unclosed,
}

impl Expectation {
    /// Checks a finished session against the expectation.
    pub fn check(&self, state: &SessionState, speed_warnings: u64) -> Result<(), String> {
        match (self, state) {
            (
                Expectation::Claimed {
                    area_m2,
                    tolerance,
                    min_speed_warnings,
                },
                SessionState::Closed(verdict),
            ) => {
                if !verdict.valid {
                    return Err(format!("claim rejected: {}", verdict.describe()));
                }
                let error = (verdict.area_m2 - area_m2).abs() / area_m2;
                if error > *tolerance {
                    return Err(format!(
                        "area {:.0} m² deviates {:.1}% from {:.0} m²",
                        verdict.area_m2,
                        error * 100.0,
                        area_m2
                    ));
                }
                if speed_warnings < *min_speed_warnings {
                    return Err(format!(
                        "{speed_warnings} speed warnings, expected at least {min_speed_warnings}"
                    ));
                }
                Ok(())
            }
            (Expectation::Rejected(kind), SessionState::Closed(verdict)) => match verdict.reason {
                Some(reason) if reason.kind() == *kind => Ok(()),
                Some(reason) => Err(format!("rejected for {}, expected {kind}", reason.kind())),
                None => Err(format!("claim accepted, expected rejection for {kind}")),
            },
            (Expectation::SpeedAbort, SessionState::Aborted(AbortReason::Speed { .. })) => Ok(()),
            (Expectation::Unclosed, SessionState::Stopped) => Ok(()),
            (expected, actual) => Err(format!("ended {actual:?}, expected {expected:?}")),
        }
    }
}

impl ScenarioId {
    /// Returns a list of all scenarios.
    pub fn all() -> Vec<ScenarioId> {
        vec![
            ScenarioId::SquareWalk,
            ScenarioId::NoisySquare,
            ScenarioId::FigureEight,
            ScenarioId::NarrowLoop,
            ScenarioId::Vehicle,
            ScenarioId::JoggingSpike,
            ScenarioId::StationaryDrift,
            ScenarioId::ShortWalk,
        ]
    }

    /// Returns the scenario name.
    pub fn name(&self) -> &'static str {
        match self {
            ScenarioId::SquareWalk => "square_walk",
            ScenarioId::NoisySquare => "noisy_square",
            ScenarioId::FigureEight => "figure_eight",
            ScenarioId::NarrowLoop => "narrow_loop",
            ScenarioId::Vehicle => "vehicle",
            ScenarioId::JoggingSpike => "jogging_spike",
            ScenarioId::StationaryDrift => "stationary_drift",
            ScenarioId::ShortWalk => "short_walk",
        }
    }

    /// Returns a description of the scenario.
    pub fn description(&self) -> &'static str {
        match self {
            ScenarioId::SquareWalk => "150 m square at walking pace, expect ~22,500 m² claim",
            ScenarioId::NoisySquare => "150 m square with 1.5 m GPS noise, claim within 15%",
            ScenarioId::FigureEight => "crossing diagonals, expect self-intersection rejection",
            ScenarioId::NarrowLoop => "60 m out-and-back 1 m wide, expect area rejection",
            ScenarioId::Vehicle => "50 km/h drive, expect speed abort on the second fix",
            ScenarioId::JoggingSpike => {
                "20 km/h jog mid-square, warned fixes dropped, claim still valid"
            }
            ScenarioId::StationaryDrift => "10 minutes standing still, noise never closes a loop",
            ScenarioId::ShortWalk => "8 m square with 2 m spacing, expect distance rejection",
        }
    }

    /// The route walked, in meters east/north of the origin.
    pub fn route(&self) -> Route {
        match self {
            ScenarioId::SquareWalk | ScenarioId::NoisySquare => square(150.0, WALK_KMH),
            ScenarioId::FigureEight => Route::new(0.0, 0.0)
                .walk_to(80.0, 80.0, WALK_KMH)
                .walk_to(80.0, 0.0, WALK_KMH)
                .walk_to(0.0, 80.0, WALK_KMH)
                .walk_to(0.0, 20.0, WALK_KMH),
            ScenarioId::NarrowLoop => Route::new(0.0, 0.0)
                .walk_to(60.0, 0.0, WALK_KMH)
                .walk_to(60.0, 1.0, WALK_KMH)
                .walk_to(0.0, 1.0, WALK_KMH),
            ScenarioId::Vehicle => Route::new(0.0, 0.0).walk_to(2_000.0, 0.0, 50.0),
            ScenarioId::JoggingSpike => Route::new(0.0, 0.0)
                .walk_to(150.0, 0.0, WALK_KMH)
                .walk_to(150.0, 40.0, WALK_KMH)
                .walk_to(150.0, 80.0, 20.0)
                .walk_to(150.0, 150.0, WALK_KMH)
                .walk_to(0.0, 150.0, WALK_KMH)
                .walk_to(0.0, 0.0, WALK_KMH),
            ScenarioId::StationaryDrift => Route::new(0.0, 0.0).pause(600.0),
            ScenarioId::ShortWalk => square(8.0, WALK_KMH),
        }
    }

    /// Horizontal GPS noise standard deviation (meters).
    pub fn noise_std_m(&self) -> f64 {
        match self {
            ScenarioId::NoisySquare => 1.5,
            ScenarioId::FigureEight => 1.0,
            ScenarioId::StationaryDrift => 2.0,
            _ => 0.0,
        }
    }

    /// Interval between platform fixes.
    pub fn fix_interval(&self) -> Duration {
        Duration::from_secs(2)
    }

    /// Applies scenario-specific overrides on top of the base config.
    pub fn adjust_config(&self, config: TrackingConfig) -> TrackingConfig {
        match self {
            ScenarioId::ShortWalk => TrackingConfig {
                min_spacing_m: 2.0,
                ..config
            },
            _ => config,
        }
    }

    pub fn expectation(&self) -> Expectation {
        match self {
            ScenarioId::SquareWalk => Expectation::Claimed {
                area_m2: 22_500.0,
                tolerance: 0.10,
                min_speed_warnings: 0,
            },
            ScenarioId::NoisySquare => Expectation::Claimed {
                area_m2: 22_500.0,
                tolerance: 0.15,
                min_speed_warnings: 0,
            },
            ScenarioId::FigureEight => Expectation::Rejected("self_intersecting"),
            ScenarioId::NarrowLoop => Expectation::Rejected("insufficient_area"),
            ScenarioId::Vehicle => Expectation::SpeedAbort,
            ScenarioId::JoggingSpike => Expectation::Claimed {
                area_m2: 22_500.0,
                tolerance: 0.10,
                min_speed_warnings: 1,
            },
            ScenarioId::StationaryDrift => Expectation::Unclosed,
            ScenarioId::ShortWalk => Expectation::Rejected("insufficient_distance"),
        }
    }
}

/// Counter-clockwise square walk returning to the start.
fn square(side_m: f64, speed_kmh: f64) -> Route {
    Route::new(0.0, 0.0)
        .walk_to(side_m, 0.0, speed_kmh)
        .walk_to(side_m, side_m, speed_kmh)
        .walk_to(0.0, side_m, speed_kmh)
        .walk_to(0.0, 0.0, speed_kmh)
}

impl std::fmt::Display for ScenarioId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for ScenarioId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "square_walk" | "square" | "sim-001" => Ok(ScenarioId::SquareWalk),
            "noisy_square" | "sim-002" => Ok(ScenarioId::NoisySquare),
            "figure_eight" | "figure8" | "sim-003" => Ok(ScenarioId::FigureEight),
            "narrow_loop" | "sim-004" => Ok(ScenarioId::NarrowLoop),
            "vehicle" | "sim-005" => Ok(ScenarioId::Vehicle),
            "jogging_spike" | "jogging" | "sim-006" => Ok(ScenarioId::JoggingSpike),
            "stationary_drift" | "stationary" | "sim-007" => Ok(ScenarioId::StationaryDrift),
            "short_walk" | "sim-008" => Ok(ScenarioId::ShortWalk),
            _ => Err(format!("Unknown scenario: {}", s)),
        }
    }
}
