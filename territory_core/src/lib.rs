//! Territory Core - GPS territory tracking and claim validation
//!
//! A player walks a loop; the engine samples their position on a fixed
//! tick, records a spaced path, detects when the loop closes and decides
//! whether the enclosed area is a valid territory claim.
//!
//! 1. **Speed gating**: fixes implying vehicle speeds are dropped or abort the session
//! 2. **Loop closure**: the path closes once it returns near its start point
//! 3. **Claim validation**: point count, walked length, self-intersection and area
//!
//! Platform services (clock, location feed, task spawning) come in through
//! the `territory_env` traits, so the same engine runs under tokio or under
//! a deterministic simulation.

pub mod closure;
pub mod config;
pub mod engine;
pub mod error;
pub mod fix;
pub mod geo_math;
pub mod intersection;
pub mod path_recorder;
pub mod session;
pub mod speed_guard;
pub mod validator;

// Re-export key types for convenience
pub use closure::ClosureDetector;
pub use config::{ClosureConfig, SpeedLimits, TrackingConfig, ValidationThresholds};
pub use engine::{AbortReason, SessionState, TerritoryEngine, TickOutcome, TrackingSnapshot};
pub use error::{Result, TerritoryError};
pub use fix::TimedFix;
pub use geo_math::{distance, path_length, polygon_area, segments_intersect, GeoPoint};
pub use intersection::SelfIntersectionChecker;
pub use path_recorder::{PathRecorder, TrackedPath};
pub use session::TrackingSession;
pub use speed_guard::{SpeedGuard, SpeedState, SpeedVerdict};
pub use validator::{TerritoryValidator, ValidationFailure, ValidationVerdict};
