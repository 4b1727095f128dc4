//! TerritoryEngine - single owner of a tracking session's state.
//!
//! The engine is a pull-driven sampler over a push-driven location feed:
//! `push_fix` stores the most recent fix, `tick` consumes it and runs the
//! pipeline
//!
//! ```text
//! latest fix ──► SpeedGuard ──► PathRecorder ──► ClosureDetector ──► TerritoryValidator
//!                  │ warn: drop     │ too close: skip     │ closed once
//!                  └ abort: stop    └ point cap: stop     └ verdict
//! ```
//!
//! Session lifecycle is an explicit state machine:
//!
//! ```text
//! Idle ──start──► Tracking ──► Closed(verdict) | Aborted(reason) | Stopped
//!   ▲                                   │
//!   └──────────────── reset ────────────┘      (start is allowed from any state)
//! ```
//!
//! Every command bumps a generation counter. Ticks issued for an older
//! generation are ignored, so nothing is recorded after a stop.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use territory_env::{RawFix, SessionId};
use tracing::{debug, info, warn};

use crate::closure::ClosureDetector;
use crate::config::TrackingConfig;
use crate::error::Result;
use crate::fix::TimedFix;
use crate::geo_math::GeoPoint;
use crate::path_recorder::{PathRecorder, TrackedPath};
use crate::speed_guard::{SpeedGuard, SpeedVerdict};
use crate::validator::{TerritoryValidator, ValidationVerdict};

// ============================================================================
// STATE
// ============================================================================

/// Why a session was forcibly ended.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AbortReason {
    /// Movement faster than the abort limit
    Speed { speed_kmh: f64 },
    /// Recorded point cap reached without closing the loop
    PointLimit { limit: usize },
    /// Session ran longer than allowed (measured on fix timestamps)
    SessionExpired { elapsed_secs: f64 },
}

impl std::fmt::Display for AbortReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AbortReason::Speed { speed_kmh } => {
                write!(f, "moving too fast ({speed_kmh:.1} km/h)")
            }
            AbortReason::PointLimit { limit } => {
                write!(f, "point limit of {limit} reached without closing the loop")
            }
            AbortReason::SessionExpired { elapsed_secs } => {
                write!(f, "session expired after {elapsed_secs:.0} s")
            }
        }
    }
}

/// Lifecycle of a tracking session.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", content = "detail", rename_all = "snake_case")]
pub enum SessionState {
    Idle,
    Tracking,
    Closed(ValidationVerdict),
    Aborted(AbortReason),
    Stopped,
}

impl SessionState {
    /// True for states only `start` or `reset` can leave.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SessionState::Closed(_) | SessionState::Aborted(_) | SessionState::Stopped
        )
    }
}

/// What a single tick did.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TickOutcome {
    /// Session not tracking, or the tick belongs to an old generation
    Inactive,
    /// No new fix since the previous tick
    NoFix,
    /// Fix appended to the path
    Recorded { points: usize },
    /// Fix accepted by the speed guard but too close to the last point
    Skipped,
    /// Fix dropped as a speed spike
    SpeedWarning { speed_kmh: f64 },
    /// Session ended by this tick
    Aborted(AbortReason),
    /// Loop closed and validated by this tick
    Closed(ValidationVerdict),
}

/// Serializable view of the engine for hosts (rendering, UI warnings).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackingSnapshot {
    pub session_id: SessionId,
    pub state: SessionState,
    pub points: Vec<GeoPoint>,
    pub closed: bool,
    pub last_speed_verdict: Option<SpeedVerdict>,
    pub verdict: Option<ValidationVerdict>,
    pub tick_count: u64,
}

// ============================================================================
// ENGINE
// ============================================================================

/// Owns the path, speed state, latest fix and session state machine.
pub struct TerritoryEngine {
    config: TrackingConfig,
    session_id: SessionId,
    state: SessionState,
    generation: u64,

    path: TrackedPath,
    speed_guard: SpeedGuard,
    recorder: PathRecorder,
    closure: ClosureDetector,
    validator: TerritoryValidator,

    /// Most recent unconsumed fix from the location feed
    latest_fix: Option<TimedFix>,
    /// Timestamp of the first fix sampled in this session
    session_start: Option<Duration>,
    last_speed_verdict: Option<SpeedVerdict>,
    tick_count: u64,
}

impl TerritoryEngine {
    /// Creates an idle engine after validating the configuration.
    pub fn new(config: TrackingConfig) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            speed_guard: SpeedGuard::new(config.speed.clone()),
            recorder: PathRecorder::new(config.min_spacing_m),
            closure: ClosureDetector::new(&config.closure),
            validator: TerritoryValidator::new(config.validation.clone(), &config.closure),
            session_id: SessionId::new(),
            state: SessionState::Idle,
            generation: 0,
            path: TrackedPath::new(),
            latest_fix: None,
            session_start: None,
            last_speed_verdict: None,
            tick_count: 0,
            config,
        })
    }

    // ------------------------------------------------------------------------
    // Commands
    // ------------------------------------------------------------------------

    /// Begins a fresh session and returns its generation.
    pub fn start(&mut self) -> u64 {
        self.start_with_id(SessionId::new())
    }

    /// Like [`TerritoryEngine::start`] with a caller-chosen session id.
    pub fn start_with_id(&mut self, session_id: SessionId) -> u64 {
        self.clear_session();
        self.session_id = session_id;
        self.state = SessionState::Tracking;
        info!(session = %self.session_id, generation = self.generation, "tracking started");
        self.generation
    }

    /// Stops a running session. Calling it again, or on a finished
    /// session, changes nothing.
    pub fn stop(&mut self) {
        if self.state != SessionState::Tracking {
            debug!(state = ?self.state, "stop ignored");
            return;
        }
        self.generation += 1;
        self.latest_fix = None;
        self.state = SessionState::Stopped;
        info!(session = %self.session_id, points = self.path.len(), "tracking stopped");
    }

    /// Clears everything and returns to `Idle`.
    pub fn reset(&mut self) {
        self.clear_session();
        self.state = SessionState::Idle;
        debug!(generation = self.generation, "engine reset");
    }

    fn clear_session(&mut self) {
        self.generation += 1;
        self.path.clear();
        self.speed_guard.reset();
        self.latest_fix = None;
        self.session_start = None;
        self.last_speed_verdict = None;
        self.tick_count = 0;
    }

    // ------------------------------------------------------------------------
    // Inputs
    // ------------------------------------------------------------------------

    /// Stores `fix` as the most recent observation.
    ///
    /// Returns false (and drops the fix) when no session is tracking.
    pub fn push_fix(&mut self, fix: TimedFix) -> bool {
        if !self.is_tracking() {
            return false;
        }
        self.latest_fix = Some(fix);
        true
    }

    /// Validates a raw platform fix and stores it.
    pub fn push_raw(&mut self, raw: RawFix) -> Result<bool> {
        let fix = TimedFix::try_from(raw)?;
        Ok(self.push_fix(fix))
    }

    /// Ticks only when `generation` is still current.
    pub fn tick_for(&mut self, generation: u64) -> TickOutcome {
        if generation != self.generation {
            debug!(stale = generation, current = self.generation, "stale tick ignored");
            return TickOutcome::Inactive;
        }
        self.tick()
    }

    /// Samples the latest fix and runs it through the pipeline.
    pub fn tick(&mut self) -> TickOutcome {
        if !self.is_tracking() {
            return TickOutcome::Inactive;
        }
        self.tick_count += 1;

        let Some(fix) = self.latest_fix.take() else {
            return TickOutcome::NoFix;
        };

        let start = *self.session_start.get_or_insert(fix.timestamp);
        if let Some(elapsed) = fix.timestamp.checked_sub(start) {
            if elapsed > self.config.max_session_duration {
                return self.abort(AbortReason::SessionExpired {
                    elapsed_secs: elapsed.as_secs_f64(),
                });
            }
        }

        let speed = self.speed_guard.evaluate(fix);
        self.last_speed_verdict = Some(speed);
        match speed {
            SpeedVerdict::Abort(speed_kmh) => {
                return self.abort(AbortReason::Speed { speed_kmh });
            }
            SpeedVerdict::Warn(speed_kmh) => {
                return TickOutcome::SpeedWarning { speed_kmh };
            }
            SpeedVerdict::Normal => {}
        }

        if !self.recorder.try_record(&mut self.path, &fix) {
            return TickOutcome::Skipped;
        }

        if self.closure.check(&mut self.path) {
            let verdict = self.validator.validate(self.path.points());
            self.state = SessionState::Closed(verdict);
            info!(
                session = %self.session_id,
                valid = verdict.valid,
                area_m2 = verdict.area_m2,
                "territory closed: {}",
                verdict.describe()
            );
            return TickOutcome::Closed(verdict);
        }

        if self.path.len() >= self.config.max_points {
            return self.abort(AbortReason::PointLimit {
                limit: self.config.max_points,
            });
        }

        TickOutcome::Recorded {
            points: self.path.len(),
        }
    }

    fn abort(&mut self, reason: AbortReason) -> TickOutcome {
        self.generation += 1;
        self.latest_fix = None;
        self.state = SessionState::Aborted(reason);
        warn!(session = %self.session_id, %reason, "tracking aborted");
        TickOutcome::Aborted(reason)
    }

    // ------------------------------------------------------------------------
    // Observations
    // ------------------------------------------------------------------------

    pub fn config(&self) -> &TrackingConfig {
        &self.config
    }

    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_tracking(&self) -> bool {
        self.state == SessionState::Tracking
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn path(&self) -> &TrackedPath {
        &self.path
    }

    pub fn points(&self) -> &[GeoPoint] {
        self.path.points()
    }

    pub fn is_closed(&self) -> bool {
        self.path.is_closed()
    }

    pub fn last_speed_verdict(&self) -> Option<SpeedVerdict> {
        self.last_speed_verdict
    }

    /// The validation verdict, once the loop has closed.
    pub fn verdict(&self) -> Option<ValidationVerdict> {
        match self.state {
            SessionState::Closed(verdict) => Some(verdict),
            _ => None,
        }
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn snapshot(&self) -> TrackingSnapshot {
        TrackingSnapshot {
            session_id: self.session_id,
            state: self.state,
            points: self.path.points().to_vec(),
            closed: self.path.is_closed(),
            last_speed_verdict: self.last_speed_verdict,
            verdict: self.verdict(),
            tick_count: self.tick_count,
        }
    }
}

impl std::fmt::Debug for TerritoryEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TerritoryEngine")
            .field("session_id", &self.session_id)
            .field("state", &self.state)
            .field("generation", &self.generation)
            .field("points", &self.path.len())
            .finish()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validator::ValidationFailure;

    const PER_METER: f64 = 1.0 / 111_195.0;

    fn at(east: f64, north: f64) -> GeoPoint {
        GeoPoint::new(north * PER_METER, east * PER_METER)
    }

    fn fix(east: f64, north: f64, secs: f64) -> TimedFix {
        TimedFix::new(at(east, north), Duration::from_secs_f64(secs))
    }

    /// Position after walking `s` meters counter-clockwise around a square
    /// whose south-west corner is the origin.
    fn square_position(side: f64, s: f64) -> (f64, f64) {
        let s = s % (4.0 * side);
        if s < side {
            (s, 0.0)
        } else if s < 2.0 * side {
            (side, s - side)
        } else if s < 3.0 * side {
            (3.0 * side - s, side)
        } else {
            (0.0, 4.0 * side - s)
        }
    }

    fn tracking_engine() -> TerritoryEngine {
        let mut engine = TerritoryEngine::new(TrackingConfig::default()).unwrap();
        engine.start();
        engine
    }

    fn feed(engine: &mut TerritoryEngine, f: TimedFix) -> TickOutcome {
        engine.push_fix(f);
        engine.tick()
    }

    #[test]
    fn test_square_walk_end_to_end() {
        let mut engine = tracking_engine();
        let speed_ms = 5.0 / 3.6;
        let interval = 10.0;

        let mut closed_at = None;
        for k in 0..60 {
            let t = k as f64 * interval;
            let (x, y) = square_position(150.0, speed_ms * t);
            if let TickOutcome::Closed(verdict) = feed(&mut engine, fix(x, y, t)) {
                closed_at = Some((k, verdict));
                break;
            }
        }

        let (k, verdict) = closed_at.expect("square walk never closed");
        assert!(k > 30, "closed too early at tick {k}");
        assert!(engine.is_closed());
        assert!(verdict.valid, "{}", verdict.describe());
        assert!(
            (verdict.area_m2 - 22_500.0).abs() / 22_500.0 < 0.10,
            "area {}",
            verdict.area_m2
        );
        assert_eq!(engine.verdict(), Some(verdict));
        assert_eq!(engine.state(), SessionState::Closed(verdict));
    }

    #[test]
    fn test_speed_warning_drops_fix() {
        let mut engine = tracking_engine();
        feed(&mut engine, fix(0.0, 0.0, 0.0));

        // 100 m in 15 s = 24 km/h
        let outcome = feed(&mut engine, fix(100.0, 0.0, 15.0));
        assert!(matches!(outcome, TickOutcome::SpeedWarning { .. }));
        assert_eq!(engine.points().len(), 1);
        assert!(engine.is_tracking());

        // The dropped fix is not replayed on the next tick
        assert_eq!(engine.tick(), TickOutcome::NoFix);
        assert_eq!(engine.points().len(), 1);
    }

    #[test]
    fn test_normal_speed_records() {
        let mut engine = tracking_engine();
        feed(&mut engine, fix(0.0, 0.0, 0.0));

        // 100 m in 30 s = 12 km/h
        assert_eq!(
            feed(&mut engine, fix(100.0, 0.0, 30.0)),
            TickOutcome::Recorded { points: 2 }
        );
        assert_eq!(engine.last_speed_verdict(), Some(SpeedVerdict::Normal));
    }

    #[test]
    fn test_vehicle_speed_aborts_session() {
        let mut engine = tracking_engine();
        feed(&mut engine, fix(0.0, 0.0, 0.0));

        // 100 m in 5 s = 72 km/h
        let outcome = feed(&mut engine, fix(100.0, 0.0, 5.0));
        let TickOutcome::Aborted(AbortReason::Speed { speed_kmh }) = outcome else {
            panic!("expected speed abort, got {outcome:?}");
        };
        assert!((speed_kmh - 72.0).abs() < 0.5);
        assert!(matches!(engine.state(), SessionState::Aborted(_)));

        // Nothing is accepted afterwards
        assert!(!engine.push_fix(fix(110.0, 0.0, 60.0)));
        assert_eq!(engine.tick(), TickOutcome::Inactive);
        assert_eq!(engine.points().len(), 1);
    }

    #[test]
    fn test_close_fix_is_skipped() {
        let mut engine = tracking_engine();
        feed(&mut engine, fix(0.0, 0.0, 0.0));
        assert_eq!(feed(&mut engine, fix(4.0, 0.0, 10.0)), TickOutcome::Skipped);
        assert_eq!(engine.points().len(), 1);
    }

    #[test]
    fn test_tick_without_fix() {
        let mut engine = tracking_engine();
        assert_eq!(engine.tick(), TickOutcome::NoFix);
        assert_eq!(engine.tick_count(), 1);
    }

    #[test]
    fn test_idle_engine_ignores_input() {
        let mut engine = TerritoryEngine::new(TrackingConfig::default()).unwrap();
        assert!(!engine.push_fix(fix(0.0, 0.0, 0.0)));
        assert_eq!(engine.tick(), TickOutcome::Inactive);
        assert_eq!(engine.state(), SessionState::Idle);
    }

    #[test]
    fn test_stop_is_idempotent_and_invalidates_ticks() {
        let mut engine = tracking_engine();
        let generation = engine.generation();
        feed(&mut engine, fix(0.0, 0.0, 0.0));

        engine.push_fix(fix(20.0, 0.0, 20.0));
        engine.stop();
        let after_stop = engine.generation();
        engine.stop();

        assert_eq!(engine.state(), SessionState::Stopped);
        assert_eq!(engine.generation(), after_stop);
        assert_eq!(engine.tick_for(generation), TickOutcome::Inactive);
        assert_eq!(engine.tick(), TickOutcome::Inactive);
        assert_eq!(engine.points().len(), 1);
    }

    #[test]
    fn test_stale_generation_after_restart() {
        let mut engine = tracking_engine();
        let old = engine.generation();
        let new = engine.start();

        assert_ne!(old, new);
        engine.push_fix(fix(0.0, 0.0, 0.0));
        assert_eq!(engine.tick_for(old), TickOutcome::Inactive);
        assert_eq!(engine.tick_for(new), TickOutcome::Recorded { points: 1 });
    }

    #[test]
    fn test_closure_validates_once() {
        let mut engine = tracking_engine();
        // Small loop that comes back within range on its tenth point
        let loop_points = [
            (0.0, 0.0),
            (11.0, 0.0),
            (22.0, 0.0),
            (22.0, 11.0),
            (22.0, 22.0),
            (11.0, 22.0),
            (0.0, 22.0),
            (-11.0, 22.0),
            (-11.0, 11.0),
            (0.0, 5.0),
        ];

        let mut outcomes = Vec::new();
        for (k, (x, y)) in loop_points.iter().enumerate() {
            outcomes.push(feed(&mut engine, fix(*x, *y, k as f64 * 10.0)));
        }

        let closes = outcomes
            .iter()
            .filter(|o| matches!(o, TickOutcome::Closed(_)))
            .count();
        assert_eq!(closes, 1);

        let verdict = engine.verdict().unwrap();
        assert!(verdict.valid, "{}", verdict.describe());

        let points_before = engine.points().to_vec();
        assert_eq!(feed(&mut engine, fix(30.0, 30.0, 200.0)), TickOutcome::Inactive);
        assert_eq!(engine.points(), points_before.as_slice());
        assert_eq!(engine.verdict(), Some(verdict));
    }

    #[test]
    fn test_rejected_claim_keeps_path() {
        let mut engine = tracking_engine();
        // Figure-eight walked at ~4 km/h: closes near the start but crosses itself
        let points = [
            (0.0, 0.0),
            (15.0, 0.0),
            (30.0, 0.0),
            (45.0, 15.0),
            (60.0, 30.0),
            (75.0, 15.0),
            (60.0, 0.0),
            (45.0, 30.0),
            (30.0, 45.0),
            (15.0, 45.0),
            (0.0, 33.0),
            (0.0, 15.0),
        ];
        let mut last = TickOutcome::Inactive;
        for (k, (x, y)) in points.iter().enumerate() {
            last = feed(&mut engine, fix(*x, *y, k as f64 * 20.0));
        }

        let TickOutcome::Closed(verdict) = last else {
            panic!("expected closure, got {last:?}");
        };
        assert!(!verdict.valid);
        assert_eq!(verdict.reason, Some(ValidationFailure::SelfIntersecting));
        assert_eq!(engine.points().len(), points.len());
    }

    #[test]
    fn test_point_limit_aborts() {
        let config = TrackingConfig::default().with_max_points(12);
        let mut engine = TerritoryEngine::new(config).unwrap();
        engine.start();

        let mut last = TickOutcome::Inactive;
        for k in 0..20 {
            last = feed(&mut engine, fix(k as f64 * 12.0, 0.0, k as f64 * 10.0));
            if matches!(last, TickOutcome::Aborted(_)) {
                break;
            }
        }

        assert_eq!(
            last,
            TickOutcome::Aborted(AbortReason::PointLimit { limit: 12 })
        );
        assert_eq!(engine.points().len(), 12);
    }

    #[test]
    fn test_session_expiry() {
        let config = TrackingConfig::default().with_max_session_duration(Duration::from_secs(60));
        let mut engine = TerritoryEngine::new(config).unwrap();
        engine.start();

        feed(&mut engine, fix(0.0, 0.0, 0.0));
        let outcome = feed(&mut engine, fix(12.0, 0.0, 61.0));
        assert!(matches!(
            outcome,
            TickOutcome::Aborted(AbortReason::SessionExpired { .. })
        ));
    }

    #[test]
    fn test_nan_raw_fix_rejected() {
        let mut engine = tracking_engine();
        let raw = RawFix::new(f64::NAN, 0.0, Duration::from_secs(1));

        assert!(engine.push_raw(raw).is_err());
        assert_eq!(engine.tick(), TickOutcome::NoFix);
        assert!(engine.is_tracking());
    }

    #[test]
    fn test_restart_after_closed_clears_session() {
        let mut engine = tracking_engine();
        let loop_points = [
            (0.0, 0.0),
            (11.0, 0.0),
            (22.0, 0.0),
            (22.0, 11.0),
            (22.0, 22.0),
            (11.0, 22.0),
            (0.0, 22.0),
            (-11.0, 22.0),
            (-11.0, 11.0),
            (0.0, 5.0),
        ];
        for (k, (x, y)) in loop_points.iter().enumerate() {
            feed(&mut engine, fix(*x, *y, k as f64 * 10.0));
        }
        assert!(engine.verdict().is_some());

        let generation = engine.start();

        assert_eq!(engine.state(), SessionState::Tracking);
        assert!(engine.points().is_empty());
        assert!(!engine.is_closed());
        assert!(engine.verdict().is_none());
        assert!(engine.last_speed_verdict().is_none());
        assert_eq!(engine.tick_for(generation), TickOutcome::NoFix);
        assert_eq!(
            feed(&mut engine, fix(0.0, 0.0, 300.0)),
            TickOutcome::Recorded { points: 1 }
        );
    }

    #[test]
    fn test_restart_after_abort_clears_speed_state() {
        let mut engine = tracking_engine();
        feed(&mut engine, fix(0.0, 0.0, 0.0));
        feed(&mut engine, fix(100.0, 0.0, 5.0));
        assert!(matches!(engine.state(), SessionState::Aborted(_)));

        engine.start();

        assert_eq!(engine.state(), SessionState::Tracking);
        assert!(engine.points().is_empty());
        assert!(engine.verdict().is_none());
        assert!(engine.last_speed_verdict().is_none());

        // 60 km/h if measured from the aborted session's last accepted fix
        assert_eq!(
            feed(&mut engine, fix(100.0, 0.0, 6.0)),
            TickOutcome::Recorded { points: 1 }
        );
        assert_eq!(engine.last_speed_verdict(), Some(SpeedVerdict::Normal));
    }

    #[test]
    fn test_reset_returns_to_idle() {
        let mut engine = tracking_engine();
        feed(&mut engine, fix(0.0, 0.0, 0.0));
        engine.reset();

        assert_eq!(engine.state(), SessionState::Idle);
        assert!(engine.points().is_empty());
        assert!(engine.last_speed_verdict().is_none());
    }

    #[test]
    fn test_snapshot_serializes() {
        let mut engine = tracking_engine();
        feed(&mut engine, fix(0.0, 0.0, 0.0));

        let snapshot = engine.snapshot();
        let json = serde_json::to_string(&snapshot).unwrap();
        let back: TrackingSnapshot = serde_json::from_str(&json).unwrap();

        assert_eq!(back, snapshot);
        assert!(json.contains("\"tracking\""));
    }
}
