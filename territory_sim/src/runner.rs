//! Scenario runner - walks scenarios through the engine on a virtual clock.

use crate::context::SimContext;
use crate::exporter::{SimExport, SimFrame};
use crate::location::{Feed, SimLocationSource};
use crate::scenarios::ScenarioId;
use crate::walker::Walker;

use territory_core::{GeoPoint, SessionState, TerritoryEngine, TickOutcome, TrackingConfig};
use territory_env::{SessionId, TrackingContext};
use tracing::{debug, info, warn};

/// RNG stream reserved for walker noise.
const WALKER_STREAM: u64 = 1;

/// Anchor of every simulated walk (Tiergarten, Berlin).
pub const SIM_ORIGIN: GeoPoint = GeoPoint::new(52.5145, 13.3501);

/// Results from running a scenario.
#[derive(Debug, Clone)]
pub struct ScenarioResult {
    /// Scenario that was run
    pub scenario: ScenarioId,

    /// Seed used
    pub seed: u64,

    /// Whether the session ended the way the scenario expects
    pub passed: bool,

    /// Total ticks executed
    pub total_ticks: u64,

    /// Final simulation time in seconds
    pub final_time_secs: f64,

    /// Session state at the end of the run
    pub final_state: SessionState,

    /// Points on the recorded path at the end
    pub final_points: usize,

    /// Failure message if any
    pub failure_reason: Option<String>,

    /// Metrics collected during run
    pub metrics: ScenarioMetrics,
}

/// Metrics collected during scenario execution.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScenarioMetrics {
    /// Fixes the feed delivered to the engine
    pub fixes_delivered: u64,

    /// Fixes refused as invalid input
    pub fixes_rejected: u64,

    /// Ticks that appended a point
    pub recorded: u64,

    /// Ticks whose fix was too close to the last point
    pub skipped: u64,

    /// Ticks dropped by the speed guard
    pub speed_warnings: u64,

    /// Ticks with no new fix to sample
    pub idle_ticks: u64,
}

impl ScenarioMetrics {
    fn observe(&mut self, outcome: &TickOutcome) {
        match outcome {
            TickOutcome::Recorded { .. } | TickOutcome::Closed(_) => self.recorded += 1,
            TickOutcome::Skipped => self.skipped += 1,
            TickOutcome::SpeedWarning { .. } => self.speed_warnings += 1,
            TickOutcome::NoFix => self.idle_ticks += 1,
            TickOutcome::Inactive | TickOutcome::Aborted(_) => {}
        }
    }
}

/// Runs walking scenarios.
pub struct ScenarioRunner {
    /// Configuration seed
    seed: u64,

    /// Base engine configuration (scenarios may override parts)
    config: TrackingConfig,
}

impl ScenarioRunner {
    /// Creates a new scenario runner.
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            config: TrackingConfig::default(),
        }
    }

    /// Sets the base engine configuration.
    pub fn with_config(mut self, config: TrackingConfig) -> Self {
        self.config = config;
        self
    }

    /// Runs a scenario and returns the result.
    pub fn run(&self, scenario: ScenarioId) -> ScenarioResult {
        self.run_with_export(scenario).0
    }

    /// Runs a scenario and also returns its frame-by-frame export.
    pub fn run_with_export(&self, scenario: ScenarioId) -> (ScenarioResult, SimExport) {
        info!("Starting scenario: {} (seed={})", scenario.name(), self.seed);

        let ctx = SimContext::new(self.seed);
        let config = scenario.adjust_config(self.config.clone());
        let tick_interval = config.tick_interval;

        let mut walker = Walker::new(ctx.derive_rng(WALKER_STREAM), SIM_ORIGIN)
            .with_noise(scenario.noise_std_m());
        let (truth, fixes) = walker.walk(&scenario.route(), scenario.fix_interval());

        let mut export = SimExport::new(scenario.name(), self.seed, &config);
        export.truth = truth.iter().map(|sample| sample.point).collect();
        export.fixes = fixes.clone();

        let mut engine = match TerritoryEngine::new(config) {
            Ok(engine) => engine,
            Err(e) => {
                warn!(error = %e, "scenario config rejected");
                let result = ScenarioResult {
                    scenario,
                    seed: self.seed,
                    passed: false,
                    total_ticks: 0,
                    final_time_secs: 0.0,
                    final_state: SessionState::Idle,
                    final_points: 0,
                    failure_reason: Some(format!("invalid config: {e}")),
                    metrics: ScenarioMetrics::default(),
                };
                return (result, export);
            }
        };

        let source = SimLocationSource::new(ctx.clone(), fixes).with_linger(tick_interval);
        let generation = engine.start_with_id(SessionId::from_seed(self.seed));
        let mut metrics = ScenarioMetrics::default();

        'session: loop {
            // Deliver everything the platform produced up to now
            loop {
                match source.poll_feed() {
                    Feed::Due(raw) => match engine.push_raw(raw) {
                        Ok(_) => metrics.fixes_delivered += 1,
                        Err(e) => {
                            metrics.fixes_rejected += 1;
                            warn!(error = %e, "fix rejected");
                        }
                    },
                    Feed::Waiting => break,
                    Feed::Closed => {
                        info!("  feed closed at t={:.0}s", ctx.now().as_secs_f64());
                        engine.stop();
                        break 'session;
                    }
                }
            }

            ctx.advance_time(tick_interval);
            let outcome = engine.tick_for(generation);
            metrics.observe(&outcome);

            export.add_frame(SimFrame {
                time_sec: ctx.now().as_secs_f64(),
                outcome,
                points: engine.points().len(),
            });

            if engine.tick_count() % 30 == 0 {
                debug!(
                    "  t={:.0}s | points={} | outcome={:?}",
                    ctx.now().as_secs_f64(),
                    engine.points().len(),
                    outcome
                );
            }

            if matches!(
                outcome,
                TickOutcome::Inactive | TickOutcome::Aborted(_) | TickOutcome::Closed(_)
            ) {
                break;
            }
        }

        let final_state = engine.state();
        let check = scenario.expectation().check(&final_state, metrics.speed_warnings);
        let passed = check.is_ok();

        info!(
            "{} {}: {:?} after {} ticks, {} points",
            if passed { "✓" } else { "✗" },
            scenario.name(),
            final_state,
            engine.tick_count(),
            engine.points().len()
        );

        let result = ScenarioResult {
            scenario,
            seed: self.seed,
            passed,
            total_ticks: engine.tick_count(),
            final_time_secs: ctx.now().as_secs_f64(),
            final_state,
            final_points: engine.points().len(),
            failure_reason: check.err(),
            metrics,
        };

        export.finalize(engine.snapshot(), result.passed, result.failure_reason.clone());
        (result, export)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use territory_core::{AbortReason, TrackingSession};

    #[test]
    fn test_square_walk_scenario() {
        let result = ScenarioRunner::new(42).run(ScenarioId::SquareWalk);

        assert!(result.passed, "{:?}", result.failure_reason);
        let SessionState::Closed(verdict) = result.final_state else {
            panic!("expected closure, got {:?}", result.final_state);
        };
        assert!(verdict.valid);
        assert!((verdict.area_m2 - 22_500.0).abs() / 22_500.0 < 0.10);
        assert_eq!(result.metrics.speed_warnings, 0);
        assert!(result.final_points >= 10);
    }

    #[test]
    fn test_all_scenarios_pass() {
        let runner = ScenarioRunner::new(7);
        for scenario in ScenarioId::all() {
            let result = runner.run(scenario);
            assert!(
                result.passed,
                "{} failed: {:?}",
                scenario.name(),
                result.failure_reason
            );
        }
    }

    #[test]
    fn test_vehicle_aborts_on_second_fix() {
        let result = ScenarioRunner::new(42).run(ScenarioId::Vehicle);

        assert!(matches!(
            result.final_state,
            SessionState::Aborted(AbortReason::Speed { speed_kmh }) if speed_kmh > 30.0
        ));
        assert_eq!(result.total_ticks, 2);
        assert_eq!(result.final_points, 1);
    }

    #[test]
    fn test_jogging_spike_warns_but_claims() {
        let result = ScenarioRunner::new(42).run(ScenarioId::JoggingSpike);

        assert!(result.passed, "{:?}", result.failure_reason);
        assert!(result.metrics.speed_warnings >= 1);
    }

    #[test]
    fn test_stationary_drift_stops_open() {
        let result = ScenarioRunner::new(42).run(ScenarioId::StationaryDrift);

        assert_eq!(result.final_state, SessionState::Stopped);
        assert!(result.final_points < 10);
        // One fix every 2 s from t = 0 to t = 600 s
        assert_eq!(result.metrics.fixes_delivered, 301);
    }

    #[test]
    fn test_noisy_square_deterministic() {
        let a = ScenarioRunner::new(99).run(ScenarioId::NoisySquare);
        let b = ScenarioRunner::new(99).run(ScenarioId::NoisySquare);

        assert_eq!(a.final_state, b.final_state);
        assert_eq!(a.metrics, b.metrics);
        assert_eq!(a.total_ticks, b.total_ticks);
    }

    #[test]
    fn test_invalid_base_config_fails_scenario() {
        let config = TrackingConfig::default().with_max_points(3);
        let result = ScenarioRunner::new(1).with_config(config).run(ScenarioId::SquareWalk);

        assert!(!result.passed);
        assert!(result.failure_reason.unwrap().contains("invalid config"));
    }

    #[test]
    fn test_export_tracks_session() {
        let (result, export) = ScenarioRunner::new(42).run_with_export(ScenarioId::NarrowLoop);

        assert!(result.passed, "{:?}", result.failure_reason);
        assert_eq!(export.frames.len() as u64, result.total_ticks);
        assert_eq!(export.snapshot.as_ref().map(|s| s.points.len()), Some(result.final_points));
        assert!(!export.truth.is_empty());
    }

    /// The async session loop over the same virtual clock ends where the
    /// tick-by-tick runner does.
    #[tokio::test]
    async fn test_async_session_matches_runner() {
        let seed = 42;
        let scenario = ScenarioId::SquareWalk;
        let expected = ScenarioRunner::new(seed).run(scenario);

        let ctx = SimContext::new(seed);
        let config = scenario.adjust_config(TrackingConfig::default());
        let mut walker = Walker::new(ctx.derive_rng(WALKER_STREAM), SIM_ORIGIN)
            .with_noise(scenario.noise_std_m());
        let (_, fixes) = walker.walk(&scenario.route(), scenario.fix_interval());
        let source = SimLocationSource::new(ctx.clone(), fixes).with_linger(config.tick_interval);

        let session = TrackingSession::new(config).unwrap();
        session.start_with_id(SessionId::from_seed(seed));
        let state = session.run(&ctx, &source).await;

        assert_eq!(state, expected.final_state);
        assert_eq!(session.snapshot().points.len(), expected.final_points);
        assert_eq!(session.snapshot().tick_count, expected.total_ticks);
    }
}
