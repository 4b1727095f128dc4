//! Tracking Session - serialized access to an engine from two async inputs.
//!
//! This module is the integration layer between the pure engine and the
//! environment abstraction (`TrackingContext`, `LocationSource`).
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     TrackingSession                         │
//! │                                                             │
//! │   LocationSource ──next_fix()──┐                            │
//! │                                ▼                            │
//! │                  ┌──────────────────────────┐               │
//! │                  │ Mutex<TerritoryEngine>   │               │
//! │                  │  • latest fix slot       │               │
//! │                  │  • path / speed / state  │               │
//! │                  └──────────────────────────┘               │
//! │                                ▲                            │
//! │   TrackingContext ──sleep()────┘ tick_for(generation)       │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! The lock is never held across an `.await`, so the location callback
//! and the tick never block each other for longer than one engine step.
//!
//! # Usage
//!
//! ```ignore
//! use territory_core::{TrackingConfig, TrackingSession};
//! use territory_env::{location_channel, TokioContext};
//!
//! let session = TrackingSession::new(TrackingConfig::default())?;
//! let (sender, source) = location_channel();
//!
//! session.start();
//! let final_state = session.run(&TokioContext::new(), &source).await;
//! ```

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use territory_env::{EnvError, LocationSource, RawFix, SessionId, TrackingContext};
use tracing::{debug, info, warn};

use crate::config::TrackingConfig;
use crate::engine::{SessionState, TerritoryEngine, TickOutcome, TrackingSnapshot};
use crate::error::Result;
use crate::fix::TimedFix;

/// Cloneable handle to a lock-guarded [`TerritoryEngine`].
#[derive(Clone)]
pub struct TrackingSession {
    engine: Arc<Mutex<TerritoryEngine>>,
}

impl TrackingSession {
    /// Creates an idle session.
    pub fn new(config: TrackingConfig) -> Result<Self> {
        Ok(Self::from_engine(TerritoryEngine::new(config)?))
    }

    pub fn from_engine(engine: TerritoryEngine) -> Self {
        Self {
            engine: Arc::new(Mutex::new(engine)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, TerritoryEngine> {
        // A panic mid-step leaves at worst a partial path; reset/start restores it
        self.engine.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ------------------------------------------------------------------------
    // Commands
    // ------------------------------------------------------------------------

    pub fn start(&self) -> u64 {
        self.lock().start()
    }

    pub fn start_with_id(&self, session_id: SessionId) -> u64 {
        self.lock().start_with_id(session_id)
    }

    pub fn stop(&self) {
        self.lock().stop()
    }

    pub fn reset(&self) {
        self.lock().reset()
    }

    // ------------------------------------------------------------------------
    // Inputs
    // ------------------------------------------------------------------------

    /// Location callback entry point for unvalidated platform fixes.
    pub fn push_raw(&self, raw: RawFix) -> Result<bool> {
        self.lock().push_raw(raw)
    }

    pub fn push_fix(&self, fix: TimedFix) -> bool {
        self.lock().push_fix(fix)
    }

    /// Tick entry point; stale generations are ignored.
    pub fn tick_for(&self, generation: u64) -> TickOutcome {
        self.lock().tick_for(generation)
    }

    // ------------------------------------------------------------------------
    // Observations
    // ------------------------------------------------------------------------

    pub fn state(&self) -> SessionState {
        self.lock().state()
    }

    pub fn generation(&self) -> u64 {
        self.lock().generation()
    }

    pub fn snapshot(&self) -> TrackingSnapshot {
        self.lock().snapshot()
    }

    // ------------------------------------------------------------------------
    // Runtime
    // ------------------------------------------------------------------------

    /// Drives the current session until it leaves `Tracking`.
    ///
    /// Fixes from `source` fill the latest-fix slot; every tick interval
    /// (measured by `ctx`) the engine samples it. The loop ends when the
    /// session closes or aborts, when a command bumps the generation, or
    /// when the source closes (which stops the session).
    pub async fn run<Ctx, Loc>(&self, ctx: &Ctx, source: &Loc) -> SessionState
    where
        Ctx: TrackingContext,
        Loc: LocationSource,
    {
        let (generation, interval) = {
            let engine = self.lock();
            if !engine.is_tracking() {
                return engine.state();
            }
            (engine.generation(), engine.config().tick_interval)
        };

        info!(
            generation,
            interval_ms = interval.as_millis() as u64,
            source = source.name(),
            "session loop started"
        );

        let mut tick = ctx.sleep(interval);
        loop {
            tokio::select! {
                // Fixes already delivered are applied before the tick samples
                biased;

                fix = source.next_fix() => match fix {
                    Ok(raw) => {
                        if let Err(e) = self.push_raw(raw) {
                            warn!(error = %e, "dropping unusable fix");
                        }
                    }
                    Err(EnvError::SourceClosed) => {
                        info!("location source closed");
                        self.stop();
                        break;
                    }
                    Err(e) => warn!(error = %e, "waiting for location"),
                },
                _ = &mut tick => {
                    tick = ctx.sleep(interval);
                    match self.tick_for(generation) {
                        TickOutcome::Inactive => break,
                        TickOutcome::Aborted(_) | TickOutcome::Closed(_) => break,
                        outcome => debug!(?outcome, "tick"),
                    }
                }
            }
        }

        let state = self.state();
        info!(?state, "session loop finished");
        state
    }

    /// Spawns [`TrackingSession::run`] on the context's executor.
    pub fn spawn<Ctx, Loc>(&self, ctx: Arc<Ctx>, source: Arc<Loc>)
    where
        Ctx: TrackingContext,
        Loc: LocationSource,
    {
        let session = self.clone();
        let runner = Arc::clone(&ctx);
        ctx.spawn("tracking-session", async move {
            session.run(runner.as_ref(), source.as_ref()).await;
        });
    }
}

impl std::fmt::Debug for TrackingSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("TrackingSession").field(&*self.lock()).finish()
    }
}
