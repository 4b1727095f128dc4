//! Core environment context trait for territory tracking sessions.

use async_trait::async_trait;
use std::future::Future;
use std::time::{Duration, SystemTime};

/// The central interface for Environment Interaction.
///
/// This trait abstracts the "real world" clock so that the tracking
/// engine can be driven in both production (tokio) and simulation
/// (virtual clock) environments.
///
/// # Implementations
///
/// - **Production**: `TokioContext` - wraps `tokio::time`
/// - **Simulation**: `SimContext` - virtual clock advanced by `sleep`
///
/// # Determinism
///
/// The engine itself owns no timer. The periodic sampling tick is produced
/// by calling [`TrackingContext::sleep`] with the configured tick interval,
/// so a simulated context yields a fully reproducible tick sequence.
#[async_trait]
pub trait TrackingContext: Send + Sync + 'static {
    /// Returns the current monotonic time since context creation.
    ///
    /// Location fixes produced by a host are usually stamped with this
    /// value so that fix timestamps and ticks share one time base.
    fn now(&self) -> Duration;

    /// Returns the wall-clock time (for logs and exported snapshots).
    fn system_time(&self) -> SystemTime;

    /// Suspends execution for the given duration.
    ///
    /// In production: wraps `tokio::time::sleep`
    /// In simulation: advances virtual clock
    async fn sleep(&self, duration: Duration);

    /// Spawns a background task.
    fn spawn<F>(&self, name: &str, future: F)
    where
        F: Future<Output = ()> + Send + 'static;

    /// Returns the context's seed (for logging/debugging).
    ///
    /// In production, returns 0 (not seeded).
    /// In simulation, returns the master seed.
    fn seed(&self) -> u64;
}
