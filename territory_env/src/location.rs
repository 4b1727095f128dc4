//! Location source abstraction for territory tracking sessions.

use async_trait::async_trait;
use crate::error::EnvError;
use crate::types::RawFix;

/// Abstraction for the push-driven location feed.
///
/// # Implementations
///
/// - **Production**: `ChannelLocationSource`, fed by the host's platform
///   location callback through a [`crate::FixSender`]
/// - **Simulation**: a scripted walker replaying noisy fixes
///
/// # Fix Flow
///
/// ```text
/// Platform GPS             Source                   Session
///   |                        |                         |
///   |-- fix (irregular) ---->|                         |
///   |                        |-- next_fix() ---------->|-- latest fix slot
///   |                        |                         |-- tick (fixed cadence)
/// ```
///
/// The engine never requests locations itself. Sources only deliver what
/// the platform produced; permission prompts and sensor configuration are
/// the host's concern.
#[async_trait]
pub trait LocationSource: Send + Sync + 'static {
    /// Waits for the next fix.
    ///
    /// # Returns
    /// * `Ok(fix)` - A new fix was delivered
    /// * `Err(EnvError::LocationUnavailable)` - The provider lost the signal
    ///   or permission; later fixes may still arrive
    /// * `Err(EnvError::SourceClosed)` - The host stopped location updates
    async fn next_fix(&self) -> Result<RawFix, EnvError>;

    /// Returns a short name for logging.
    fn name(&self) -> &str {
        "location-source"
    }
}
