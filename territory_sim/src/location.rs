//! Scripted location feed replaying walker fixes on the virtual clock.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use territory_env::{EnvError, LocationSource, RawFix, TrackingContext};

use crate::context::SimContext;

/// What the feed has for the current virtual instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Feed {
    /// A fix stamped at or before now
    Due(RawFix),
    /// Next fix lies in the future
    Waiting,
    /// Script exhausted and the linger period has passed
    Closed,
}

/// Delivers pre-generated fixes once virtual time reaches their timestamp.
///
/// After the last fix the feed stays open for `linger` so that a tick can
/// still sample it, then reports closed.
pub struct SimLocationSource {
    ctx: SimContext,
    pending: Mutex<VecDeque<RawFix>>,
    close_at: Duration,
}

impl SimLocationSource {
    pub fn new(ctx: SimContext, fixes: Vec<RawFix>) -> Self {
        let close_at = fixes.last().map(|f| f.timestamp).unwrap_or_default();
        Self {
            ctx,
            pending: Mutex::new(fixes.into()),
            close_at,
        }
    }

    /// Keeps the feed open for `linger` after the final fix.
    pub fn with_linger(mut self, linger: Duration) -> Self {
        self.close_at += linger;
        self
    }

    /// Number of fixes not yet delivered.
    pub fn remaining(&self) -> usize {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Pops the next fix if it is due.
    pub fn poll_feed(&self) -> Feed {
        let now = self.ctx.now();
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        match pending.front().copied() {
            Some(fix) if fix.timestamp <= now => {
                pending.pop_front();
                Feed::Due(fix)
            }
            Some(_) => Feed::Waiting,
            None if now >= self.close_at => Feed::Closed,
            None => Feed::Waiting,
        }
    }
}

#[async_trait]
impl LocationSource for SimLocationSource {
    async fn next_fix(&self) -> Result<RawFix, EnvError> {
        loop {
            match self.poll_feed() {
                Feed::Due(fix) => return Ok(fix),
                Feed::Closed => return Err(EnvError::SourceClosed),
                // Let the tick branch move the clock
                Feed::Waiting => tokio::task::yield_now().await,
            }
        }
    }

    fn name(&self) -> &str {
        "sim-walker"
    }
}
