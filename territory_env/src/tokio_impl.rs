//! Production implementations backed by Tokio.

use crate::error::EnvError;
use crate::location::LocationSource;
use crate::types::RawFix;
use crate::TrackingContext;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};
use tokio::sync::{watch, Mutex};

/// Production context backed by Tokio and the system clock.
pub struct TokioContext {
    /// Start time for monotonic duration calculations
    start: Instant,
}

impl TokioContext {
    /// Creates a new TokioContext.
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Creates an Arc-wrapped context for sharing across tasks.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }
}

impl Default for TokioContext {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TrackingContext for TokioContext {
    fn now(&self) -> Duration {
        self.start.elapsed()
    }

    fn system_time(&self) -> SystemTime {
        SystemTime::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }

    fn spawn<F>(&self, name: &str, future: F)
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        tracing::debug!(task = name, "spawning task");
        tokio::spawn(future);
    }

    fn seed(&self) -> u64 {
        // Production is not seeded
        0
    }
}

/// What the platform callback last reported.
#[derive(Debug, Clone)]
enum LocationEvent {
    Fix(RawFix),
    Unavailable(String),
}

/// Creates a connected fix sender / location source pair.
///
/// The channel only keeps the most recent fix: if the platform delivers
/// several fixes between two reads, the older ones are superseded.
pub fn location_channel() -> (FixSender, ChannelLocationSource) {
    let (tx, rx) = watch::channel(None);
    (
        FixSender { tx },
        ChannelLocationSource {
            rx: Mutex::new(rx),
        },
    )
}

/// Host-side handle used from the platform location callback.
///
/// `push` is synchronous so it can be called from non-async callbacks.
#[derive(Debug)]
pub struct FixSender {
    tx: watch::Sender<Option<LocationEvent>>,
}

impl FixSender {
    /// Publishes a fix, replacing any unread one.
    pub fn push(&self, fix: RawFix) -> Result<(), EnvError> {
        self.send(LocationEvent::Fix(fix))
    }

    /// Reports that the provider cannot deliver fixes right now.
    pub fn report_unavailable(&self, reason: impl Into<String>) -> Result<(), EnvError> {
        self.send(LocationEvent::Unavailable(reason.into()))
    }

    fn send(&self, event: LocationEvent) -> Result<(), EnvError> {
        self.tx.send(Some(event)).map_err(|_| EnvError::SourceClosed)
    }

    /// Returns true once the receiving source has been dropped.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Location source fed by a [`FixSender`].
pub struct ChannelLocationSource {
    rx: Mutex<watch::Receiver<Option<LocationEvent>>>,
}

#[async_trait]
impl LocationSource for ChannelLocationSource {
    async fn next_fix(&self) -> Result<RawFix, EnvError> {
        let mut rx = self.rx.lock().await;
        loop {
            rx.changed().await.map_err(|_| EnvError::SourceClosed)?;
            let event = rx.borrow_and_update().clone();
            match event {
                Some(LocationEvent::Fix(fix)) => return Ok(fix),
                Some(LocationEvent::Unavailable(reason)) => {
                    return Err(EnvError::unavailable(reason))
                }
                None => continue,
            }
        }
    }

    fn name(&self) -> &str {
        "channel"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_tokio_context_time() {
        let ctx = TokioContext::new();
        let t1 = ctx.now();
        ctx.sleep(Duration::from_millis(10)).await;
        let t2 = ctx.now();

        assert!(t2 > t1);
        assert!(t2 - t1 >= Duration::from_millis(10));
    }

    #[test]
    fn test_tokio_context_seed() {
        let ctx = TokioContext::new();
        assert_eq!(ctx.seed(), 0);
    }

    #[tokio::test]
    async fn test_channel_delivers_latest_fix() {
        let (sender, source) = location_channel();

        sender.push(RawFix::new(1.0, 1.0, Duration::from_secs(1))).unwrap();
        sender.push(RawFix::new(2.0, 2.0, Duration::from_secs(2))).unwrap();

        let fix = source.next_fix().await.unwrap();
        assert_eq!(fix.latitude, 2.0);
        assert_eq!(fix.timestamp, Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_channel_closes_when_sender_dropped() {
        let (sender, source) = location_channel();
        drop(sender);

        assert!(matches!(source.next_fix().await, Err(EnvError::SourceClosed)));
    }

    #[tokio::test]
    async fn test_unavailable_reported_then_fix_delivered() {
        let (sender, source) = location_channel();

        sender.report_unavailable("no signal").unwrap();
        let err = source.next_fix().await.unwrap_err();
        assert!(matches!(err, EnvError::LocationUnavailable(ref reason) if reason == "no signal"));

        sender.push(RawFix::new(3.0, 3.0, Duration::from_secs(3))).unwrap();
        assert_eq!(source.next_fix().await.unwrap().latitude, 3.0);
    }

    #[test]
    fn test_push_fails_after_source_dropped() {
        let (sender, source) = location_channel();
        drop(source);

        assert!(sender.is_closed());
        assert!(matches!(
            sender.push(RawFix::new(0.0, 0.0, Duration::ZERO)),
            Err(EnvError::SourceClosed)
        ));
    }
}
