//! Outbound request rate limiting.
//!
//! The E-utilities terms of service cap unauthenticated clients at 3
//! requests per second. A single [`RateLimiter`] is shared (via `Arc`) by
//! every component that talks to the same provider, so overlapping calls
//! serialize through one "time of last call" regardless of which code path
//! issued them.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

/// Time source abstraction so tests can drive the limiter with a manual
/// clock instead of wall-clock sleeps.
#[async_trait::async_trait]
pub trait Clock: Send + Sync {
    /// Current instant.
    fn now(&self) -> Instant;

    /// Sleep for the given duration.
    async fn sleep(&self, duration: Duration);
}

/// Default clock backed by the tokio runtime.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

#[async_trait::async_trait]
impl Clock for TokioClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Enforces a minimum interval between acquisitions.
///
/// `acquire` measures from "now" on every call rather than from a fixed
/// schedule, so repeated calls accumulate no drift. Callers waiting on the
/// internal lock are served in FIFO order.
pub struct RateLimiter {
    min_interval: Duration,
    last_call: Mutex<Option<Instant>>,
    clock: Arc<dyn Clock>,
}

impl RateLimiter {
    /// Create a limiter with the given minimum inter-call interval.
    #[must_use]
    pub fn new(min_interval: Duration) -> Self {
        Self::with_clock(min_interval, Arc::new(TokioClock))
    }

    /// Create a limiter with an injected clock.
    #[must_use]
    pub fn with_clock(min_interval: Duration, clock: Arc<dyn Clock>) -> Self {
        Self { min_interval, last_call: Mutex::new(None), clock }
    }

    /// The configured minimum interval.
    #[must_use]
    pub const fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Block until at least the minimum interval has elapsed since the
    /// previous acquisition, then record this one.
    ///
    /// The lock is held across the sleep so concurrent callers cannot slip
    /// inside another caller's interval.
    pub async fn acquire(&self) {
        let mut last = self.last_call.lock().await;

        if let Some(prev) = *last {
            let elapsed = self.clock.now().saturating_duration_since(prev);
            if elapsed < self.min_interval {
                self.clock.sleep(self.min_interval - elapsed).await;
            }
        }

        *last = Some(self.clock.now());
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter").field("min_interval", &self.min_interval).finish()
    }
}
