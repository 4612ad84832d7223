//! Process-wide request spacing
//!
//! Every outbound request, from the category fetcher and from all detail
//! workers, passes through one [`RateLimiter`]. The limiter guarantees a
//! minimum delay between the start of any two requests.

use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Enforces a minimum delay between consecutive requests
///
/// Shared through `Arc`. The lock is held while waiting, so concurrent
/// callers are released one at a time, each `delay` after the previous one.
#[derive(Debug)]
pub struct RateLimiter {
    delay: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            last_request: Mutex::new(None),
        }
    }

    /// A limiter that never waits
    pub fn disabled() -> Self {
        Self::new(Duration::ZERO)
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Waits until a request may be issued and records it
    ///
    /// The first request is never delayed.
    pub async fn acquire(&self) {
        if self.delay.is_zero() {
            return;
        }

        let mut last = self.last_request.lock().await;
        if let Some(previous) = *last {
            let ready_at = previous + self.delay;
            let now = Instant::now();
            if ready_at > now {
                tracing::trace!("Rate limiter waiting {:?}", ready_at - now);
                tokio::time::sleep_until(ready_at).await;
            }
        }
        *last = Some(Instant::now());
    }
}
