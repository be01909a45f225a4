//! Rate limiter for the options-stats provider.
//!
//! One read bucket — the engine never writes to the provider.

use governor::{Quota, RateLimiter as GovLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct RateLimiter {
    limiter: Arc<
        GovLimiter<
            governor::state::NotKeyed,
            governor::state::InMemoryState,
            governor::clock::DefaultClock,
        >,
    >,
}

impl RateLimiter {
    /// Create with a per-second request budget. `requests_per_sec` must be
    /// non-zero; callers clamp config values up to 1.
    pub fn new(requests_per_sec: u32) -> Self {
        let quota = Quota::per_second(
            NonZeroU32::new(requests_per_sec).unwrap_or(NonZeroU32::MIN),
        );
        Self {
            limiter: Arc::new(GovLimiter::direct(quota)),
        }
    }

    /// Wait until a request slot is available.
    pub async fn wait(&self) {
        self.limiter.until_ready().await;
    }

    /// Try to acquire a slot without waiting. Returns true if acquired.
    pub fn try_acquire(&self) -> bool {
        self.limiter.check().is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn burst_drains_the_bucket() {
        let limiter = RateLimiter::new(2);
        assert!(limiter.try_acquire());
        assert!(limiter.try_acquire());
        assert!(!limiter.try_acquire());
    }
}
