//! Rate-limit retry schedule

use async_trait::async_trait;
use rand::Rng;
use std::time::Duration;

/// Exponential backoff with jitter, applied only to rate-limit responses.
///
/// Attempt `n` (zero-based) that gets rate limited waits
/// `backoff_factor^n + uniform(0, 1)` seconds before attempt `n + 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_retries: u32,
    backoff_factor: u32,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, backoff_factor: u32) -> Self {
        Self {
            max_retries,
            backoff_factor,
        }
    }

    /// Total attempts, the first one included.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries + 1
    }

    /// Whether a rate-limited `attempt` may be followed by another one.
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_retries
    }

    /// Backoff before the attempt following `attempt`, without jitter.
    pub fn base_delay(&self, attempt: u32) -> Duration {
        Duration::from_secs_f64(f64::from(self.backoff_factor).powi(attempt as i32))
    }

    /// Backoff before the attempt following `attempt`, with jitter.
    pub fn delay(&self, attempt: u32) -> Duration {
        let jitter: f64 = rand::rng().random_range(0.0..1.0);
        self.base_delay(attempt) + Duration::from_secs_f64(jitter)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, 2)
    }
}

/// Suspends the caller between attempts.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Sleeps on the tokio timer.
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
