use std::time::Duration;
use tokio::time::Instant;

/// Enforces a minimum interval between outbound requests issued by one
/// client instance.
///
/// The `acquire` suspension is the only blocking point in the whole pipeline:
/// a caller that arrives before the interval has elapsed sleeps for the
/// remainder. The last-request instant is the single piece of mutable state
/// the client carries.
#[derive(Debug)]
pub struct RateLimiter {
    min_interval: Duration,
    last_request: Option<Instant>,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_request: None,
        }
    }

    /// Suspends until at least `min_interval` has elapsed since the previous
    /// call, then records the new request time.
    pub async fn acquire(&mut self) {
        if let Some(last) = self.last_request {
            let elapsed = last.elapsed();
            if elapsed < self.min_interval {
                let wait = self.min_interval - elapsed;
                tracing::debug!(wait_ms = wait.as_millis() as u64, "Rate limiting request");
                tokio::time::sleep(wait).await;
            }
        }
        self.last_request = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn first_acquire_does_not_wait() {
        let mut limiter = RateLimiter::new(Duration::from_secs(6));
        let before = Instant::now();
        limiter.acquire().await;
        assert_eq!(Instant::now(), before);
    }

    #[tokio::test(start_paused = true)]
    async fn consecutive_acquires_are_separated_by_min_interval() {
        let mut limiter = RateLimiter::new(Duration::from_secs(6));

        limiter.acquire().await;
        let first = Instant::now();
        limiter.acquire().await;
        let second = Instant::now();

        assert!(second - first >= Duration::from_secs(6));
    }

    #[tokio::test(start_paused = true)]
    async fn elapsed_interval_is_not_slept_twice() {
        let mut limiter = RateLimiter::new(Duration::from_secs(6));

        limiter.acquire().await;
        tokio::time::sleep(Duration::from_secs(10)).await;

        let before = Instant::now();
        limiter.acquire().await;
        // The interval already elapsed on its own, so no extra sleep.
        assert_eq!(Instant::now(), before);
    }
}
