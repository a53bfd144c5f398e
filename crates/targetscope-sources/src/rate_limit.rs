use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Default spacing between requests to one provider.
pub const DEFAULT_REQUEST_INTERVAL: Duration = Duration::from_millis(100);

/// Enforces a minimum interval between consecutive requests to one provider.
///
/// One instance is shared (`Arc<RateLimiter>`) by every task talking to the
/// same provider; waiting callers are served in lock order.
#[derive(Debug)]
pub struct RateLimiter {
    interval: Duration,
    next_slot: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            next_slot: Mutex::new(None),
        }
    }

    /// Shared limiter with the default interval.
    pub fn shared_default() -> Arc<Self> {
        Arc::new(Self::new(DEFAULT_REQUEST_INTERVAL))
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Wait until the next request slot is free, then claim it.
    pub async fn acquire(&self) {
        let mut next = self.next_slot.lock().await;
        let now = Instant::now();
        let slot = match *next {
            Some(t) if t > now => {
                tokio::time::sleep_until(t).await;
                t
            }
            _ => now,
        };
        *next = Some(slot + self.interval);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_requests_are_spaced() {
        let limiter = Arc::new(RateLimiter::new(Duration::from_millis(100)));
        let start = Instant::now();

        let tasks: Vec<_> = (0..4)
            .map(|_| {
                let l = limiter.clone();
                tokio::spawn(async move {
                    l.acquire().await;
                    Instant::now()
                })
            })
            .collect();

        let mut times = Vec::new();
        for t in tasks {
            times.push(t.await.unwrap());
        }
        times.sort();
        assert!(times[3] - start >= Duration::from_millis(300));
        for pair in times.windows(2) {
            assert!(pair[1] - pair[0] >= Duration::from_millis(100));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_request_is_immediate() {
        let limiter = RateLimiter::new(Duration::from_secs(5));
        let start = Instant::now();
        limiter.acquire().await;
        assert!(Instant::now() - start < Duration::from_millis(1));
    }
}
