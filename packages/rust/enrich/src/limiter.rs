//! Inter-call pacing for the geolocation provider.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::{Instant, sleep};

/// Enforces a minimum delay between consecutive calls.
///
/// The lock is held across the sleep, so concurrent callers are serialized
/// and the pacing guarantee stays global if lookups are ever parallelized.
#[derive(Debug)]
pub struct IntervalLimiter {
    min_interval: Duration,
    last_call: Mutex<Option<Instant>>,
}

impl IntervalLimiter {
    /// Limiter with the given minimum inter-call delay.
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_call: Mutex::new(None),
        }
    }

    /// Wait until the minimum interval since the previous call has elapsed,
    /// then claim the current slot.
    pub async fn wait(&self) {
        let mut last = self.last_call.lock().await;
        if let Some(prev) = *last {
            let elapsed = prev.elapsed();
            if elapsed < self.min_interval {
                sleep(self.min_interval - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn enforces_minimum_interval() {
        let limiter = IntervalLimiter::new(Duration::from_millis(500));

        let start = Instant::now();
        limiter.wait().await;
        limiter.wait().await;
        limiter.wait().await;

        // First call is free; the next two each wait the full interval.
        assert!(start.elapsed() >= Duration::from_millis(1000));
    }

    #[tokio::test(start_paused = true)]
    async fn elapsed_time_counts_toward_the_interval() {
        let limiter = IntervalLimiter::new(Duration::from_millis(500));
        limiter.wait().await;

        tokio::time::sleep(Duration::from_millis(400)).await;
        let before = Instant::now();
        limiter.wait().await;
        assert!(before.elapsed() >= Duration::from_millis(100));
        assert!(before.elapsed() < Duration::from_millis(500));
    }

    #[tokio::test]
    async fn zero_interval_never_waits() {
        let limiter = IntervalLimiter::new(Duration::ZERO);
        limiter.wait().await;
        limiter.wait().await;
    }
}
