use std::future::Future;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::{Interval, MissedTickBehavior, interval};

/// One pulse shared by all workers: however large the pool, at most one worker starts a
/// fetch cycle per period.
#[derive(Debug)]
pub struct RateLimiter {
    pulse: Option<Mutex<Interval>>,
}

impl RateLimiter {
    /// A zero period disables throttling. Must be called from within a tokio runtime.
    pub fn new(period: Duration) -> Self {
        let pulse = (!period.is_zero()).then(|| {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            Mutex::new(ticker)
        });
        Self { pulse }
    }

    /// Waits for the next pulse, then runs `next` while still holding the pulse, so at
    /// most one `next` starts per period no matter how many callers are queued.
    pub async fn throttle<T>(&self, next: impl Future<Output = T>) -> T {
        match &self.pulse {
            Some(pulse) => {
                let mut ticker = pulse.lock().await;
                ticker.tick().await;
                next.await
            }
            None => next.await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn test_pulses_are_spaced_by_period() {
        let limiter = RateLimiter::new(Duration::from_millis(100));
        let start = Instant::now();

        for _ in 0..4 {
            limiter.throttle(async {}).await;
        }

        // The first pulse fires immediately.
        assert!(start.elapsed() >= Duration::from_millis(300));
    }

    #[tokio::test(start_paused = true)]
    async fn test_throttle_spaces_out_work() {
        let limiter = Arc::new(RateLimiter::new(Duration::from_millis(100)));
        let start = Instant::now();

        let tasks: Vec<_> = (0..3)
            .map(|_| {
                let limiter = limiter.clone();
                tokio::spawn(async move { limiter.throttle(async { Instant::now() }).await })
            })
            .collect();

        let mut started = Vec::new();
        for task in tasks {
            started.push(task.await.unwrap() - start);
        }
        started.sort();

        assert!(started[0] < Duration::from_millis(100));
        assert!(started[1] >= Duration::from_millis(100));
        assert!(started[2] >= Duration::from_millis(200));
    }

    #[tokio::test(start_paused = true)]
    async fn test_pulse_is_held_while_work_waits() {
        let limiter = Arc::new(RateLimiter::new(Duration::from_millis(10)));
        let start = Instant::now();

        let slow = {
            let limiter = limiter.clone();
            tokio::spawn(async move {
                limiter
                    .throttle(tokio::time::sleep(Duration::from_millis(500)))
                    .await
            })
        };
        tokio::time::sleep(Duration::from_millis(1)).await;
        let next = limiter.throttle(async { Instant::now() }).await;

        assert!(next - start >= Duration::from_millis(500));
        slow.await.unwrap();
    }

    #[tokio::test]
    async fn test_zero_period_is_unlimited() {
        let limiter = RateLimiter::new(Duration::ZERO);
        for _ in 0..1_000 {
            limiter.throttle(async {}).await;
        }
    }
}
