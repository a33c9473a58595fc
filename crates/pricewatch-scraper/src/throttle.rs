use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

/// Enforces a minimum gap between consecutive requests from one owner.
///
/// Each fetcher owns its own throttle; there is no process-wide gate.
#[derive(Debug)]
pub(crate) struct RequestThrottle {
    min_interval: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl RequestThrottle {
    pub(crate) fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_request: Mutex::new(None),
        }
    }

    /// Waits until at least `min_interval` has passed since the previous
    /// slot was handed out, then claims the slot.
    pub(crate) async fn wait_for_slot(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < self.min_interval {
                tokio::time::sleep(self.min_interval.saturating_sub(elapsed)).await;
            }
        }
        *last = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn first_request_is_not_delayed() {
        let throttle = RequestThrottle::new(Duration::from_secs(2));
        let start = Instant::now();
        throttle.wait_for_slot().await;
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn back_to_back_requests_are_spaced() {
        let throttle = RequestThrottle::new(Duration::from_secs(2));
        let start = Instant::now();
        throttle.wait_for_slot().await;
        throttle.wait_for_slot().await;
        throttle.wait_for_slot().await;
        assert_eq!(start.elapsed(), Duration::from_secs(4));
    }

    #[tokio::test(start_paused = true)]
    async fn only_the_remaining_gap_is_slept() {
        let throttle = RequestThrottle::new(Duration::from_secs(2));
        throttle.wait_for_slot().await;
        tokio::time::advance(Duration::from_millis(1500)).await;
        let before = Instant::now();
        throttle.wait_for_slot().await;
        assert_eq!(before.elapsed(), Duration::from_millis(500));
    }

    #[tokio::test(start_paused = true)]
    async fn separate_throttles_do_not_share_state() {
        let a = RequestThrottle::new(Duration::from_secs(2));
        let b = RequestThrottle::new(Duration::from_secs(2));
        let start = Instant::now();
        a.wait_for_slot().await;
        b.wait_for_slot().await;
        assert_eq!(start.elapsed(), Duration::ZERO);
    }
}
