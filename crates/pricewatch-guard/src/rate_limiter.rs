//! Sliding-window request limiter with escalating blocks.
//!
//! State is in-memory and process-local. Each caller id owns one shard
//! entry, so callers never contend with each other; concurrent requests
//! from the same id serialize on that entry.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use dashmap::DashMap;

use crate::error::RateLimitError;

pub const DEFAULT_BLOCK_DURATION: Duration = Duration::from_secs(300);

#[derive(Debug, Default)]
struct CallerState {
    /// Accepted request times inside the trailing window, oldest first.
    window: VecDeque<Instant>,
    blocked_until: Option<Instant>,
}

#[derive(Debug)]
pub struct SlidingWindowLimiter {
    callers: DashMap<String, CallerState>,
    block_duration: Duration,
}

impl Default for SlidingWindowLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_BLOCK_DURATION)
    }
}

impl SlidingWindowLimiter {
    /// `block_duration` is applied when a check with `block_on_violation`
    /// denies a caller.
    #[must_use]
    pub fn new(block_duration: Duration) -> Self {
        Self {
            callers: DashMap::new(),
            block_duration,
        }
    }

    /// Records a request for `caller_id` if it fits in the window.
    ///
    /// # Errors
    ///
    /// Returns [`RateLimitError::Blocked`] while a block is active and
    /// [`RateLimitError::Exceeded`] when `max_requests` requests were already
    /// accepted within the trailing `window`.
    pub fn check_rate_limit(
        &self,
        caller_id: &str,
        max_requests: usize,
        window: Duration,
        block_on_violation: bool,
    ) -> Result<(), RateLimitError> {
        self.check_rate_limit_at(
            caller_id,
            max_requests,
            window,
            block_on_violation,
            Instant::now(),
        )
    }

    /// [`SlidingWindowLimiter::check_rate_limit`] evaluated at `now`.
    ///
    /// # Errors
    ///
    /// Same as [`SlidingWindowLimiter::check_rate_limit`].
    pub fn check_rate_limit_at(
        &self,
        caller_id: &str,
        max_requests: usize,
        window: Duration,
        block_on_violation: bool,
        now: Instant,
    ) -> Result<(), RateLimitError> {
        let mut state = self.callers.entry(caller_id.to_string()).or_default();

        let blocked_until = state.blocked_until;
        if let Some(until) = blocked_until {
            if now < until {
                return Err(RateLimitError::Blocked {
                    remaining_secs: ceil_secs(until - now),
                });
            }
            state.blocked_until = None;
        }

        while state
            .window
            .front()
            .is_some_and(|t| now.saturating_duration_since(*t) >= window)
        {
            state.window.pop_front();
        }

        if state.window.len() >= max_requests {
            tracing::warn!(
                caller_id,
                requests = state.window.len(),
                window_secs = window.as_secs(),
                "rate limit exceeded"
            );
            if block_on_violation {
                let until = now + self.block_duration;
                state.blocked_until = Some(state.blocked_until.map_or(until, |b| b.max(until)));
                tracing::warn!(
                    caller_id,
                    block_secs = self.block_duration.as_secs(),
                    "caller blocked after rate limit violation"
                );
            }
            return Err(RateLimitError::Exceeded {
                max_requests,
                window_secs: window.as_secs(),
            });
        }

        state.window.push_back(now);
        Ok(())
    }

    #[must_use]
    pub fn is_blocked(&self, caller_id: &str) -> bool {
        self.is_blocked_at(caller_id, Instant::now())
    }

    /// Whether `caller_id` is blocked at `now`. An expired block is cleared
    /// as a side effect.
    #[must_use]
    pub fn is_blocked_at(&self, caller_id: &str, now: Instant) -> bool {
        let Some(mut state) = self.callers.get_mut(caller_id) else {
            return false;
        };
        let blocked_until = state.blocked_until;
        match blocked_until {
            Some(until) if now < until => true,
            Some(_) => {
                state.blocked_until = None;
                false
            }
            None => false,
        }
    }

    pub fn block_client(&self, caller_id: &str, duration: Duration) {
        self.block_client_at(caller_id, duration, Instant::now());
    }

    /// Blocks `caller_id` until `now + duration`. An existing longer block
    /// is kept.
    pub fn block_client_at(&self, caller_id: &str, duration: Duration, now: Instant) {
        let until = now + duration;
        let mut state = self.callers.entry(caller_id.to_string()).or_default();
        state.blocked_until = Some(state.blocked_until.map_or(until, |b| b.max(until)));
        tracing::warn!(
            caller_id,
            block_secs = duration.as_secs(),
            "caller blocked"
        );
    }

    /// Drops callers with no active block and no request newer than
    /// `max_window`. Returns how many entries were removed.
    pub fn purge_idle_at(&self, max_window: Duration, now: Instant) -> usize {
        let before = self.callers.len();
        self.callers.retain(|_, state| {
            let blocked = state.blocked_until.is_some_and(|until| now < until);
            let recent = state
                .window
                .back()
                .is_some_and(|t| now.saturating_duration_since(*t) < max_window);
            blocked || recent
        });
        before.saturating_sub(self.callers.len())
    }

    #[must_use]
    pub fn tracked_callers(&self) -> usize {
        self.callers.len()
    }
}

fn ceil_secs(d: Duration) -> u64 {
    d.as_secs() + u64::from(d.subsec_nanos() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINUTE: Duration = Duration::from_secs(60);

    #[test]
    fn allows_up_to_max_then_denies() {
        let limiter = SlidingWindowLimiter::default();
        let now = Instant::now();
        for i in 0..10 {
            assert!(
                limiter
                    .check_rate_limit_at("1.2.3.4:/run", 10, MINUTE, false, now + Duration::from_millis(i))
                    .is_ok(),
                "request {i} should be allowed"
            );
        }
        let err = limiter
            .check_rate_limit_at("1.2.3.4:/run", 10, MINUTE, false, now + Duration::from_secs(1))
            .unwrap_err();
        assert!(err.to_string().contains("rate limit"));
        assert!(matches!(err, RateLimitError::Exceeded { max_requests: 10, window_secs: 60 }));
    }

    #[test]
    fn window_rolls_over() {
        let limiter = SlidingWindowLimiter::default();
        let now = Instant::now();
        for _ in 0..10 {
            limiter.check_rate_limit_at("c", 10, MINUTE, false, now).unwrap();
        }
        assert!(limiter.check_rate_limit_at("c", 10, MINUTE, false, now).is_err());
        assert!(limiter
            .check_rate_limit_at("c", 10, MINUTE, false, now + Duration::from_secs(61))
            .is_ok());
    }

    #[test]
    fn window_slides_instead_of_resetting() {
        let limiter = SlidingWindowLimiter::default();
        let t0 = Instant::now();
        limiter.check_rate_limit_at("c", 2, MINUTE, false, t0).unwrap();
        limiter
            .check_rate_limit_at("c", 2, MINUTE, false, t0 + Duration::from_secs(30))
            .unwrap();
        // First request has aged out, second is still inside the window.
        let t1 = t0 + Duration::from_secs(60);
        limiter.check_rate_limit_at("c", 2, MINUTE, false, t1).unwrap();
        assert!(limiter
            .check_rate_limit_at("c", 2, MINUTE, false, t1 + Duration::from_secs(1))
            .is_err());
    }

    #[test]
    fn denied_requests_are_not_recorded() {
        let limiter = SlidingWindowLimiter::default();
        let t0 = Instant::now();
        limiter.check_rate_limit_at("c", 1, MINUTE, false, t0).unwrap();
        for s in 1..30 {
            let _ = limiter.check_rate_limit_at("c", 1, MINUTE, false, t0 + Duration::from_secs(s));
        }
        assert!(limiter
            .check_rate_limit_at("c", 1, MINUTE, false, t0 + Duration::from_secs(60))
            .is_ok());
    }

    #[test]
    fn violation_with_blocking_denies_until_block_expires() {
        let limiter = SlidingWindowLimiter::new(Duration::from_secs(300));
        let t0 = Instant::now();
        limiter.check_rate_limit_at("c", 1, MINUTE, true, t0).unwrap();
        assert!(matches!(
            limiter.check_rate_limit_at("c", 1, MINUTE, true, t0),
            Err(RateLimitError::Exceeded { .. })
        ));

        // Window has rolled over, but the block still applies.
        let err = limiter
            .check_rate_limit_at("c", 1, MINUTE, true, t0 + Duration::from_secs(120))
            .unwrap_err();
        assert_eq!(err, RateLimitError::Blocked { remaining_secs: 180 });
        assert!(err.to_string().contains("blocked for 180 more seconds"));

        assert!(limiter
            .check_rate_limit_at("c", 1, MINUTE, true, t0 + Duration::from_secs(301))
            .is_ok());
    }

    #[test]
    fn block_client_blocks_until_duration_elapses() {
        let limiter = SlidingWindowLimiter::default();
        let t0 = Instant::now();
        limiter.block_client_at("c", Duration::from_secs(30), t0);
        assert!(limiter.is_blocked_at("c", t0));
        assert!(limiter.is_blocked_at("c", t0 + Duration::from_secs(29)));
        assert!(!limiter.is_blocked_at("c", t0 + Duration::from_secs(30)));
        // Cleared on expiry; asking again has no further effect.
        assert!(!limiter.is_blocked_at("c", t0 + Duration::from_secs(31)));
        assert!(limiter
            .check_rate_limit_at("c", 5, MINUTE, true, t0 + Duration::from_secs(31))
            .is_ok());
    }

    #[test]
    fn block_client_keeps_the_longer_block() {
        let limiter = SlidingWindowLimiter::default();
        let t0 = Instant::now();
        limiter.block_client_at("c", Duration::from_secs(600), t0);
        limiter.block_client_at("c", Duration::from_secs(10), t0);
        assert!(limiter.is_blocked_at("c", t0 + Duration::from_secs(300)));
    }

    #[test]
    fn unknown_caller_is_not_blocked() {
        let limiter = SlidingWindowLimiter::default();
        assert!(!limiter.is_blocked("nobody"));
        assert_eq!(limiter.tracked_callers(), 0);
    }

    #[test]
    fn callers_are_independent() {
        let limiter = SlidingWindowLimiter::default();
        let now = Instant::now();
        limiter.check_rate_limit_at("a", 1, MINUTE, true, now).unwrap();
        assert!(limiter.check_rate_limit_at("a", 1, MINUTE, true, now).is_err());
        assert!(limiter.check_rate_limit_at("b", 1, MINUTE, true, now).is_ok());
    }

    #[test]
    fn purge_idle_drops_only_stale_unblocked_callers() {
        let limiter = SlidingWindowLimiter::default();
        let t0 = Instant::now();
        limiter.check_rate_limit_at("stale", 5, MINUTE, false, t0).unwrap();
        limiter.block_client_at("blocked", Duration::from_secs(600), t0);
        limiter
            .check_rate_limit_at("fresh", 5, MINUTE, false, t0 + Duration::from_secs(100))
            .unwrap();
        let removed = limiter.purge_idle_at(MINUTE, t0 + Duration::from_secs(120));
        assert_eq!(removed, 1);
        assert_eq!(limiter.tracked_callers(), 2);
    }

    #[test]
    fn concurrent_checks_never_exceed_limit() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::sync::Arc;

        let limiter = Arc::new(SlidingWindowLimiter::default());
        let allowed = Arc::new(AtomicUsize::new(0));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                let allowed = Arc::clone(&allowed);
                std::thread::spawn(move || {
                    for _ in 0..50 {
                        if limiter.check_rate_limit("shared", 25, MINUTE, false).is_ok() {
                            allowed.fetch_add(1, Ordering::SeqCst);
                        }
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(allowed.load(Ordering::SeqCst), 25);
    }
}
