//! Repeated-failure detector. Raises an alert; it never blocks by itself.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;

/// Counter store shared by detectors. `incr` bumps the counter for `key`
/// and restarts its expiry at `ttl`; an expired counter starts again at 1.
pub trait FailureCache: Send + Sync {
    fn incr(&self, key: &str, ttl: Duration) -> u64;

    /// Drops counters that expired before `now`. Stores with their own
    /// expiry can keep the default.
    fn purge_expired_at(&self, _now: Instant) -> usize {
        0
    }
}

#[derive(Debug, Default)]
pub struct InMemoryFailureCache {
    entries: DashMap<String, (u64, Instant)>,
}

impl InMemoryFailureCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn incr_at(&self, key: &str, ttl: Duration, now: Instant) -> u64 {
        let mut entry = self.entries.entry(key.to_string()).or_insert((0, now));
        let (count, expires_at) = *entry;
        let count = if now >= expires_at && count > 0 { 1 } else { count + 1 };
        *entry = (count, now + ttl);
        count
    }
}

impl FailureCache for InMemoryFailureCache {
    fn incr(&self, key: &str, ttl: Duration) -> u64 {
        self.incr_at(key, ttl, Instant::now())
    }

    fn purge_expired_at(&self, now: Instant) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, (_, expires_at)| *expires_at > now);
        before.saturating_sub(self.entries.len())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreatLevel {
    Normal,
    Critical,
}

pub struct AttackDetector {
    cache: Arc<dyn FailureCache>,
    threshold: u64,
    window: Duration,
}

impl std::fmt::Debug for AttackDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttackDetector")
            .field("threshold", &self.threshold)
            .field("window", &self.window)
            .finish_non_exhaustive()
    }
}

impl AttackDetector {
    /// Alerts once failures from one IP within `window` exceed `threshold`.
    #[must_use]
    pub fn new(cache: Arc<dyn FailureCache>, threshold: u64, window: Duration) -> Self {
        Self {
            cache,
            threshold,
            window,
        }
    }

    pub fn purge_expired_at(&self, now: Instant) -> usize {
        self.cache.purge_expired_at(now)
    }

    pub fn record_failure(&self, ip: &str) -> ThreatLevel {
        let failures = self.cache.incr(&format!("failed_access_{ip}"), self.window);
        if failures > self.threshold {
            tracing::error!(
                security_alert = true,
                ip,
                failures,
                window_secs = self.window.as_secs(),
                "repeated access failures, possible attack in progress"
            );
            ThreatLevel::Critical
        } else {
            ThreatLevel::Normal
        }
    }
}
