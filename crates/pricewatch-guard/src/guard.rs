//! The `AccessGuard` facade: token, permission, then rate limit.

use std::sync::Arc;
use std::time::{Duration, Instant};

use pricewatch_core::{AppConfig, Permission};
use thiserror::Error;

use crate::attack::{AttackDetector, FailureCache, InMemoryFailureCache};
use crate::audit::{log_access_denied, log_access_granted, AccessRequest};
use crate::error::{AuthError, RateLimitError};
use crate::rate_limiter::SlidingWindowLimiter;
use crate::tokens::{TokenRecord, TokenRegistry};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GuardRejection {
    #[error(transparent)]
    Unauthenticated(#[from] AuthError),

    #[error("insufficient permissions: requires '{0}'")]
    Forbidden(Permission),

    #[error(transparent)]
    RateLimited(#[from] RateLimitError),
}

impl GuardRejection {
    /// Stable machine-readable code for API error bodies.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            GuardRejection::Unauthenticated(_) => "unauthorized",
            GuardRejection::Forbidden(_) => "forbidden",
            GuardRejection::RateLimited(_) => "rate_limited",
        }
    }
}

#[derive(Debug, Clone)]
pub struct GuardConfig {
    pub block_duration: Duration,
    pub attack_threshold: u64,
    pub attack_window: Duration,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            block_duration: Duration::from_secs(300),
            attack_threshold: 10,
            attack_window: Duration::from_secs(300),
        }
    }
}

impl GuardConfig {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            block_duration: Duration::from_secs(config.guard_block_duration_secs),
            attack_threshold: config.guard_attack_threshold,
            attack_window: Duration::from_secs(config.guard_attack_window_secs),
        }
    }
}

#[derive(Debug)]
pub struct AccessGuard {
    tokens: TokenRegistry,
    limiter: SlidingWindowLimiter,
    detector: AttackDetector,
}

impl AccessGuard {
    #[must_use]
    pub fn new(tokens: TokenRegistry, config: &GuardConfig) -> Self {
        Self::with_failure_cache(tokens, config, Arc::new(InMemoryFailureCache::new()))
    }

    #[must_use]
    pub fn with_failure_cache(
        tokens: TokenRegistry,
        config: &GuardConfig,
        cache: Arc<dyn FailureCache>,
    ) -> Self {
        Self {
            tokens,
            limiter: SlidingWindowLimiter::new(config.block_duration),
            detector: AttackDetector::new(cache, config.attack_threshold, config.attack_window),
        }
    }

    #[must_use]
    pub fn limiter(&self) -> &SlidingWindowLimiter {
        &self.limiter
    }

    #[must_use]
    pub fn tokens(&self) -> &TokenRegistry {
        &self.tokens
    }

    /// Drops idle limiter entries and expired failure counters. Returns how
    /// many entries were removed in total.
    pub fn purge_idle_at(&self, max_window: Duration, now: Instant) -> usize {
        self.limiter.purge_idle_at(max_window, now) + self.detector.purge_expired_at(now)
    }

    /// Authorizes one request for `permission`.
    ///
    /// Checks run deny-by-default in order: credential, IP allow-list,
    /// permission, then the token's sliding-window limit keyed by
    /// `ip:path`. Every outcome is logged; every denial also feeds the
    /// attack detector.
    ///
    /// # Errors
    ///
    /// Returns the first [`GuardRejection`] encountered.
    pub fn authorize(
        &self,
        request: &AccessRequest<'_>,
        permission: Permission,
    ) -> Result<Arc<TokenRecord>, GuardRejection> {
        let result = self.evaluate(request, permission);
        match &result {
            Ok(record) => log_access_granted(request, &record.id),
            Err(rejection) => {
                log_access_denied(request, &rejection.to_string());
                self.detector.record_failure(&request.ip_label());
            }
        }
        result
    }

    fn evaluate(
        &self,
        request: &AccessRequest<'_>,
        permission: Permission,
    ) -> Result<Arc<TokenRecord>, GuardRejection> {
        let record = self.tokens.validate_token(request.credential, request.ip)?;

        if !TokenRegistry::check_permission(&record, permission) {
            tracing::warn!(
                token_id = %record.id,
                %permission,
                "permission denied"
            );
            return Err(GuardRejection::Forbidden(permission));
        }

        let caller_id = format!("{}:{}", request.ip_label(), request.path);
        self.limiter.check_rate_limit(
            &caller_id,
            record.rate_limit.requests,
            Duration::from_secs(record.rate_limit.window_secs),
            true,
        )?;

        Ok(record)
    }
}
