//! Access Guard for the inbound API: token and permission checks, IP
//! allow-lists, a sliding-window rate limiter, attack-pattern alerts, and
//! input validation shared with the run pipeline.

pub mod attack;
pub mod audit;
pub mod error;
pub mod guard;
pub mod rate_limiter;
pub mod tokens;
pub mod validation;

pub use attack::{AttackDetector, FailureCache, InMemoryFailureCache, ThreatLevel};
pub use audit::{sanitize_log_field, AccessRequest};
pub use error::{AuthError, RateLimitError, ValidationError};
pub use guard::{AccessGuard, GuardConfig, GuardRejection};
pub use rate_limiter::SlidingWindowLimiter;
pub use tokens::{TokenRecord, TokenRegistry};
pub use validation::{
    sanitize_for_database, sanitize_product, validate_boolean, validate_integer,
    validate_keyword, validate_product_plausibility, KEYWORD_MAX_LENGTH,
};
