use thiserror::Error;

/// Credential check failures. Messages are deliberately generic: they say
/// which stage failed but never which tokens exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("credential required")]
    MissingCredential,

    #[error("invalid credential")]
    InvalidCredential,

    #[error("IP not authorized")]
    IpNotAuthorized,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RateLimitError {
    #[error("rate limit exceeded: maximum {max_requests} requests per {window_secs} seconds")]
    Exceeded {
        max_requests: usize,
        window_secs: u64,
    },

    #[error("rate limit exceeded: blocked for {remaining_secs} more seconds")]
    Blocked { remaining_secs: u64 },
}

impl RateLimitError {
    /// Seconds a client should wait before trying again.
    #[must_use]
    pub fn retry_after_secs(&self) -> u64 {
        match self {
            RateLimitError::Exceeded { window_secs, .. } => *window_secs,
            RateLimitError::Blocked { remaining_secs } => *remaining_secs,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} is required")]
    Required { field: String },

    #[error("{field} exceeds maximum length of {max}")]
    TooLong { field: String, max: usize },

    #[error("{field} must be at least {min} characters")]
    TooShort { field: String, min: usize },

    #[error("{field} must use https")]
    InsecureUrl { field: String },

    #[error("{field} points at a local host")]
    LocalHost { field: String },

    #[error("{field} contains invalid characters; only letters, digits, spaces, '-', '_' and '.' are allowed")]
    InvalidCharacters { field: String },

    #[error("invalid {field} format")]
    SuspiciousPattern { field: String },

    #[error("{field} must be a valid integer")]
    NotAnInteger { field: String },

    #[error("{field} must be at least {min}")]
    BelowMinimum { field: String, min: i64 },

    #[error("{field} must be at most {max}")]
    AboveMaximum { field: String, max: i64 },

    #[error("{field} must be a boolean value")]
    NotABoolean { field: String },
}
