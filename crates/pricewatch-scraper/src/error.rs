use thiserror::Error;

/// Classified outcome of a failed fetch.
///
/// Never carries a raw transport error past the fetcher; callers only see
/// the class and a short message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("invalid request for {url}: {reason}")]
    InvalidRequest { url: String, reason: String },

    #[error("request to {url} timed out")]
    Timeout { url: String },

    #[error("connection to {url} failed: {message}")]
    Connection { url: String, message: String },

    #[error("unexpected HTTP status {status} from {url}")]
    Status { status: u16, url: String },

    #[error("empty response body from {url}")]
    EmptyBody { url: String },
}

impl FetchError {
    /// Returns `true` for failures that may succeed on a later attempt.
    ///
    /// Everything except a malformed request is transient.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        !matches!(self, FetchError::InvalidRequest { .. })
    }
}

#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("unknown vendor: {0}")]
    UnknownVendor(String),

    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[from] reqwest::Error),

    #[error("invalid search for {vendor}: {reason}")]
    InvalidSearch { vendor: String, reason: String },

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("failed to parse {vendor} response: {reason}")]
    Parse { vendor: String, reason: String },
}
