//! Throttled, retrying HTTP GET used by every vendor adapter.

use std::time::Duration;

use pricewatch_core::AppConfig;
use reqwest::{Client, Url};

use crate::error::{FetchError, ScraperError};
use crate::retry::retry_with_delay;
use crate::throttle::RequestThrottle;

pub(crate) const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// Tuning for a [`ResilientFetcher`].
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    pub request_timeout: Duration,
    pub user_agent: String,
    /// Retries after the first attempt. `0` disables retrying.
    pub max_retries: u32,
    pub retry_delay: Duration,
    pub min_request_interval: Duration,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            max_retries: 3,
            retry_delay: Duration::from_secs(1),
            min_request_interval: Duration::from_secs(1),
        }
    }
}

impl FetcherConfig {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            request_timeout: Duration::from_secs(config.scraper_request_timeout_secs),
            user_agent: config.scraper_user_agent.clone(),
            max_retries: config.scraper_max_retries,
            retry_delay: Duration::from_millis(config.scraper_retry_delay_ms),
            min_request_interval: Duration::from_millis(config.scraper_min_request_interval_ms),
        }
    }
}

/// HTTP client with a per-instance courtesy throttle and fixed-delay retry.
///
/// Two fetchers never wait on each other; the minimum request interval only
/// spaces requests issued through the same instance.
#[derive(Debug)]
pub struct ResilientFetcher {
    client: Client,
    config: FetcherConfig,
    throttle: RequestThrottle,
}

impl ResilientFetcher {
    /// # Errors
    ///
    /// Returns [`ScraperError::ClientBuild`] if the underlying
    /// `reqwest::Client` cannot be constructed.
    pub fn new(config: FetcherConfig) -> Result<Self, ScraperError> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .connect_timeout(config.request_timeout.min(Duration::from_secs(10)))
            .build()?;
        Ok(Self {
            throttle: RequestThrottle::new(config.min_request_interval),
            client,
            config,
        })
    }

    #[must_use]
    pub fn config(&self) -> &FetcherConfig {
        &self.config
    }

    /// Fetches `url` and returns the response body.
    ///
    /// Transient failures (timeout, connection error, non-2xx status, empty
    /// body) are retried up to `max_retries` times. A URL that cannot be
    /// parsed fails at once without touching the network.
    ///
    /// Every attempt, retries included, waits for the throttle slot, so a
    /// retry can wait `retry_delay` plus up to `min_request_interval`.
    ///
    /// # Errors
    ///
    /// Returns the last classified [`FetchError`] once retries are exhausted,
    /// or [`FetchError::InvalidRequest`] immediately for a malformed URL.
    pub async fn get(&self, url: &str, timeout: Duration) -> Result<String, FetchError> {
        let parsed = parse_request_url(url)?;

        let result = retry_with_delay(self.config.max_retries, self.config.retry_delay, || {
            self.fetch_once(&parsed, timeout)
        })
        .await;

        match &result {
            Ok(body) => tracing::debug!(url, bytes = body.len(), "fetch succeeded"),
            Err(e) => tracing::warn!(url, error = %e, "fetch failed"),
        }
        result
    }

    async fn fetch_once(&self, url: &Url, timeout: Duration) -> Result<String, FetchError> {
        self.throttle.wait_for_slot().await;
        tracing::debug!(url = %url, "sending request");

        let response = self
            .client
            .get(url.clone())
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| classify(url, &e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response.text().await.map_err(|e| classify(url, &e))?;
        if body.trim().is_empty() {
            return Err(FetchError::EmptyBody {
                url: url.to_string(),
            });
        }
        Ok(body)
    }
}

fn parse_request_url(url: &str) -> Result<Url, FetchError> {
    let invalid = |reason: String| FetchError::InvalidRequest {
        url: url.to_string(),
        reason,
    };
    let parsed = Url::parse(url).map_err(|e| invalid(e.to_string()))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", parsed.scheme())));
    }
    Ok(parsed)
}

fn classify(url: &Url, err: &reqwest::Error) -> FetchError {
    let url = url.to_string();
    if err.is_builder() {
        FetchError::InvalidRequest {
            url,
            reason: err.to_string(),
        }
    } else if err.is_timeout() {
        FetchError::Timeout { url }
    } else {
        FetchError::Connection {
            url,
            message: err.to_string(),
        }
    }
}
