//! Fixed-delay retry for transient fetch failures.

use std::future::Future;
use std::time::Duration;

use crate::error::FetchError;

/// Runs `operation` until it succeeds, fails permanently, or the retry
/// budget is spent.
///
/// `max_retries` counts additional attempts after the first, so the
/// operation runs at most `max_retries + 1` times. Between attempts the
/// task sleeps for `delay`. The last error is returned when the budget is
/// exhausted; permanent errors are returned immediately.
pub(crate) async fn retry_with_delay<T, F, Fut>(
    max_retries: u32,
    delay: Duration,
    mut operation: F,
) -> Result<T, FetchError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, FetchError>>,
{
    let mut attempt = 0u32;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !err.is_transient() || attempt >= max_retries {
                    return Err(err);
                }
                tracing::warn!(
                    attempt = attempt + 1,
                    max_retries,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    error = %err,
                    "transient fetch error, retrying"
                );
            }
        }

        tokio::time::sleep(delay).await;
        attempt += 1;
    }
}
