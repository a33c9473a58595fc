//! Scheduling-drift telemetry. Best effort: anything odd yields `None`.

use chrono::{DateTime, Utc};

/// Seconds between the expected and the observed start of a run; positive
/// when the run started late. `None` when there is no expectation or the
/// difference cannot be represented.
#[must_use]
pub fn timing_delay_seconds(
    server_time: DateTime<Utc>,
    expected_start: Option<DateTime<Utc>>,
) -> Option<f64> {
    let expected = expected_start?;
    let micros = server_time.signed_duration_since(expected).num_microseconds()?;
    #[allow(clippy::cast_precision_loss)]
    let secs = micros as f64 / 1_000_000.0;
    Some(secs)
}

/// Parses an expected start given as RFC 3339 or integer/fractional unix
/// seconds.
#[must_use]
pub fn parse_expected_start(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    let secs: f64 = raw.parse().ok()?;
    if !secs.is_finite() {
        return None;
    }
    #[allow(clippy::cast_possible_truncation)]
    let micros = (secs * 1_000_000.0).round() as i64;
    DateTime::from_timestamp_micros(micros)
}
