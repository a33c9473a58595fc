use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::status::VendorStatus;

/// Per-vendor counters for one run. Owned by the task processing that
/// vendor until it is handed to the summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VendorRunResult {
    pub vendor: String,
    pub status: VendorStatus,
    pub keywords_tried: usize,
    pub scrape_attempts: usize,
    pub scrape_failures: usize,
    /// Normalized products before any per-keyword truncation.
    pub products_found: usize,
    pub saved: usize,
    pub errors: Vec<String>,
    pub duration_seconds: f64,
}

impl VendorRunResult {
    #[must_use]
    pub fn new(vendor: &str) -> Self {
        Self {
            vendor: vendor.to_string(),
            status: VendorStatus::NoProductsFound,
            keywords_tried: 0,
            scrape_attempts: 0,
            scrape_failures: 0,
            products_found: 0,
            saved: 0,
            errors: Vec::new(),
            duration_seconds: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunErrorKind {
    ScraperCreation,
    CompleteFailure,
    CriticalException,
}

/// Run-level error entry, in addition to the vendor's own `errors`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunError {
    pub vendor: String,
    pub error: String,
    pub kind: RunErrorKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub server_time: DateTime<Utc>,
    /// Unix seconds.
    pub start_timestamp: f64,
    pub end_timestamp: f64,
    pub total_duration_seconds: f64,
    pub timing_delay_seconds: Option<f64>,
    pub vendors: BTreeMap<String, VendorRunResult>,
    pub total_vendors: usize,
    pub successful_vendors: usize,
    pub failed_vendors: usize,
    pub errors: Vec<RunError>,
}

impl Summary {
    /// Builds the summary from finished vendor results. Totals are derived
    /// from the results, so they always agree with `vendors`.
    #[must_use]
    pub fn assemble(
        server_time: DateTime<Utc>,
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
        timing_delay_seconds: Option<f64>,
        results: Vec<VendorRunResult>,
        errors: Vec<RunError>,
    ) -> Self {
        let successful_vendors = results.iter().filter(|r| r.status.is_successful()).count();
        let total_vendors = results.len();
        let vendors = results
            .into_iter()
            .map(|r| (r.vendor.clone(), r))
            .collect::<BTreeMap<_, _>>();

        let start_timestamp = unix_seconds(started_at);
        let end_timestamp = unix_seconds(finished_at);
        Self {
            server_time,
            start_timestamp,
            end_timestamp,
            total_duration_seconds: round2((end_timestamp - start_timestamp).max(0.0)),
            timing_delay_seconds,
            vendors,
            total_vendors,
            successful_vendors,
            failed_vendors: total_vendors - successful_vendors,
            errors,
        }
    }
}

#[allow(clippy::cast_precision_loss)]
fn unix_seconds(t: DateTime<Utc>) -> f64 {
    t.timestamp_micros() as f64 / 1_000_000.0
}

/// Rounds to two decimal places.
#[must_use]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
