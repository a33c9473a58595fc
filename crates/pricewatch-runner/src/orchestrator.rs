//! Per-vendor run loop and summary assembly.
//!
//! Every vendor is processed in isolation: errors, including panics, are
//! recorded against that vendor and never abort its siblings. The summary is
//! built by the single caller of [`Orchestrator::run`] once all vendor tasks
//! have finished.

use std::collections::HashSet;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use futures::{FutureExt, StreamExt};
use pricewatch_core::{AppConfig, RawProduct};
use pricewatch_guard::{sanitize_product, validate_product_plausibility};
use pricewatch_scraper::{normalize_products, VendorAdapter, VendorRegistry};

use crate::drift::timing_delay_seconds;
use crate::sink::Sink;
use crate::status::{classify_vendor, StatusInputs, VendorStatus};
use crate::summary::{round2, RunError, RunErrorKind, Summary, VendorRunResult};

/// Knobs that apply to every run, taken from [`AppConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSettings {
    /// Pages `0..pages_per_keyword` are scraped for each keyword.
    pub pages_per_keyword: u32,
    /// Vendors processed at the same time. `1` processes them one by one.
    pub max_concurrent_vendors: usize,
    pub sort_by_price: bool,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            pages_per_keyword: 1,
            max_concurrent_vendors: 1,
            sort_by_price: true,
        }
    }
}

impl RunSettings {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            pages_per_keyword: config.run_pages_per_keyword,
            max_concurrent_vendors: config.run_max_concurrent_vendors,
            ..Self::default()
        }
    }
}

/// Arguments for a single run. Every field is optional.
#[derive(Debug, Clone, Default)]
pub struct RunRequest {
    /// Defaults to every registered vendor, in registration order.
    pub vendors: Option<Vec<String>>,
    /// Scrape only this keyword instead of each vendor's categories.
    pub search_keyword: Option<String>,
    /// Defaults to the wall clock when the run starts.
    pub server_time: Option<DateTime<Utc>>,
    pub expected_start_time: Option<DateTime<Utc>>,
    pub use_price_update: bool,
    pub max_products_per_keyword: Option<usize>,
}

pub struct Orchestrator {
    registry: Arc<VendorRegistry>,
    sink: Arc<dyn Sink>,
    settings: RunSettings,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("registry", &self.registry)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl Orchestrator {
    #[must_use]
    pub fn new(registry: Arc<VendorRegistry>, sink: Arc<dyn Sink>, settings: RunSettings) -> Self {
        Self {
            registry,
            sink,
            settings,
        }
    }

    #[must_use]
    pub fn registry(&self) -> &VendorRegistry {
        &self.registry
    }

    #[must_use]
    pub fn settings(&self) -> RunSettings {
        self.settings
    }

    /// Runs every requested vendor and returns the summary. Never fails:
    /// problems end up in the per-vendor results and `Summary::errors`.
    pub async fn run(&self, request: RunRequest) -> Summary {
        let started_at = Utc::now();
        let server_time = request.server_time.unwrap_or(started_at);
        let timing_delay = timing_delay_seconds(server_time, request.expected_start_time);

        let vendors = dedupe(
            request
                .vendors
                .clone()
                .unwrap_or_else(|| self.registry.names().to_vec()),
        );
        tracing::info!(
            vendors = vendors.len(),
            keyword = ?request.search_keyword,
            use_price_update = request.use_price_update,
            "starting scrape run"
        );

        let request = &request;
        let outcomes: Vec<(VendorRunResult, Vec<RunError>)> = futures::stream::iter(vendors)
            .map(|vendor| self.run_vendor(vendor, request))
            .buffer_unordered(self.settings.max_concurrent_vendors.max(1))
            .collect()
            .await;

        let mut results = Vec::with_capacity(outcomes.len());
        let mut errors = Vec::new();
        for (result, vendor_errors) in outcomes {
            results.push(result);
            errors.extend(vendor_errors);
        }

        let summary = Summary::assemble(
            server_time,
            started_at,
            Utc::now(),
            timing_delay,
            results,
            errors,
        );
        tracing::info!(
            total = summary.total_vendors,
            successful = summary.successful_vendors,
            failed = summary.failed_vendors,
            duration_secs = summary.total_duration_seconds,
            "scrape run finished"
        );
        summary
    }

    async fn run_vendor(
        &self,
        vendor: String,
        request: &RunRequest,
    ) -> (VendorRunResult, Vec<RunError>) {
        let started = Instant::now();
        let mut result = VendorRunResult::new(&vendor);
        let mut errors = Vec::new();

        let processed = AssertUnwindSafe(self.process_vendor(request, &mut result, &mut errors))
            .catch_unwind()
            .await;

        if let Err(payload) = processed {
            let message = format!("{vendor} critical exception: {}", panic_message(&*payload));
            tracing::error!(vendor = %vendor, error = %message, "vendor processing panicked");
            result.status = VendorStatus::FailedException;
            result.errors.push(message.clone());
            errors.push(RunError {
                vendor: vendor.clone(),
                error: message,
                kind: RunErrorKind::CriticalException,
            });
        }

        result.duration_seconds = round2(started.elapsed().as_secs_f64());
        tracing::info!(
            vendor = %vendor,
            status = %result.status,
            attempts = result.scrape_attempts,
            failures = result.scrape_failures,
            found = result.products_found,
            saved = result.saved,
            "vendor finished"
        );
        (result, errors)
    }

    async fn process_vendor(
        &self,
        request: &RunRequest,
        result: &mut VendorRunResult,
        errors: &mut Vec<RunError>,
    ) {
        let vendor = result.vendor.clone();

        let keywords: Vec<String> = match request
            .search_keyword
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
        {
            Some(keyword) => vec![keyword.to_string()],
            None => self.registry.categories(&vendor).to_vec(),
        };

        if keywords.is_empty() && self.registry.requires_categories(&vendor) {
            tracing::warn!(vendor = %vendor, "no categories configured, skipping vendor");
            result
                .errors
                .push(format!("No categories returned for vendor {vendor}"));
            result.status = classify_vendor(StatusInputs {
                categories_missing: true,
                ..StatusInputs::default()
            });
            return;
        }

        let adapter = match self.registry.create(&vendor) {
            Ok(adapter) => adapter,
            Err(e) => {
                let message = format!("Failed to create scraper for {vendor}: {e}");
                tracing::error!(vendor = %vendor, error = %e, "failed to create scraper");
                result.errors.push(message.clone());
                errors.push(RunError {
                    vendor: vendor.clone(),
                    error: message,
                    kind: RunErrorKind::ScraperCreation,
                });
                result.status = classify_vendor(StatusInputs {
                    scraper_creation_failed: true,
                    ..StatusInputs::default()
                });
                return;
            }
        };

        for keyword in &keywords {
            result.keywords_tried += 1;
            for page in 0..self.settings.pages_per_keyword {
                self.scrape_page(adapter.as_ref(), keyword, page, request, result)
                    .await;
            }
        }

        result.status = classify_vendor(StatusInputs {
            categories_missing: false,
            scraper_creation_failed: false,
            scrape_attempts: result.scrape_attempts,
            scrape_failures: result.scrape_failures,
            products_found: result.products_found,
        });

        match result.status {
            VendorStatus::FailedAllScrapes => {
                errors.push(RunError {
                    vendor: vendor.clone(),
                    error: format!("All {} scrape attempts failed", result.scrape_attempts),
                    kind: RunErrorKind::CompleteFailure,
                });
            }
            VendorStatus::NoProductsFound => {
                result
                    .errors
                    .push(format!("No products found for vendor {vendor}"));
            }
            _ => {}
        }
    }

    /// One scrape attempt: fetch, enrich, normalize, truncate, sanitize,
    /// drop implausible records, save. Save failures are recorded but do not count as scrape failures.
    async fn scrape_page(
        &self,
        adapter: &dyn VendorAdapter,
        keyword: &str,
        page: u32,
        request: &RunRequest,
        result: &mut VendorRunResult,
    ) {
        let vendor = result.vendor.clone();
        result.scrape_attempts += 1;

        let raw = match adapter
            .scrape(keyword, self.settings.sort_by_price, page)
            .await
        {
            Ok(raw) => raw,
            Err(e) => {
                result.scrape_failures += 1;
                tracing::error!(
                    vendor = %vendor,
                    keyword = %keyword,
                    page,
                    error = %e,
                    "scrape failed"
                );
                result.errors.push(format!(
                    "{vendor} scrape failed for keyword \"{keyword}\" page {page}: {e}"
                ));
                return;
            }
        };

        let raw = enrich_units(adapter, raw).await;
        let mut products = normalize_products(raw);
        result.products_found += products.len();

        if let Some(max) = request.max_products_per_keyword {
            products.truncate(max);
        }
        let batch: Vec<_> = products
            .into_iter()
            .map(sanitize_product)
            .filter(|product| match validate_product_plausibility(product) {
                Ok(()) => true,
                Err(e) => {
                    tracing::debug!(vendor = %vendor, url = %product.url, reason = %e, "dropping implausible product");
                    false
                }
            })
            .collect();
        if batch.is_empty() {
            return;
        }

        let outcome = if request.use_price_update {
            self.sink.save_with_price_update(&vendor, &batch).await
        } else {
            self.sink.save(&vendor, &batch).await
        };

        if outcome.ok {
            result.saved += outcome.inserted.min(batch.len());
        } else {
            let reason = outcome
                .error
                .unwrap_or_else(|| "unknown save error".to_string());
            tracing::error!(vendor = %vendor, keyword = %keyword, error = %reason, "save failed");
            result.errors.push(format!(
                "{vendor} save failed for keyword \"{keyword}\": {reason}"
            ));
        }
    }
}

/// Fills in missing units from the adapter. A `None` from the adapter
/// leaves the record untouched.
async fn enrich_units(adapter: &dyn VendorAdapter, mut raw: Vec<RawProduct>) -> Vec<RawProduct> {
    for product in &mut raw {
        if product.has_unit() {
            continue;
        }
        let Some(url) = product.url.clone().filter(|u| !u.trim().is_empty()) else {
            continue;
        };
        if let Some(unit) = adapter.enrich_unit(&url).await {
            product.unit = Some(unit);
        }
    }
    raw
}

fn dedupe(vendors: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    vendors
        .into_iter()
        .filter(|v| seen.insert(v.clone()))
        .collect()
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
