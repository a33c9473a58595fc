//! Command handlers. Each one loads what it needs from configuration; none
//! of them touch the HTTP API.

use std::sync::Arc;

use pricewatch_core::AppConfig;
use pricewatch_guard::{validate_keyword, TokenRegistry, KEYWORD_MAX_LENGTH};
use pricewatch_runner::{parse_expected_start, JsonlSink, Orchestrator, RunRequest, RunSettings};
use pricewatch_scraper::{FetcherConfig, VendorRegistry};

#[derive(Debug)]
pub(crate) struct RunArgs {
    pub vendors: Vec<String>,
    pub keyword: Option<String>,
    pub price_update: bool,
    pub max_products: Option<u64>,
    pub expected_start: Option<String>,
}

fn load_registry(config: &AppConfig) -> anyhow::Result<VendorRegistry> {
    let vendors = pricewatch_core::load_vendors(&config.vendors_path)?;
    Ok(VendorRegistry::from_vendor_configs(
        &vendors.vendors,
        &FetcherConfig::from_app_config(config),
    ))
}

/// Builds the orchestrator request from CLI arguments, validating the
/// keyword the same way the HTTP trigger does.
pub(crate) fn build_request(args: RunArgs) -> anyhow::Result<RunRequest> {
    let search_keyword = args
        .keyword
        .as_deref()
        .map(|k| validate_keyword(k, KEYWORD_MAX_LENGTH))
        .transpose()?;

    let expected_start_time = match args.expected_start.as_deref() {
        None => None,
        Some(raw) => {
            let parsed = parse_expected_start(raw);
            if parsed.is_none() {
                tracing::warn!(value = raw, "ignoring unparseable --expected-start");
            }
            parsed
        }
    };

    Ok(RunRequest {
        vendors: if args.vendors.is_empty() {
            None
        } else {
            Some(args.vendors)
        },
        search_keyword,
        server_time: None,
        expected_start_time,
        use_price_update: args.price_update,
        max_products_per_keyword: args.max_products.and_then(|n| usize::try_from(n).ok()),
    })
}

/// Runs the orchestrator once and prints the summary as JSON on stdout.
///
/// # Errors
///
/// Returns an error if configuration cannot be loaded, the keyword is
/// rejected, or every requested vendor failed.
pub(crate) async fn run(args: RunArgs) -> anyhow::Result<()> {
    let config = pricewatch_core::load_app_config()?;
    let request = build_request(args)?;
    let registry = load_registry(&config)?;

    if let Some(unknown) = request
        .vendors
        .iter()
        .flatten()
        .find(|v| !registry.contains(v))
    {
        tracing::warn!(vendor = %unknown, "vendor is not configured; it will be reported as failed");
    }

    let orchestrator = Orchestrator::new(
        Arc::new(registry),
        Arc::new(JsonlSink::new(config.sink_path.clone())),
        RunSettings::from_app_config(&config),
    );
    let summary = orchestrator.run(request).await;
    println!("{}", serde_json::to_string_pretty(&summary)?);

    if summary.total_vendors > 0 && summary.successful_vendors == 0 {
        anyhow::bail!("all {} vendors failed", summary.total_vendors);
    }
    Ok(())
}

/// Prints one line per enabled vendor.
///
/// # Errors
///
/// Returns an error if configuration or the vendor file cannot be loaded.
pub(crate) fn list_vendors() -> anyhow::Result<()> {
    let config = pricewatch_core::load_app_config()?;
    let registry = load_registry(&config)?;
    for name in registry.names() {
        let categories = registry.categories(name);
        let note = if registry.requires_categories(name) {
            " (requires categories)"
        } else {
            ""
        };
        println!("{name}{note}: {}", categories.join(", "));
    }
    Ok(())
}

/// # Errors
///
/// Returns the validation error when the keyword is rejected.
pub(crate) fn check_keyword(keyword: &str) -> anyhow::Result<()> {
    let cleaned = validate_keyword(keyword, KEYWORD_MAX_LENGTH)?;
    println!("ok: {cleaned}");
    Ok(())
}

pub(crate) fn hash_token(token: &str, salt: Option<&str>) -> String {
    TokenRegistry::hash_credential(salt, token)
}
