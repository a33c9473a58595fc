use std::sync::Arc;

use async_trait::async_trait;
use pricewatch_core::{RawProduct, VendorConfig};

use crate::adapter::{ProductParser, VendorAdapter};
use crate::error::ScraperError;
use crate::fetcher::{FetcherConfig, ResilientFetcher};
use crate::search_url::SearchUrlBuilder;

/// Adapter for vendors described entirely by configuration: a search URL
/// template plus a pluggable page parser.
///
/// Each instance owns its own [`ResilientFetcher`], so the courtesy
/// throttle applies per adapter.
pub struct HttpVendorAdapter {
    vendor: String,
    urls: SearchUrlBuilder,
    fetcher: ResilientFetcher,
    parser: Arc<dyn ProductParser>,
}

impl HttpVendorAdapter {
    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidSearch`] for an unusable base URL or
    /// [`ScraperError::ClientBuild`] if the HTTP client cannot be built.
    pub fn new(
        config: &VendorConfig,
        fetcher: FetcherConfig,
        parser: Arc<dyn ProductParser>,
    ) -> Result<Self, ScraperError> {
        Ok(Self {
            vendor: config.name.clone(),
            urls: SearchUrlBuilder::new(&config.name, &config.base_url, &config.search_path)?,
            fetcher: ResilientFetcher::new(fetcher)?,
            parser,
        })
    }
}

#[async_trait]
impl VendorAdapter for HttpVendorAdapter {
    fn vendor(&self) -> &str {
        &self.vendor
    }

    fn build_search_url(
        &self,
        keyword: &str,
        sort_by_price: bool,
        page: u32,
    ) -> Result<String, ScraperError> {
        self.urls.build(keyword, sort_by_price, page)
    }

    async fn fetch(
        &self,
        keyword: &str,
        sort_by_price: bool,
        page: u32,
    ) -> Result<String, ScraperError> {
        let url = self.build_search_url(keyword, sort_by_price, page)?;
        let timeout = self.fetcher.config().request_timeout;
        Ok(self.fetcher.get(&url, timeout).await?)
    }

    fn parse(&self, html: &str) -> Result<Vec<RawProduct>, ScraperError> {
        self.parser.parse(html)
    }

    /// Fetches the product page and takes the first non-blank unit the
    /// parser finds there.
    async fn enrich_unit(&self, product_url: &str) -> Option<String> {
        let timeout = self.fetcher.config().request_timeout;
        let html = match self.fetcher.get(product_url, timeout).await {
            Ok(html) => html,
            Err(e) => {
                tracing::debug!(vendor = %self.vendor, url = product_url, error = %e, "unit lookup fetch failed");
                return None;
            }
        };
        let products = match self.parser.parse(&html) {
            Ok(products) => products,
            Err(e) => {
                tracing::debug!(vendor = %self.vendor, url = product_url, error = %e, "unit lookup parse failed");
                return None;
            }
        };
        products
            .into_iter()
            .filter_map(|p| p.unit)
            .map(|u| u.trim().to_string())
            .find(|u| !u.is_empty())
    }
}
