//! Seams between the run loop and vendor-specific scraping code.

use async_trait::async_trait;
use pricewatch_core::RawProduct;

use crate::error::ScraperError;

/// Turns one fetched page into loosely-typed product records.
pub trait ProductParser: Send + Sync {
    /// # Errors
    ///
    /// Returns [`ScraperError::Parse`] when the page cannot be interpreted
    /// at all. Individual malformed entries should be emitted as-is and left
    /// for the normalizer to drop.
    fn parse(&self, html: &str) -> Result<Vec<RawProduct>, ScraperError>;
}

/// One vendor's scraper: builds search URLs, fetches result pages, and
/// parses them. The orchestrator never looks inside the HTML.
#[async_trait]
pub trait VendorAdapter: Send + Sync {
    fn vendor(&self) -> &str;

    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidSearch`] for a blank keyword.
    fn build_search_url(
        &self,
        keyword: &str,
        sort_by_price: bool,
        page: u32,
    ) -> Result<String, ScraperError>;

    /// Fetches the raw search-result page.
    ///
    /// # Errors
    ///
    /// Returns a [`ScraperError`] when the URL cannot be built or the fetch
    /// fails after retries.
    async fn fetch(
        &self,
        keyword: &str,
        sort_by_price: bool,
        page: u32,
    ) -> Result<String, ScraperError>;

    /// # Errors
    ///
    /// Returns [`ScraperError::Parse`] when the page is unusable.
    fn parse(&self, html: &str) -> Result<Vec<RawProduct>, ScraperError>;

    /// Fetch and parse in one step.
    ///
    /// # Errors
    ///
    /// Propagates errors from [`VendorAdapter::fetch`] and
    /// [`VendorAdapter::parse`].
    async fn scrape(
        &self,
        keyword: &str,
        sort_by_price: bool,
        page: u32,
    ) -> Result<Vec<RawProduct>, ScraperError> {
        let html = self.fetch(keyword, sort_by_price, page).await?;
        self.parse(&html)
    }

    /// Looks up a sales unit for a product page. `None` leaves the unit
    /// empty; enrichment never fails the batch.
    async fn enrich_unit(&self, _product_url: &str) -> Option<String> {
        None
    }
}
