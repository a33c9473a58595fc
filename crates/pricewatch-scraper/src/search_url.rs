use reqwest::Url;

use crate::error::ScraperError;

/// Builds vendor search-result URLs of the form
/// `{base_url}{search_path}?keyword=..&page=..[&sort=price_asc]`.
#[derive(Debug, Clone)]
pub struct SearchUrlBuilder {
    vendor: String,
    search_url: Url,
}

impl SearchUrlBuilder {
    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidSearch`] if `base_url` is not an
    /// absolute http(s) URL or `search_path` cannot be joined onto it.
    pub fn new(vendor: &str, base_url: &str, search_path: &str) -> Result<Self, ScraperError> {
        let invalid = |reason: String| ScraperError::InvalidSearch {
            vendor: vendor.to_string(),
            reason,
        };
        let base = Url::parse(base_url).map_err(|e| invalid(format!("base_url: {e}")))?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(invalid(format!("unsupported scheme '{}'", base.scheme())));
        }
        let search_url = base
            .join(search_path)
            .map_err(|e| invalid(format!("search_path: {e}")))?;
        Ok(Self {
            vendor: vendor.to_string(),
            search_url,
        })
    }

    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidSearch`] when `keyword` is blank.
    pub fn build(
        &self,
        keyword: &str,
        sort_by_price: bool,
        page: u32,
    ) -> Result<String, ScraperError> {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return Err(ScraperError::InvalidSearch {
                vendor: self.vendor.clone(),
                reason: "keyword cannot be empty".to_string(),
            });
        }

        let mut url = self.search_url.clone();
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("keyword", keyword)
                .append_pair("page", &page.to_string());
            if sort_by_price {
                query.append_pair("sort", "price_asc");
            }
        }
        tracing::debug!(vendor = %self.vendor, url = %url, "built search URL");
        Ok(url.into())
    }
}
