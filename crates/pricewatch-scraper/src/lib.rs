//! Vendor scraping: the resilient fetcher, adapter seams, vendor registry,
//! and product normalization.

pub mod adapter;
pub mod error;
pub mod fetcher;
pub mod http_adapter;
pub mod jsonld;
pub mod normalize;
pub mod registry;
mod retry;
pub mod search_url;
mod throttle;

pub use adapter::{ProductParser, VendorAdapter};
pub use error::{FetchError, ScraperError};
pub use fetcher::{FetcherConfig, ResilientFetcher};
pub use http_adapter::HttpVendorAdapter;
pub use jsonld::{extract_jsonld_products, JsonLdParser};
pub use normalize::{clean_price_digits, normalize_product, normalize_products};
pub use registry::{AdapterConstructor, VendorRegistry};
pub use search_url::SearchUrlBuilder;
