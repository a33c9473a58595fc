//! Vendor name to adapter constructor map, resolved once at startup.

use std::collections::HashMap;
use std::sync::Arc;

use pricewatch_core::VendorConfig;

use crate::adapter::VendorAdapter;
use crate::error::ScraperError;
use crate::fetcher::FetcherConfig;
use crate::http_adapter::HttpVendorAdapter;
use crate::jsonld::JsonLdParser;

pub type AdapterConstructor =
    Arc<dyn Fn() -> Result<Arc<dyn VendorAdapter>, ScraperError> + Send + Sync>;

struct RegistryEntry {
    requires_categories: bool,
    categories: Vec<String>,
    constructor: AdapterConstructor,
}

/// Read-only after construction; share it behind an `Arc`.
#[derive(Default)]
pub struct VendorRegistry {
    entries: HashMap<String, RegistryEntry>,
    order: Vec<String>,
}

impl std::fmt::Debug for VendorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VendorRegistry")
            .field("vendors", &self.order)
            .finish_non_exhaustive()
    }
}

impl VendorRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers every enabled vendor from configuration with a JSON-LD
    /// HTTP adapter. Disabled vendors are left out entirely.
    #[must_use]
    pub fn from_vendor_configs(configs: &[VendorConfig], fetcher: &FetcherConfig) -> Self {
        let mut registry = Self::new();
        for config in configs.iter().filter(|c| c.enabled) {
            let vendor = config.clone();
            let fetcher = fetcher.clone();
            registry.register(
                &config.name,
                config.categories.clone(),
                config.requires_categories,
                move || {
                    let adapter =
                        HttpVendorAdapter::new(&vendor, fetcher.clone(), Arc::new(JsonLdParser))?;
                    Ok(Arc::new(adapter) as Arc<dyn VendorAdapter>)
                },
            );
        }
        registry
    }

    /// Adds or replaces a vendor. Registration order is kept for
    /// [`VendorRegistry::names`].
    pub fn register<F>(
        &mut self,
        name: &str,
        categories: Vec<String>,
        requires_categories: bool,
        constructor: F,
    ) where
        F: Fn() -> Result<Arc<dyn VendorAdapter>, ScraperError> + Send + Sync + 'static,
    {
        if !self.entries.contains_key(name) {
            self.order.push(name.to_string());
        }
        self.entries.insert(
            name.to_string(),
            RegistryEntry {
                requires_categories,
                categories,
                constructor: Arc::new(constructor),
            },
        );
    }

    /// Builds a fresh adapter for `vendor`.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::UnknownVendor`] for an unregistered name, or
    /// whatever the vendor's constructor fails with.
    pub fn create(&self, vendor: &str) -> Result<Arc<dyn VendorAdapter>, ScraperError> {
        let entry = self
            .entries
            .get(vendor)
            .ok_or_else(|| ScraperError::UnknownVendor(vendor.to_string()))?;
        (entry.constructor)()
    }

    /// Static keyword list for `vendor`; empty for unknown vendors.
    #[must_use]
    pub fn categories(&self, vendor: &str) -> &[String] {
        self.entries
            .get(vendor)
            .map(|e| e.categories.as_slice())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn requires_categories(&self, vendor: &str) -> bool {
        self.entries
            .get(vendor)
            .is_some_and(|e| e.requires_categories)
    }

    #[must_use]
    pub fn contains(&self, vendor: &str) -> bool {
        self.entries.contains_key(vendor)
    }

    /// Registered vendor names in registration order.
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.order
    }
}
