use serde::{Deserialize, Serialize};

/// Terminal classification of one vendor's run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VendorStatus {
    FailedScraperCreation,
    SkippedNoCategories,
    FailedAllScrapes,
    PartialSuccess,
    NoProductsFound,
    Success,
    FailedException,
}

impl VendorStatus {
    /// `partial_success`, `no_products_found`, and `success` count as
    /// successful vendors; everything else counts as failed.
    #[must_use]
    pub fn is_successful(self) -> bool {
        matches!(
            self,
            VendorStatus::PartialSuccess | VendorStatus::NoProductsFound | VendorStatus::Success
        )
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            VendorStatus::FailedScraperCreation => "failed_scraper_creation",
            VendorStatus::SkippedNoCategories => "skipped_no_categories",
            VendorStatus::FailedAllScrapes => "failed_all_scrapes",
            VendorStatus::PartialSuccess => "partial_success",
            VendorStatus::NoProductsFound => "no_products_found",
            VendorStatus::Success => "success",
            VendorStatus::FailedException => "failed_exception",
        }
    }
}

impl std::fmt::Display for VendorStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything the status of a vendor that did not panic depends on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusInputs {
    /// No keywords were available and the vendor requires categories.
    pub categories_missing: bool,
    pub scraper_creation_failed: bool,
    pub scrape_attempts: usize,
    pub scrape_failures: usize,
    pub products_found: usize,
}

/// Maps run counters to a status.
///
/// The all-attempts-failed check runs before the partial-success check, so
/// one failed attempt out of one is `failed_all_scrapes`, and zero attempts
/// is `no_products_found`.
#[must_use]
pub fn classify_vendor(inputs: StatusInputs) -> VendorStatus {
    if inputs.categories_missing {
        VendorStatus::SkippedNoCategories
    } else if inputs.scraper_creation_failed {
        VendorStatus::FailedScraperCreation
    } else if inputs.scrape_attempts > 0 && inputs.scrape_failures == inputs.scrape_attempts {
        VendorStatus::FailedAllScrapes
    } else if inputs.scrape_failures > 0 {
        VendorStatus::PartialSuccess
    } else if inputs.products_found == 0 {
        VendorStatus::NoProductsFound
    } else {
        VendorStatus::Success
    }
}
