use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// One vendor entry from `vendors.yaml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorConfig {
    /// Registry key, e.g. `"gemilang"`. Lowercase ASCII, digits, and `_`.
    pub name: String,
    pub base_url: String,
    pub search_path: String,
    /// When `true`, a run without a search keyword and with no categories
    /// skips this vendor instead of scraping nothing.
    #[serde(default)]
    pub requires_categories: bool,
    /// Keywords scraped when the caller supplies no search keyword.
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct VendorsFile {
    pub vendors: Vec<VendorConfig>,
}

impl VendorsFile {
    /// Names of enabled vendors, in file order.
    #[must_use]
    pub fn enabled_names(&self) -> Vec<String> {
        self.vendors
            .iter()
            .filter(|v| v.enabled)
            .map(|v| v.name.clone())
            .collect()
    }
}

/// Load and validate the vendor configuration from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_vendors(path: &Path) -> Result<VendorsFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileIo {
        path: path.display().to_string(),
        source: e,
    })?;
    parse_vendors(&content, &path.display().to_string())
}

fn parse_vendors(content: &str, origin: &str) -> Result<VendorsFile, ConfigError> {
    let file: VendorsFile = serde_yaml::from_str(content).map_err(|e| ConfigError::FileParse {
        path: origin.to_string(),
        source: e,
    })?;
    validate_vendors(&file)?;
    Ok(file)
}

fn validate_vendors(file: &VendorsFile) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();

    for vendor in &file.vendors {
        let valid_name = !vendor.name.is_empty()
            && vendor
                .name
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
        if !valid_name {
            return Err(ConfigError::Validation(format!(
                "vendor name '{}' must be non-empty lowercase ascii, digits, or '_'",
                vendor.name
            )));
        }

        if !seen.insert(vendor.name.clone()) {
            return Err(ConfigError::Validation(format!(
                "duplicate vendor name: '{}'",
                vendor.name
            )));
        }

        if !(vendor.base_url.starts_with("https://") || vendor.base_url.starts_with("http://")) {
            return Err(ConfigError::Validation(format!(
                "vendor '{}' base_url must be an http(s) URL",
                vendor.name
            )));
        }

        if vendor.categories.iter().any(|c| c.trim().is_empty()) {
            return Err(ConfigError::Validation(format!(
                "vendor '{}' has a blank category",
                vendor.name
            )));
        }
    }

    Ok(())
}
