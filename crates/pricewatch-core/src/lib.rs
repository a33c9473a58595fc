//! Shared types and configuration for the pricewatch workspace.

pub mod app_config;
pub mod config;
pub mod error;
pub mod products;
pub mod tokens;
pub mod vendors;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use error::ConfigError;
pub use products::{Product, RawPrice, RawProduct};
pub use tokens::{load_tokens, Permission, TokenConfig, TokenRateLimit, TokensFile};
pub use vendors::{load_vendors, VendorConfig, VendorsFile};
