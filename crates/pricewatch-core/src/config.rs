use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so tests can drive it with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let optional = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_addr = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        or_default(var, default)
            .parse::<SocketAddr>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        or_default(var, default)
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let env = parse_environment(&or_default("PRICEWATCH_ENV", "development"))?;
    let bind_addr = parse_addr("PRICEWATCH_BIND_ADDR", "0.0.0.0:3000")?;
    let log_level = or_default("PRICEWATCH_LOG_LEVEL", "info");
    let vendors_path = PathBuf::from(or_default(
        "PRICEWATCH_VENDORS_PATH",
        "./config/vendors.yaml",
    ));
    let tokens_path = PathBuf::from(or_default(
        "PRICEWATCH_TOKENS_PATH",
        "./config/tokens.yaml",
    ));
    let token_salt = optional("PRICEWATCH_TOKEN_SALT");
    let sink_path = PathBuf::from(or_default(
        "PRICEWATCH_SINK_PATH",
        "./data/products.jsonl",
    ));

    let scraper_request_timeout_secs = parse_u64("PRICEWATCH_SCRAPER_REQUEST_TIMEOUT_SECS", "30")?;
    if scraper_request_timeout_secs == 0 {
        return Err(invalid(
            "PRICEWATCH_SCRAPER_REQUEST_TIMEOUT_SECS",
            "must be greater than zero".to_string(),
        ));
    }
    let scraper_user_agent = or_default(
        "PRICEWATCH_SCRAPER_USER_AGENT",
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    );
    let scraper_max_retries = parse_u32("PRICEWATCH_SCRAPER_MAX_RETRIES", "3")?;
    let scraper_retry_delay_ms = parse_u64("PRICEWATCH_SCRAPER_RETRY_DELAY_MS", "1000")?;
    let scraper_min_request_interval_ms =
        parse_u64("PRICEWATCH_SCRAPER_MIN_REQUEST_INTERVAL_MS", "1000")?;

    let run_pages_per_keyword = parse_u32("PRICEWATCH_RUN_PAGES_PER_KEYWORD", "1")?;
    if run_pages_per_keyword == 0 {
        return Err(invalid(
            "PRICEWATCH_RUN_PAGES_PER_KEYWORD",
            "must be at least 1".to_string(),
        ));
    }
    let run_max_concurrent_vendors = parse_usize("PRICEWATCH_RUN_MAX_CONCURRENT_VENDORS", "1")?;

    let guard_block_duration_secs = parse_u64("PRICEWATCH_GUARD_BLOCK_DURATION_SECS", "300")?;
    let guard_attack_threshold = parse_u64("PRICEWATCH_GUARD_ATTACK_THRESHOLD", "10")?;
    let guard_attack_window_secs = parse_u64("PRICEWATCH_GUARD_ATTACK_WINDOW_SECS", "300")?;

    let schedule_cron = optional("PRICEWATCH_SCHEDULE_CRON");
    let schedule_keyword = optional("PRICEWATCH_SCHEDULE_KEYWORD");

    Ok(AppConfig {
        env,
        bind_addr,
        log_level,
        vendors_path,
        tokens_path,
        token_salt,
        sink_path,
        scraper_request_timeout_secs,
        scraper_user_agent,
        scraper_max_retries,
        scraper_retry_delay_ms,
        scraper_min_request_interval_ms,
        run_pages_per_keyword,
        run_max_concurrent_vendors,
        guard_block_duration_secs,
        guard_attack_threshold,
        guard_attack_window_secs,
        schedule_cron,
        schedule_keyword,
    })
}

/// Parse a string into an `Environment` variant.
///
/// # Errors
///
/// Returns `ConfigError::InvalidEnvVar` for anything other than
/// `development`, `test`, or `production`.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "PRICEWATCH_ENV".to_string(),
            reason: format!("unknown environment '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
