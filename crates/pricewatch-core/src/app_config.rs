use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Process-wide configuration, loaded once at startup and shared by `Arc`.
#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub vendors_path: PathBuf,
    pub tokens_path: PathBuf,
    /// Salt prepended to credentials before hashing. `None` means unsalted.
    pub token_salt: Option<String>,
    pub sink_path: PathBuf,
    pub scraper_request_timeout_secs: u64,
    pub scraper_user_agent: String,
    /// Retries after the first failed attempt on transient fetch errors.
    pub scraper_max_retries: u32,
    pub scraper_retry_delay_ms: u64,
    /// Minimum gap between two requests issued by the same fetcher.
    pub scraper_min_request_interval_ms: u64,
    pub run_pages_per_keyword: u32,
    pub run_max_concurrent_vendors: usize,
    pub guard_block_duration_secs: u64,
    pub guard_attack_threshold: u64,
    pub guard_attack_window_secs: u64,
    pub schedule_cron: Option<String>,
    pub schedule_keyword: Option<String>,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("vendors_path", &self.vendors_path)
            .field("tokens_path", &self.tokens_path)
            .field("token_salt", &self.token_salt.as_ref().map(|_| "[redacted]"))
            .field("sink_path", &self.sink_path)
            .field(
                "scraper_request_timeout_secs",
                &self.scraper_request_timeout_secs,
            )
            .field("scraper_user_agent", &self.scraper_user_agent)
            .field("scraper_max_retries", &self.scraper_max_retries)
            .field("scraper_retry_delay_ms", &self.scraper_retry_delay_ms)
            .field(
                "scraper_min_request_interval_ms",
                &self.scraper_min_request_interval_ms,
            )
            .field("run_pages_per_keyword", &self.run_pages_per_keyword)
            .field(
                "run_max_concurrent_vendors",
                &self.run_max_concurrent_vendors,
            )
            .field("guard_block_duration_secs", &self.guard_block_duration_secs)
            .field("guard_attack_threshold", &self.guard_attack_threshold)
            .field("guard_attack_window_secs", &self.guard_attack_window_secs)
            .field("schedule_cron", &self.schedule_cron)
            .field("schedule_keyword", &self.schedule_keyword)
            .finish()
    }
}
