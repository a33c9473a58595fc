mod api;
mod middleware;
mod scheduler;

use std::{net::SocketAddr, sync::Arc, time::Duration};

use pricewatch_guard::{
    validate_keyword, AccessGuard, GuardConfig, TokenRegistry, KEYWORD_MAX_LENGTH,
};
use pricewatch_runner::{JsonlSink, Orchestrator, RunSettings};
use pricewatch_scraper::{FetcherConfig, VendorRegistry};
use tracing_subscriber::EnvFilter;

use crate::api::{build_app, AppState};

const GUARD_PURGE_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Arc::new(pricewatch_core::load_app_config()?);
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let vendors = pricewatch_core::load_vendors(&config.vendors_path)?;
    let registry = VendorRegistry::from_vendor_configs(
        &vendors.vendors,
        &FetcherConfig::from_app_config(&config),
    );
    tracing::info!(vendors = ?registry.names(), "vendor registry loaded");

    let sink = Arc::new(JsonlSink::new(config.sink_path.clone()));
    let orchestrator = Arc::new(Orchestrator::new(
        Arc::new(registry),
        sink,
        RunSettings::from_app_config(&config),
    ));

    let tokens = pricewatch_core::load_tokens(&config.tokens_path)?;
    if tokens.tokens.is_empty() {
        tracing::warn!("no API tokens configured; every guarded route will answer 401");
    }
    let longest_window = tokens
        .tokens
        .iter()
        .map(|t| t.rate_limit.window_secs)
        .max()
        .unwrap_or(60);
    let guard = Arc::new(AccessGuard::new(
        TokenRegistry::from_configs(&tokens.tokens, config.token_salt.as_deref()),
        &GuardConfig::from_app_config(&config),
    ));
    spawn_guard_purge(Arc::clone(&guard), Duration::from_secs(longest_window));

    let schedule_keyword = config
        .schedule_keyword
        .as_deref()
        .map(|k| validate_keyword(k, KEYWORD_MAX_LENGTH))
        .transpose()?;
    let _scheduler = scheduler::build_scheduler(
        Arc::clone(&orchestrator),
        config.schedule_cron.as_deref(),
        schedule_keyword,
    )
    .await?;

    let app = build_app(AppState {
        orchestrator,
        guard,
    });

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, env = %config.env, "pricewatch server listening");
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;
    Ok(())
}

/// Periodically drops idle rate-limiter entries and expired failure
/// counters so one-off callers do not accumulate for the life of the process.
fn spawn_guard_purge(guard: Arc<AccessGuard>, max_window: Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(GUARD_PURGE_INTERVAL);
        loop {
            ticker.tick().await;
            let removed = guard.purge_idle_at(max_window, std::time::Instant::now());
            if removed > 0 {
                tracing::debug!(removed, "purged idle guard entries");
            }
        }
    });
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
