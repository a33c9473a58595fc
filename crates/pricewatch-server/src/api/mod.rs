mod run;
mod vendors;

use std::sync::Arc;

use axum::{
    http::{header, HeaderName, HeaderValue, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use pricewatch_core::Permission;
use pricewatch_guard::AccessGuard;
use pricewatch_runner::Orchestrator;
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};

use crate::middleware::{request_id, require_permission, GuardState, RequestId};

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    pub guard: Arc<AccessGuard>,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    vendors: usize,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "unauthorized" => StatusCode::UNAUTHORIZED,
            "forbidden" => StatusCode::FORBIDDEN,
            "bad_request" | "validation_error" => StatusCode::BAD_REQUEST,
            "rate_limited" => StatusCode::TOO_MANY_REQUESTS,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-api-token"),
            HeaderName::from_static("x-request-id"),
        ])
}

fn guarded(
    router: Router<AppState>,
    guard: &Arc<AccessGuard>,
    permission: Permission,
) -> Router<AppState> {
    router.layer(axum::middleware::from_fn_with_state(
        GuardState::new(Arc::clone(guard), permission),
        require_permission,
    ))
}

pub fn build_app(state: AppState) -> Router {
    let public_routes = Router::new().route("/api/v1/health", get(health));
    let read_routes = guarded(
        Router::new().route("/api/v1/vendors", get(vendors::list_vendors)),
        &state.guard,
        Permission::Read,
    );
    let scrape_routes = guarded(
        Router::new().route("/api/v1/scrape/run", post(run::trigger_run)),
        &state.guard,
        Permission::Scrape,
    );

    Router::new()
        .merge(public_routes)
        .merge(read_routes)
        .merge(scrape_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id))
                .layer(SetResponseHeaderLayer::overriding(
                    header::CACHE_CONTROL,
                    HeaderValue::from_static("no-store"),
                ))
                .layer(CompressionLayer::new()),
        )
        .with_state(state)
}

async fn health(
    axum::extract::State(state): axum::extract::State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    Json(ApiResponse {
        data: HealthData {
            status: "ok",
            vendors: state.orchestrator.registry().names().len(),
        },
        meta: ResponseMeta::new(req_id.0),
    })
}

#[cfg(test)]
pub(crate) mod test_support {
    use async_trait::async_trait;
    use pricewatch_core::{Product, RawPrice, RawProduct, TokenConfig, TokenRateLimit};
    use pricewatch_guard::{GuardConfig, TokenRegistry};
    use pricewatch_runner::{RunSettings, SaveOutcome, Sink};
    use pricewatch_scraper::{ScraperError, VendorAdapter, VendorRegistry};

    use super::*;

    pub const SCRAPE_SECRET: &str = "scrape-secret";
    pub const READ_SECRET: &str = "read-secret";

    struct OneProductAdapter;

    #[async_trait]
    impl VendorAdapter for OneProductAdapter {
        fn vendor(&self) -> &str {
            "gemilang"
        }

        fn build_search_url(
            &self,
            keyword: &str,
            _sort_by_price: bool,
            page: u32,
        ) -> Result<String, ScraperError> {
            Ok(format!("https://gemilang.test/search?keyword={keyword}&page={page}"))
        }

        async fn fetch(
            &self,
            _keyword: &str,
            _sort_by_price: bool,
            _page: u32,
        ) -> Result<String, ScraperError> {
            Ok(String::new())
        }

        fn parse(&self, _html: &str) -> Result<Vec<RawProduct>, ScraperError> {
            Ok(vec![RawProduct {
                name: Some("Semen 40kg".to_string()),
                price: Some(RawPrice::Text("Rp 65.000".to_string())),
                url: Some("https://gemilang.test/semen".to_string()),
                ..RawProduct::default()
            }])
        }
    }

    struct AcceptingSink;

    #[async_trait]
    impl Sink for AcceptingSink {
        async fn save(&self, _vendor: &str, products: &[Product]) -> SaveOutcome {
            SaveOutcome::saved(products.len())
        }
    }

    fn token(id: &str, secret: &str, permissions: &[Permission], requests: usize) -> TokenConfig {
        TokenConfig {
            id: id.to_string(),
            name: id.to_string(),
            credential_sha256: TokenRegistry::hash_credential(None, secret),
            permissions: permissions.to_vec(),
            allowed_ips: Vec::new(),
            rate_limit: TokenRateLimit {
                requests,
                window_secs: 60,
            },
        }
    }

    /// App with one vendor (`gemilang`), a scrape token allowed two
    /// requests per minute, and a read-only token.
    pub fn app() -> Router {
        let mut registry = VendorRegistry::new();
        registry.register("gemilang", vec!["semen".to_string()], false, || {
            Ok(Arc::new(OneProductAdapter) as Arc<dyn VendorAdapter>)
        });
        let orchestrator = Orchestrator::new(
            Arc::new(registry),
            Arc::new(AcceptingSink),
            RunSettings::default(),
        );
        let tokens = TokenRegistry::from_configs(
            &[
                token("cron", SCRAPE_SECRET, &[Permission::Scrape, Permission::Read], 2),
                token("viewer", READ_SECRET, &[Permission::Read], 100),
            ],
            None,
        );
        build_app(AppState {
            orchestrator: Arc::new(orchestrator),
            guard: Arc::new(AccessGuard::new(tokens, &GuardConfig::default())),
        })
    }
}
