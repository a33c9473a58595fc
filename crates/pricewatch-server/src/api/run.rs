use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Extension, Json,
};
use pricewatch_guard::{validate_boolean, validate_integer, validate_keyword, KEYWORD_MAX_LENGTH};
use pricewatch_runner::{parse_expected_start, RunRequest, Summary};
use pricewatch_scraper::VendorRegistry;
use serde::Deserialize;

use crate::middleware::{AuthenticatedToken, RequestId};

use super::{ApiError, ApiResponse, AppState, ResponseMeta};

const MAX_PRODUCTS_PER_KEYWORD: i64 = 500;

/// Raw query parameters; values are parsed by [`build_run_request`] and a
/// query string that does not deserialize at all (a repeated key, say) is
/// mapped in [`trigger_run`], so both get this API's error body.
#[derive(Debug, Default, Deserialize)]
pub(super) struct RunQuery {
    vendors: Option<String>,
    keyword: Option<String>,
    max_products_per_keyword: Option<String>,
    use_price_update: Option<String>,
    expected_start_time: Option<String>,
}

pub(super) async fn trigger_run(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(token): Extension<AuthenticatedToken>,
    query: Result<Query<RunQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<Summary>>, ApiError> {
    let Query(query) = query.map_err(|rejection| {
        tracing::warn!(token_id = %token.0.id, error = %rejection.body_text(), "rejected run query");
        ApiError::new(req_id.0.clone(), "validation_error", rejection.body_text())
    })?;
    let request = build_run_request(&query, state.orchestrator.registry())
        .map_err(|message| ApiError::new(req_id.0.clone(), "validation_error", message))?;

    tracing::info!(token_id = %token.0.id, "scrape run triggered over HTTP");
    let summary = state.orchestrator.run(request).await;

    Ok(Json(ApiResponse {
        data: summary,
        meta: ResponseMeta::new(req_id.0),
    }))
}

fn build_run_request(query: &RunQuery, registry: &VendorRegistry) -> Result<RunRequest, String> {
    let vendors = match query.vendors.as_deref() {
        None => None,
        Some(raw) => {
            let names: Vec<String> = raw
                .split(',')
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(String::from)
                .collect();
            if let Some(unknown) = names.iter().find(|v| !registry.contains(v)) {
                return Err(format!(
                    "unknown vendor '{}'",
                    pricewatch_guard::sanitize_log_field(unknown, 50)
                ));
            }
            if names.is_empty() {
                None
            } else {
                Some(names)
            }
        }
    };

    let search_keyword = query
        .keyword
        .as_deref()
        .map(|k| validate_keyword(k, KEYWORD_MAX_LENGTH))
        .transpose()
        .map_err(|e| e.to_string())?;

    let max_products_per_keyword = query
        .max_products_per_keyword
        .as_deref()
        .map(|raw| {
            validate_integer(
                Some(raw),
                "max_products_per_keyword",
                Some(1),
                Some(MAX_PRODUCTS_PER_KEYWORD),
            )
        })
        .transpose()
        .map_err(|e| e.to_string())?
        .and_then(|n| usize::try_from(n).ok());

    let use_price_update = validate_boolean(query.use_price_update.as_deref(), "use_price_update")
        .map_err(|e| e.to_string())?
        .unwrap_or(false);

    let expected_start_time = query
        .expected_start_time
        .as_deref()
        .and_then(parse_expected_start);

    Ok(RunRequest {
        vendors,
        search_keyword,
        server_time: None,
        expected_start_time,
        use_price_update,
        max_products_per_keyword,
    })
}
