use axum::{extract::State, Extension, Json};
use serde::Serialize;

use crate::middleware::RequestId;

use super::{ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Serialize)]
pub(super) struct VendorItem {
    name: String,
    categories: Vec<String>,
    requires_categories: bool,
}

pub(super) async fn list_vendors(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Json<ApiResponse<Vec<VendorItem>>> {
    let registry = state.orchestrator.registry();
    let data = registry
        .names()
        .iter()
        .map(|name| VendorItem {
            name: name.clone(),
            categories: registry.categories(name).to_vec(),
            requires_categories: registry.requires_categories(name),
        })
        .collect();

    Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    })
}
