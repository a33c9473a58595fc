use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{
        header::{AUTHORIZATION, RETRY_AFTER, USER_AGENT},
        HeaderMap, HeaderValue,
    },
    middleware::Next,
    response::{IntoResponse, Response},
};
use pricewatch_core::Permission;
use pricewatch_guard::{AccessGuard, AccessRequest, GuardRejection, TokenRecord};
use uuid::Uuid;

use crate::api::ApiError;

const API_TOKEN_HEADER: &str = "x-api-token";

/// Newtype wrapping a request ID string, stored as a request extension.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// Token that passed the guard, stored as a request extension for handlers.
#[derive(Debug, Clone)]
pub struct AuthenticatedToken(pub Arc<TokenRecord>);

/// State for one guarded route group: the shared guard plus the permission
/// every route in the group requires.
#[derive(Clone)]
pub struct GuardState {
    guard: Arc<AccessGuard>,
    permission: Permission,
}

impl GuardState {
    pub fn new(guard: Arc<AccessGuard>, permission: Permission) -> Self {
        Self { guard, permission }
    }
}

/// Axum middleware that extracts or generates a request ID.
///
/// An incoming `x-request-id` header is reused; otherwise a new `UUIDv4` is
/// generated. The ID is stored as [`RequestId`] and echoed on the response.
pub async fn request_id(mut req: Request, next: Next) -> Response {
    let id = req
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map_or_else(|| Uuid::new_v4().to_string(), String::from);

    req.extensions_mut().insert(RequestId(id.clone()));

    let mut res = next.run(req).await;

    if let Ok(val) = HeaderValue::from_str(&id) {
        res.headers_mut().insert("x-request-id", val);
    }

    res
}

/// Runs the access guard for the route group's permission.
///
/// The caller IP comes from the connection's peer address; without one
/// (e.g. in-process tests) only tokens without an IP allow-list pass.
pub async fn require_permission(
    State(state): State<GuardState>,
    mut req: Request,
    next: Next,
) -> Response {
    let request_id = req
        .extensions()
        .get::<RequestId>()
        .map(|r| r.0.clone())
        .unwrap_or_default();
    let ip = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());

    let decision = {
        let access = AccessRequest {
            credential: extract_credential(req.headers()),
            ip,
            method: req.method().as_str(),
            path: req.uri().path(),
            user_agent: req.headers().get(USER_AGENT).and_then(|v| v.to_str().ok()),
        };
        state.guard.authorize(&access, state.permission)
    };

    match decision {
        Ok(record) => {
            req.extensions_mut().insert(AuthenticatedToken(record));
            next.run(req).await
        }
        Err(rejection) => rejection_response(request_id, rejection),
    }
}

fn rejection_response(request_id: String, rejection: GuardRejection) -> Response {
    let mut res = ApiError::new(request_id, rejection.code(), rejection.to_string()).into_response();
    if let GuardRejection::RateLimited(limit) = rejection {
        res.headers_mut()
            .insert(RETRY_AFTER, HeaderValue::from(limit.retry_after_secs()));
    }
    res
}

/// `X-API-Token` wins over `Authorization: Bearer`. Blank values count as
/// absent.
fn extract_credential(headers: &HeaderMap) -> Option<&str> {
    let from_token_header = headers
        .get(API_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty());

    from_token_header.or_else(|| {
        headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|s| !s.is_empty())
    })
}
