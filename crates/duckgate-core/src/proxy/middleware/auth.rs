//! Inbound bearer authentication.
//!
//! Active only when an API key is configured. Liveness routes and CORS
//! preflight are always allowed through. Missing or malformed credentials
//! get 401, a wrong key gets 403; the comparison is constant-time.

use axum::{
    extract::{Request, State},
    http::{header, Method, StatusCode},
    middleware::Next,
    response::Response,
};
use subtle::ConstantTimeEq;

use crate::proxy::handlers::error_response;
use crate::proxy::server::AppState;

fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

fn is_open_route(path: &str) -> bool {
    path == "/" || path == "/ping"
}

pub async fn auth_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    if state.config.api_key.is_empty()
        || is_open_route(request.uri().path())
        || request.method() == Method::OPTIONS
    {
        return next.run(request).await;
    }

    let bearer = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "));

    match bearer {
        None => error_response(
            StatusCode::UNAUTHORIZED,
            "Unauthorized: Missing or invalid Authorization header",
        ),
        Some(key) if !constant_time_compare(key, &state.config.api_key) => {
            tracing::warn!("rejected request with invalid API key");
            error_response(StatusCode::FORBIDDEN, "Forbidden: Invalid API key")
        },
        Some(_) => next.run(request).await,
    }
}
