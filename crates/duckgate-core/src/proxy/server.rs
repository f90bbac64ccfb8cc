//! Router assembly and shared application state.

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::Config;
use crate::proxy::{handlers, middleware, upstream::UpstreamClient};

/// Shared state: the immutable config and the upstream session client.
/// Everything per-request (retry state, decoder) lives in the handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub upstream: Arc<UpstreamClient>,
}

/// Build the gateway router. Fails only if the HTTP client stack cannot be
/// constructed (bad proxy configuration is skipped, not fatal).
pub fn build_router(config: Config) -> Result<Router, String> {
    let upstream = Arc::new(UpstreamClient::new(&config)?);
    let state = AppState { config: Arc::new(config), upstream };

    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    let prefix = &state.config.api_prefix;
    let router = Router::new()
        .route("/", get(handlers::handle_root))
        .route("/ping", get(handlers::handle_ping))
        .route(&format!("{}/v1/models", prefix), get(handlers::handle_list_models))
        .route(
            &format!("{}/v1/chat/completions", prefix),
            post(handlers::handle_chat_completions),
        )
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth_middleware,
        ))
        // CORS outermost so preflight is answered before auth.
        .layer(cors)
        .with_state(state);

    Ok(router)
}
