// HTTP handlers for the OpenAI-compatible surface.

pub mod chat;
pub mod models;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;

pub use chat::handle_chat_completions;
pub use models::handle_list_models;

pub async fn handle_root() -> impl IntoResponse {
    Json(json!({ "message": "duckgate is running" }))
}

pub async fn handle_ping() -> impl IntoResponse {
    Json(json!({ "message": "pong" }))
}

/// Uniform `{"error": ...}` body used by handlers and middleware.
pub fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "error": message.into() }))).into_response()
}
