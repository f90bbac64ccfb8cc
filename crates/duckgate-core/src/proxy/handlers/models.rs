// Static model catalog. The upstream exposes a fixed set; availability
// beyond this list is not validated.
use axum::response::{IntoResponse, Json};
use serde_json::json;

pub async fn handle_list_models() -> impl IntoResponse {
    Json(json!({
        "object": "list",
        "data": [
            { "id": "gpt-4o-mini", "object": "model", "owned_by": "ddg" },
            { "id": "claude-3-haiku", "object": "model", "owned_by": "ddg" },
            { "id": "llama-3.1-70b", "object": "model", "owned_by": "ddg" },
            { "id": "mixtral-8x7b", "object": "model", "owned_by": "ddg" },
        ]
    }))
}
