//! The chat-completions handler: flatten, map, submit with retry, decode.

use axum::{
    body::Body,
    extract::{rejection::JsonRejection, Json, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use futures::StreamExt;
use tracing::{debug, warn};

use super::error_response;
use crate::error::ProxyError;
use crate::proxy::mappers::{
    collect_completion, flatten_messages, into_sse_stream, map_model, ChatRequest,
};
use crate::proxy::server::AppState;

fn status_for(error: &ProxyError) -> StatusCode {
    match error {
        ProxyError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub async fn handle_chat_completions(
    State(state): State<AppState>,
    body: Result<Json<ChatRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match body {
        Ok(body) => body,
        Err(e) => {
            return error_response(
                StatusCode::BAD_REQUEST,
                ProxyError::InvalidRequest(e.body_text()).to_string(),
            );
        },
    };

    let upstream_model = map_model(&request.model);
    let flattened_content = flatten_messages(&request.messages);
    debug!(
        model = %request.model,
        upstream_model,
        stream = request.stream,
        "chat completion received"
    );

    let response = match state.upstream.submit(upstream_model, &flattened_content).await {
        Ok(response) => response,
        Err(e) => {
            warn!("completion submission failed: {}", e);
            return error_response(status_for(&e), e.to_string());
        },
    };

    let byte_stream = response.bytes_stream();

    if request.stream {
        let sse = into_sse_stream(Box::pin(byte_stream), upstream_model.to_string());
        // A decode failure mid-stream terminates the body; the client sees
        // truncation rather than a clean terminal chunk.
        let body = Body::from_stream(sse.map(|r| r.map_err(std::io::Error::other)));
        Response::builder()
            .header(header::CONTENT_TYPE, "text/event-stream")
            .header(header::CACHE_CONTROL, "no-cache")
            .header(header::CONNECTION, "keep-alive")
            .body(body)
            .expect("valid streaming response")
    } else {
        match collect_completion(byte_stream, upstream_model).await {
            Ok(completion) => Json(completion).into_response(),
            Err(e) => {
                warn!("completion decoding failed: {}", e);
                error_response(status_for(&e), e.to_string())
            },
        }
    }
}
