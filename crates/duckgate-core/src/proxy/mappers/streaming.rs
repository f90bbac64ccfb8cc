//! Decoding of the upstream byte stream into OpenAI-shaped output.
//!
//! The upstream delivers `data: <json-or-marker>` lines in arbitrarily sized
//! physical reads; one logical line can be split across reads. The
//! [`StreamDecoder`] reassembles logical lines and yields decode events; the
//! two adapters below turn those events into either an SSE frame stream or a
//! single aggregated completion object.

use bytes::Bytes;
use chrono::Utc;
use futures::{Stream, StreamExt};
use rand::Rng;
use serde_json::{json, Value};
use std::pin::Pin;

use crate::error::ProxyError;

/// Length of the `data: ` line prefix.
const EVENT_PREFIX_LEN: usize = 6;
/// Literal termination marker carried after the prefix on the final line.
const DONE_MARKER: &str = "[DONE]";

/// One decoded upstream event.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodeEvent {
    /// An incremental text fragment, with the model id the upstream reported
    /// for it (when present in the payload).
    Delta { model: Option<String>, text: String },
    /// The terminal marker was seen; no further events follow.
    Stop,
}

/// Reassembles logical `data:` lines from physical reads.
///
/// One instance per in-flight upstream stream; owns the pending fragment and
/// the running aggregate text. Never shared across requests.
#[derive(Debug, Default)]
pub struct StreamDecoder {
    /// Incomplete trailing text held over from the previous read.
    pending: String,
    /// All message fragments seen so far, in arrival order.
    aggregate: String,
    done: bool,
}

impl StreamDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Concatenation of every message fragment decoded so far.
    pub fn aggregate(&self) -> &str {
        &self.aggregate
    }

    /// Whether the terminal marker has been seen.
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Feed one physical read and return the events it completed.
    ///
    /// A read whose combined text does not end in `"}` (and carries no
    /// terminal marker) is held back verbatim as the pending fragment and
    /// produces no events; the next read completes it. This suffix test is
    /// the upstream-compatible completeness heuristic: it assumes complete
    /// payload lines always end in `"}`.
    pub fn feed(&mut self, bytes: &[u8]) -> Result<Vec<DecodeEvent>, ProxyError> {
        if self.done {
            return Ok(Vec::new());
        }

        let mut text = String::from_utf8_lossy(bytes).trim().to_string();
        if !self.pending.is_empty() {
            text.insert_str(0, &self.pending);
            self.pending.clear();
        }

        if !text.contains(DONE_MARKER) && !text.ends_with("\"}") {
            self.pending = text;
            return Ok(Vec::new());
        }

        let mut events = Vec::new();
        for line in text.split('\n') {
            let Some(payload) = line.get(EVENT_PREFIX_LEN..) else {
                continue;
            };
            if payload == DONE_MARKER {
                self.done = true;
                events.push(DecodeEvent::Stop);
                // Nothing after the terminal marker is processed.
                break;
            }
            let value: Value = serde_json::from_str(payload).map_err(|e| {
                ProxyError::Protocol(format!("unparseable upstream event: {}", e))
            })?;
            if value.get("action").and_then(Value::as_str) != Some("success") {
                return Err(ProxyError::Protocol(format!(
                    "unexpected action in upstream event: {}",
                    value.get("action").cloned().unwrap_or(Value::Null)
                )));
            }
            if let Some(message) = value.get("message").and_then(Value::as_str) {
                if !message.is_empty() {
                    self.aggregate.push_str(message);
                    events.push(DecodeEvent::Delta {
                        model: value
                            .get("model")
                            .and_then(Value::as_str)
                            .map(|m| m.to_string()),
                        text: message.to_string(),
                    });
                }
            }
        }
        Ok(events)
    }
}

/// Turn the raw upstream byte stream into OpenAI SSE frames.
///
/// Emits one `data: <chunk>\n\n` frame per delta and one terminal frame with
/// `finish_reason: "stop"`; the stream then closes without a `[DONE]` frame.
/// An upstream read error mid-stream closes the output (client sees
/// truncation); a protocol violation surfaces as the stream error item.
pub fn into_sse_stream(
    mut upstream: Pin<Box<dyn Stream<Item = Result<Bytes, reqwest::Error>> + Send>>,
    model: String,
) -> Pin<Box<dyn Stream<Item = Result<Bytes, ProxyError>> + Send>> {
    let stream_id = completion_id();
    let created = Utc::now().timestamp();
    let mut decoder = StreamDecoder::new();

    let stream = async_stream::stream! {
        while let Some(read) = upstream.next().await {
            let bytes = match read {
                Ok(b) => b,
                Err(e) => {
                    tracing::warn!("upstream read failed mid-stream: {}", e);
                    break;
                },
            };
            let events = match decoder.feed(&bytes) {
                Ok(events) => events,
                Err(e) => {
                    tracing::warn!("stream decode failed: {}", e);
                    yield Err(e);
                    break;
                },
            };
            for event in events {
                match event {
                    DecodeEvent::Delta { model: event_model, text } => {
                        let chunk_model = event_model.as_deref().unwrap_or(&model);
                        yield Ok(sse_frame(&delta_chunk(&stream_id, created, chunk_model, &text)));
                    },
                    DecodeEvent::Stop => {
                        yield Ok(sse_frame(&stop_chunk(&stream_id, created, &model)));
                    },
                }
            }
            if decoder.is_done() {
                break;
            }
        }
    };

    Box::pin(stream)
}

/// Drain the upstream stream and build the single aggregated completion
/// object for the non-streaming path. Intermediate deltas are suppressed.
pub async fn collect_completion<S>(upstream: S, model: &str) -> Result<Value, ProxyError>
where
    S: Stream<Item = Result<Bytes, reqwest::Error>>,
{
    let mut upstream = std::pin::pin!(upstream);
    let mut decoder = StreamDecoder::new();
    while let Some(read) = upstream.next().await {
        let bytes = read.map_err(|e| ProxyError::Connection(e.to_string()))?;
        decoder.feed(&bytes)?;
        if decoder.is_done() {
            break;
        }
    }
    Ok(full_completion(&completion_id(), Utc::now().timestamp(), model, decoder.aggregate()))
}

/// Random `chatcmpl-` identifier shared by every chunk of one response.
fn completion_id() -> String {
    const CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
    let mut rng = rand::thread_rng();
    let random_str: String = (0..28)
        .map(|_| {
            let idx = rng.gen_range(0..CHARSET.len());
            CHARSET[idx] as char
        })
        .collect();
    format!("chatcmpl-{}", random_str)
}

fn sse_frame(chunk: &Value) -> Bytes {
    Bytes::from(format!("data: {}\n\n", chunk))
}

fn delta_chunk(id: &str, created: i64, model: &str, text: &str) -> Value {
    json!({
        "id": id,
        "object": "chat.completion.chunk",
        "created": created,
        "model": model,
        "choices": [{
            "index": 0,
            "delta": { "content": text },
            "finish_reason": null
        }]
    })
}

fn stop_chunk(id: &str, created: i64, model: &str) -> Value {
    json!({
        "id": id,
        "object": "chat.completion.chunk",
        "created": created,
        "model": model,
        "choices": [{
            "index": 0,
            "delta": {},
            "finish_reason": "stop"
        }]
    })
}

fn full_completion(id: &str, created: i64, model: &str, text: &str) -> Value {
    json!({
        "id": id,
        "object": "chat.completion",
        "created": created,
        "model": model,
        "usage": {
            "prompt_tokens": 0,
            "completion_tokens": 0,
            "total_tokens": 0
        },
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": text },
            "finish_reason": "stop"
        }]
    })
}
