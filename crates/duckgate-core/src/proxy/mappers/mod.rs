// Request and stream mapping between the OpenAI wire format and the upstream.

pub mod request;
pub mod streaming;

pub use request::{flatten_messages, map_model, ChatMessage, ChatRequest, MessageContent};
pub use streaming::{collect_completion, into_sse_stream, StreamDecoder};
