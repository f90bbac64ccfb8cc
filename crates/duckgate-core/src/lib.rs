//! duckgate core: an OpenAI-compatible gateway over the DuckDuckGo chat upstream.
//!
//! The library owns everything between the HTTP surface and the upstream:
//! configuration, the error taxonomy, request mapping (model names, message
//! flattening), the per-request vqd session handshake with retry, and the
//! decoder that turns the upstream byte stream into OpenAI-shaped output.

pub mod config;
pub mod error;
pub mod proxy;

pub use config::Config;
pub use error::ProxyError;
