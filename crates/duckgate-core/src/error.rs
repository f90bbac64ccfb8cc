//! Error taxonomy for the gateway.
//!
//! Three classes with different propagation behavior:
//! - transient upstream failures are retried up to the configured ceiling;
//! - protocol violations in the upstream stream fail immediately;
//! - invalid client input fails immediately with a 4xx.

use thiserror::Error;

/// Errors surfaced by the gateway core.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// Network-level failure talking to the upstream.
    #[error("Upstream request failed: {0}")]
    Connection(String),

    /// Upstream answered with a non-success HTTP status.
    #[error("Upstream returned HTTP {0}")]
    UpstreamStatus(u16),

    /// The handshake response carried no usable `x-vqd-4` token.
    #[error("Upstream issued no session token")]
    MissingToken,

    /// All retry attempts were spent on transient failures.
    #[error("Upstream unavailable after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: String },

    /// The upstream stream violated its own wire contract.
    #[error("Upstream protocol violation: {0}")]
    Protocol(String),

    /// The inbound request was malformed or unsupported.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl ProxyError {
    /// Transient failures re-enter the acquire+submit retry cycle;
    /// everything else is terminal on first occurrence.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ProxyError::Connection(_) | ProxyError::UpstreamStatus(_) | ProxyError::MissingToken
        )
    }
}

impl From<reqwest::Error> for ProxyError {
    fn from(e: reqwest::Error) -> Self {
        ProxyError::Connection(e.to_string())
    }
}
