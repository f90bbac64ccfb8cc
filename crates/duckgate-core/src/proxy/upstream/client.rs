//! The upstream session client: vqd token handshake plus completion
//! submission, retried as one cycle.
//!
//! Tokens are single-use and likely replay-bound, so a retry never reuses
//! one — every attempt performs its own handshake before submitting.

use reqwest::header;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, warn};

use super::emulation;
use super::proxy_pool::ProxyPicker;
use crate::config::Config;
use crate::error::ProxyError;

const STATUS_PATH: &str = "/duckchat/v1/status";
const CHAT_PATH: &str = "/duckchat/v1/chat";

/// Header asking the status endpoint to mint a fresh token.
const VQD_ACCEPT_HEADER: &str = "x-vqd-accept";
/// Header carrying the token, on the status response and the chat request.
const VQD_TOKEN_HEADER: &str = "x-vqd-4";

pub struct UpstreamClient {
    picker: ProxyPicker,
    base_url: String,
    max_retry_count: u32,
    retry_delay: Duration,
    jitter_enabled: bool,
    retry_jitter_ms: u64,
    rotate_user_agent: bool,
}

impl UpstreamClient {
    pub fn new(config: &Config) -> Result<Self, String> {
        Ok(Self {
            picker: ProxyPicker::new(config.use_proxy, &config.proxy_list)?,
            base_url: config.upstream_url.clone(),
            max_retry_count: config.max_retry_count.max(1),
            retry_delay: Duration::from_millis(config.retry_delay_ms),
            jitter_enabled: config.retry_delay_random,
            retry_jitter_ms: config.retry_jitter_ms,
            rotate_user_agent: config.rotate_user_agent,
        })
    }

    /// One handshake round trip. The token comes back in a response header;
    /// a missing or empty header is a transient failure the caller retries.
    async fn acquire_token(&self, client: &reqwest::Client) -> Result<String, ProxyError> {
        let response = client
            .get(format!("{}{}", self.base_url, STATUS_PATH))
            .headers(emulation::browser_headers(self.rotate_user_agent))
            .header(VQD_ACCEPT_HEADER, "1")
            .send()
            .await?;
        let token = response
            .headers()
            .get(VQD_TOKEN_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        if token.is_empty() {
            return Err(ProxyError::MissingToken);
        }
        Ok(token)
    }

    /// One acquire+submit cycle against the upstream.
    async fn submit_once(
        &self,
        upstream_model: &str,
        flattened_content: &str,
    ) -> Result<reqwest::Response, ProxyError> {
        let client = self.picker.pick();
        let token = self.acquire_token(client).await?;
        debug!("acquired session token ({} chars)", token.len());

        let body = json!({
            "model": upstream_model,
            "messages": [{ "role": "user", "content": flattened_content }]
        });
        let mut headers = emulation::browser_headers(self.rotate_user_agent);
        headers.insert(header::ACCEPT, header::HeaderValue::from_static("text/event-stream"));
        let response = client
            .post(format!("{}{}", self.base_url, CHAT_PATH))
            .headers(headers)
            .header(VQD_TOKEN_HEADER, token)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProxyError::UpstreamStatus(status.as_u16()));
        }
        Ok(response)
    }

    /// Submit a completion, retrying the whole token+submit cycle on
    /// transient failure. Returns the raw response with its body unconsumed.
    pub async fn submit(
        &self,
        upstream_model: &str,
        flattened_content: &str,
    ) -> Result<reqwest::Response, ProxyError> {
        let mut attempt = 1u32;
        loop {
            match self.submit_once(upstream_model, flattened_content).await {
                Ok(response) => return Ok(response),
                Err(e) if e.is_transient() && attempt < self.max_retry_count => {
                    let delay = self.retry_delay + self.jitter();
                    warn!(
                        "upstream attempt {}/{} failed ({}), retrying in {}ms",
                        attempt,
                        self.max_retry_count,
                        e,
                        delay.as_millis()
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                },
                Err(e) if e.is_transient() => {
                    return Err(ProxyError::Exhausted { attempts: attempt, last: e.to_string() });
                },
                Err(e) => return Err(e),
            }
        }
    }

    fn jitter(&self) -> Duration {
        if !self.jitter_enabled || self.retry_jitter_ms == 0 {
            return Duration::ZERO;
        }
        use rand::Rng;
        Duration::from_millis(rand::thread_rng().gen_range(0..=self.retry_jitter_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(upstream_url: &str) -> Config {
        Config {
            upstream_url: upstream_url.to_string(),
            retry_delay_ms: 0,
            retry_delay_random: false,
            ..Config::default()
        }
    }

    #[test]
    fn test_jitter_disabled_is_zero() {
        let client = UpstreamClient::new(&test_config("http://127.0.0.1:1")).unwrap();
        assert_eq!(client.jitter(), Duration::ZERO);
    }

    #[test]
    fn test_jitter_bounded() {
        let config = Config {
            retry_delay_random: true,
            retry_jitter_ms: 50,
            ..test_config("http://127.0.0.1:1")
        };
        let client = UpstreamClient::new(&config).unwrap();
        for _ in 0..100 {
            assert!(client.jitter() <= Duration::from_millis(50));
        }
    }

    #[test]
    fn test_retry_count_floor_is_one() {
        let config = Config { max_retry_count: 0, ..test_config("http://127.0.0.1:1") };
        let client = UpstreamClient::new(&config).unwrap();
        assert_eq!(client.max_retry_count, 1);
    }
}
