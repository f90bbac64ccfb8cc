//! Outbound proxy selection.
//!
//! Each configured proxy URL gets its own `reqwest::Client` built once at
//! startup, so connections are reused per proxy. Selection is random per
//! attempt. Invalid entries are skipped with a warning rather than failing
//! startup.

use rand::Rng;
use reqwest::Client;

/// A validated set of outbound proxy clients plus the direct client.
pub struct ProxyPicker {
    direct: Client,
    proxied: Vec<(String, Client)>,
    enabled: bool,
}

impl ProxyPicker {
    /// Build the picker from the configured proxy list.
    ///
    /// Clients carry no total-request timeout: an upstream call that hangs is
    /// only bounded by the caller's retry ceiling.
    pub fn new(use_proxy: bool, proxy_list: &[String]) -> Result<Self, String> {
        let direct = Client::builder()
            .build()
            .map_err(|e| format!("failed to build HTTP client: {}", e))?;

        let mut proxied = Vec::new();
        if use_proxy {
            for raw in proxy_list {
                match build_proxy_client(raw) {
                    Ok(client) => proxied.push((raw.clone(), client)),
                    Err(e) => tracing::warn!("skipping proxy '{}': {}", raw, e),
                }
            }
            if proxied.is_empty() {
                tracing::warn!("USE_PROXY is on but no usable proxy, falling back to direct");
            } else {
                tracing::info!("outbound proxy pool ready ({} entries)", proxied.len());
            }
        }

        Ok(Self { direct, enabled: use_proxy, proxied })
    }

    /// Pick the client for one upstream attempt: a random pool entry when
    /// proxying is enabled and the pool is non-empty, the direct client
    /// otherwise.
    pub fn pick(&self) -> &Client {
        if !self.enabled || self.proxied.is_empty() {
            return &self.direct;
        }
        let idx = rand::thread_rng().gen_range(0..self.proxied.len());
        let (url, client) = &self.proxied[idx];
        tracing::debug!("routing upstream attempt through proxy {}", url);
        client
    }
}

fn build_proxy_client(raw: &str) -> Result<Client, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err("empty proxy URL".to_string());
    }
    url::Url::parse(trimmed).map_err(|e| format!("invalid proxy URL: {}", e))?;
    let proxy = reqwest::Proxy::all(trimmed).map_err(|e| format!("unsupported proxy: {}", e))?;
    Client::builder().proxy(proxy).build().map_err(|e| format!("client build failed: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_pool_picks_direct() {
        let picker =
            ProxyPicker::new(false, &["socks5://127.0.0.1:1080".to_string()]).unwrap();
        assert!(picker.proxied.is_empty());
    }

    #[test]
    fn test_invalid_entries_are_skipped() {
        let picker = ProxyPicker::new(
            true,
            &["not a url".to_string(), "socks5://127.0.0.1:1080".to_string()],
        )
        .unwrap();
        assert_eq!(picker.proxied.len(), 1);
        assert_eq!(picker.proxied[0].0, "socks5://127.0.0.1:1080");
    }

    #[test]
    fn test_empty_pool_with_proxy_enabled_falls_back_to_direct() {
        let picker = ProxyPicker::new(true, &[]).unwrap();
        // pick() must not panic on an empty pool
        let _ = picker.pick();
    }
}
