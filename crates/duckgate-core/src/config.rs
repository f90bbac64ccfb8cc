//! Process configuration, loaded once from the environment at startup.
//!
//! The resulting `Config` is immutable and handed to each component at
//! construction; nothing reads the environment after startup.

const DEFAULT_UPSTREAM_URL: &str = "https://duckduckgo.com";
const DEFAULT_PORT: u16 = 8787;
const DEFAULT_MAX_RETRY_COUNT: u32 = 3;
const DEFAULT_RETRY_DELAY_MS: u64 = 10_000;
const DEFAULT_RETRY_JITTER_MS: u64 = 5_000;

/// Runtime configuration for the gateway.
#[derive(Debug, Clone)]
pub struct Config {
    /// TCP port the server binds to.
    pub port: u16,
    /// Prefix prepended to the `/v1/*` routes. Empty or `/some/path`.
    pub api_prefix: String,
    /// Inbound bearer key. Empty disables inbound auth.
    pub api_key: String,
    /// Total acquire+submit attempts per request, including the first.
    pub max_retry_count: u32,
    /// Base delay between attempts, in milliseconds.
    pub retry_delay_ms: u64,
    /// Whether a random jitter is added on top of the base delay.
    pub retry_delay_random: bool,
    /// Upper bound of the random jitter, in milliseconds.
    pub retry_jitter_ms: u64,
    /// Route upstream calls through a proxy from `proxy_list`.
    pub use_proxy: bool,
    /// Outbound proxy URLs (http/https/socks5 schemes).
    pub proxy_list: Vec<String>,
    /// Pick a random User-Agent per upstream request instead of a fixed one.
    pub rotate_user_agent: bool,
    /// Upstream base URL, overridable for testing.
    pub upstream_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            api_prefix: String::new(),
            api_key: String::new(),
            max_retry_count: DEFAULT_MAX_RETRY_COUNT,
            retry_delay_ms: DEFAULT_RETRY_DELAY_MS,
            retry_delay_random: true,
            retry_jitter_ms: DEFAULT_RETRY_JITTER_MS,
            use_proxy: false,
            proxy_list: Vec::new(),
            rotate_user_agent: true,
            upstream_url: DEFAULT_UPSTREAM_URL.to_string(),
        }
    }
}

impl Config {
    /// Load configuration from the environment, falling back to defaults
    /// (with a warning) on missing or unparseable values.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            port: env_parse("PORT", defaults.port),
            api_prefix: normalize_prefix(&env_string("API_PREFIX")),
            api_key: env_string("API_KEY"),
            max_retry_count: env_parse("MAX_RETRY_COUNT", defaults.max_retry_count).max(1),
            retry_delay_ms: env_parse("RETRY_DELAY", defaults.retry_delay_ms),
            retry_delay_random: env_string("RETRY_DELAY_RANDOM") != "false",
            retry_jitter_ms: env_parse("RETRY_JITTER", defaults.retry_jitter_ms),
            use_proxy: env_string("USE_PROXY") == "true",
            proxy_list: parse_proxy_list(&env_string("PROXY_LIST")),
            rotate_user_agent: env_string("ROTATE_USER_AGENT") != "false",
            upstream_url: resolve_upstream_url(),
        }
    }
}

fn env_string(key: &str) -> String {
    std::env::var(key).map(|v| v.trim().to_string()).unwrap_or_default()
}

fn env_parse<T: std::str::FromStr + Copy>(key: &str, default: T) -> T {
    let raw = env_string(key);
    if raw.is_empty() {
        return default;
    }
    match raw.parse() {
        Ok(v) => v,
        Err(_) => {
            tracing::warn!("{} is not a valid value, using default", key);
            default
        },
    }
}

/// Parse the `PROXY_LIST` env value, a JSON array of proxy URLs.
pub fn parse_proxy_list(raw: &str) -> Vec<String> {
    if raw.is_empty() {
        return Vec::new();
    }
    match serde_json::from_str::<Vec<String>>(raw) {
        Ok(list) => list,
        Err(e) => {
            tracing::warn!("PROXY_LIST is not a JSON array of strings ({}), ignoring", e);
            Vec::new()
        },
    }
}

/// Normalize `API_PREFIX` to either an empty string or `/<path>` with no
/// trailing slash, so it can be glued directly in front of `/v1/...`.
pub fn normalize_prefix(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() || trimmed == "/" {
        return String::new();
    }
    if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    }
}

fn resolve_upstream_url() -> String {
    let raw = env_string("DUCKGATE_UPSTREAM_URL");
    if raw.is_empty() {
        return DEFAULT_UPSTREAM_URL.to_string();
    }
    let url = raw.trim_end_matches('/').to_string();
    if url::Url::parse(&url).is_err() {
        tracing::warn!("DUCKGATE_UPSTREAM_URL is not a valid URL, using default");
        return DEFAULT_UPSTREAM_URL.to_string();
    }
    url
}
