//! Browser header emulation for upstream requests.
//!
//! The upstream only serves its own web client, so every call carries a
//! realistic browser header set. The User-Agent is drawn from a fixed pool,
//! either rotated per request or pinned to the pool's first entry.

use rand::Rng;
use reqwest::header::{self, HeaderMap, HeaderValue};

/// Browser User-Agent strings the upstream sees from us.
const USER_AGENT_POOL: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36 Edg/119.0.0.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:120.0) Gecko/20100101 Firefox/120.0",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
];

/// Pick a User-Agent from the pool.
pub fn pick_user_agent(rotate: bool) -> &'static str {
    if rotate {
        let idx = rand::thread_rng().gen_range(0..USER_AGENT_POOL.len());
        USER_AGENT_POOL[idx]
    } else {
        USER_AGENT_POOL[0]
    }
}

/// Build the browser-emulation header set for one upstream request.
///
/// The `dcm` cookie value is randomized per request, matching what the
/// upstream's own web client sends. `Accept-Encoding` is intentionally left
/// to reqwest so the response body stays decodable.
pub fn browser_headers(rotate_user_agent: bool) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(header::ACCEPT, HeaderValue::from_static("*/*"));
    headers.insert(
        header::ACCEPT_LANGUAGE,
        HeaderValue::from_static("zh-CN,zh;q=0.9,en;q=0.8"),
    );
    headers.insert(header::ORIGIN, HeaderValue::from_static("https://duckduckgo.com/"));
    headers.insert(header::REFERER, HeaderValue::from_static("https://duckduckgo.com/"));
    let dcm = rand::thread_rng().gen_range(1..=5);
    if let Ok(cookie) = HeaderValue::from_str(&format!("dcm={}", dcm)) {
        headers.insert(header::COOKIE, cookie);
    }
    headers.insert(header::DNT, HeaderValue::from_static("1"));
    headers.insert("Priority", HeaderValue::from_static("u=1, i"));
    headers.insert(
        "Sec-Ch-Ua",
        HeaderValue::from_static("\"Chromium\";v=\"120\", \"Not?A_Brand\";v=\"99\""),
    );
    headers.insert("Sec-Ch-Ua-Mobile", HeaderValue::from_static("?0"));
    headers.insert("Sec-Ch-Ua-Platform", HeaderValue::from_static("\"Windows\""));
    headers.insert("Sec-Fetch-Dest", HeaderValue::from_static("empty"));
    headers.insert("Sec-Fetch-Mode", HeaderValue::from_static("cors"));
    headers.insert("Sec-Fetch-Site", HeaderValue::from_static("same-origin"));
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
    headers.insert(
        header::USER_AGENT,
        HeaderValue::from_static(pick_user_agent(rotate_user_agent)),
    );
    headers
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_user_agent_is_pool_head() {
        assert_eq!(pick_user_agent(false), USER_AGENT_POOL[0]);
    }

    #[test]
    fn test_rotated_user_agent_comes_from_pool() {
        for _ in 0..50 {
            let ua = pick_user_agent(true);
            assert!(USER_AGENT_POOL.contains(&ua));
        }
    }

    #[test]
    fn test_headers_carry_upstream_origin_and_ua() {
        let headers = browser_headers(false);
        assert_eq!(headers[header::ORIGIN], "https://duckduckgo.com/");
        assert_eq!(headers[header::USER_AGENT], USER_AGENT_POOL[0]);
        let cookie = headers[header::COOKIE].to_str().unwrap();
        assert!(cookie.starts_with("dcm="));
        let n: u8 = cookie.trim_start_matches("dcm=").parse().unwrap();
        assert!((1..=5).contains(&n));
    }
}
