//! Fixed-window in-memory rate limiting for credential endpoints.

use dashmap::DashMap;
use once_cell::sync::Lazy;
use std::time::{Duration, Instant};

use axum::http::HeaderMap;

struct Bucket {
    count: u32,
    window_start: Instant,
}

static BUCKETS: Lazy<DashMap<String, Bucket>> = Lazy::new(DashMap::new);

pub fn check(key: &str, limit: u32, window_secs: u64) -> bool {
    let mut entry = BUCKETS.entry(key.to_string()).or_insert_with(|| Bucket {
        count: 0,
        window_start: Instant::now(),
    });

    if entry.window_start.elapsed() > Duration::from_secs(window_secs) {
        entry.count = 0;
        entry.window_start = Instant::now();
    }

    if entry.count >= limit {
        return false;
    }
    entry.count += 1;
    true
}

/// Rate-limit key for a request: the forwarded client IP, or a shared
/// "unknown" bucket so unproxied clients are still limited.
pub fn client_key(headers: &HeaderMap) -> String {
    extract_ip(headers).unwrap_or_else(|| "unknown".into())
}

/// Client IP from `x-forwarded-for` (first hop), if present.
pub fn extract_ip(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enforces_the_limit_within_a_window() {
        let key = "10.0.0.1:test-limit";
        assert!(check(key, 2, 60));
        assert!(check(key, 2, 60));
        assert!(!check(key, 2, 60));
    }

    #[test]
    fn extracts_first_forwarded_hop() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", "203.0.113.9, 10.0.0.1".parse().unwrap());
        assert_eq!(extract_ip(&headers).as_deref(), Some("203.0.113.9"));
        assert_eq!(extract_ip(&HeaderMap::new()), None);
    }

    #[test]
    fn unproxied_clients_share_the_unknown_bucket() {
        assert_eq!(client_key(&HeaderMap::new()), "unknown");

        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", "203.0.113.9".parse().unwrap());
        assert_eq!(client_key(&headers), "203.0.113.9");
    }
}
