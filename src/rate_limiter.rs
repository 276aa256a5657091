//! In-memory fixed-window rate limiting applied as an axum middleware.
//!
//! Requests are keyed by client IP (honouring `X-Forwarded-For` and
//! `X-Real-IP`). Counters live in a `DashMap` and reset when their window
//! expires; an optional background task evicts stale entries.

use crate::config::AppConfig;
use crate::errors::ErrorResponse;
use axum::{
    extract::{Request, State},
    http::{HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// Numeric strings are always valid header values; fall back to "0" for the
/// impossible case instead of panicking.
fn num_to_header_value<T: ToString>(n: T) -> HeaderValue {
    HeaderValue::from_str(&n.to_string()).unwrap_or_else(|_| HeaderValue::from_static("0"))
}

#[derive(Debug, Clone)]
struct RateLimitEntry {
    count: u32,
    window_start: Instant,
}

impl RateLimitEntry {
    fn new() -> Self {
        Self {
            count: 0,
            window_start: Instant::now(),
        }
    }

    /// Counts this request against the current window, resetting the window
    /// first if it has expired. Returns the count within the window.
    fn increment(&mut self, window: Duration) -> u32 {
        let now = Instant::now();
        if now.duration_since(self.window_start) >= window {
            self.count = 0;
            self.window_start = now;
        }
        self.count += 1;
        self.count
    }

    fn time_until_reset(&self, window: Duration) -> Duration {
        window.saturating_sub(self.window_start.elapsed())
    }
}

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub requests_per_window: u32,
    pub window_duration: Duration,
    pub enable_headers: bool,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_window: 100,
            window_duration: Duration::from_secs(60),
            enable_headers: true,
        }
    }
}

impl From<&AppConfig> for RateLimitConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            requests_per_window: config.rate_limit_requests_per_window,
            window_duration: Duration::from_secs(config.rate_limit_window_seconds),
            enable_headers: config.rate_limit_enable_headers,
        }
    }
}

#[derive(Debug)]
pub struct RateLimitResult {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    pub reset_time: Duration,
}

#[derive(Clone)]
pub struct RateLimiter {
    entries: Arc<DashMap<String, RateLimitEntry>>,
    config: RateLimitConfig,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            config,
        }
    }

    pub fn check_rate_limit(&self, key: &str) -> RateLimitResult {
        let mut entry = self
            .entries
            .entry(key.to_string())
            .or_insert_with(RateLimitEntry::new);

        let count = entry.increment(self.config.window_duration);
        let reset_time = entry.time_until_reset(self.config.window_duration);
        let limit = self.config.requests_per_window;

        RateLimitResult {
            allowed: count <= limit,
            limit,
            remaining: limit.saturating_sub(count),
            reset_time,
        }
    }

    /// Drops entries whose window has expired.
    pub fn cleanup_expired(&self) {
        let window = self.config.window_duration;
        let now = Instant::now();
        self.entries
            .retain(|_, entry| now.duration_since(entry.window_start) < window);
    }

    fn headers_enabled(&self) -> bool {
        self.config.enable_headers
    }
}

/// Rate limit key for a request: client IP from proxy headers when present.
fn extract_ip_key(request: &Request) -> String {
    if let Some(forwarded) = request.headers().get("x-forwarded-for") {
        if let Ok(forwarded_str) = forwarded.to_str() {
            if let Some(ip) = forwarded_str.split(',').next() {
                let ip = ip.trim();
                if !ip.is_empty() {
                    return format!("ip:{}", ip);
                }
            }
        }
    }

    if let Some(real_ip) = request.headers().get("x-real-ip") {
        if let Ok(ip_str) = real_ip.to_str() {
            return format!("ip:{}", ip_str);
        }
    }

    "ip:unknown".to_string()
}

fn apply_headers(response: &mut Response, result: &RateLimitResult) {
    let headers = response.headers_mut();
    headers.insert("x-ratelimit-limit", num_to_header_value(result.limit));
    headers.insert(
        "x-ratelimit-remaining",
        num_to_header_value(result.remaining),
    );
    headers.insert(
        "x-ratelimit-reset",
        num_to_header_value(result.reset_time.as_secs()),
    );
}

/// Axum middleware enforcing the per-IP fixed window.
pub async fn rate_limit_middleware(
    State(limiter): State<Arc<RateLimiter>>,
    request: Request,
    next: Next,
) -> Response {
    let key = extract_ip_key(&request);
    let result = limiter.check_rate_limit(&key);

    if !result.allowed {
        debug!("Rate limit exceeded for {}", key);
        let body = ErrorResponse {
            error: "Too Many Requests".to_string(),
            message: "Rate limit exceeded; retry later".to_string(),
            details: None,
            timestamp: Utc::now().to_rfc3339(),
        };
        let mut response = (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response();
        if limiter.headers_enabled() {
            apply_headers(&mut response, &result);
            response.headers_mut().insert(
                "retry-after",
                num_to_header_value(result.reset_time.as_secs().max(1)),
            );
        }
        return response;
    }

    let mut response = next.run(request).await;
    if limiter.headers_enabled() {
        apply_headers(&mut response, &result);
    }
    response
}

/// Periodically evicts expired windows so the map does not grow unbounded.
pub async fn start_cleanup_task(limiter: Arc<RateLimiter>, interval: Duration) {
    let mut ticker = tokio::time::interval(interval);
    loop {
        ticker.tick().await;
        limiter.cleanup_expired();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(limit: u32, window_secs: u64) -> RateLimiter {
        RateLimiter::new(RateLimitConfig {
            requests_per_window: limit,
            window_duration: Duration::from_secs(window_secs),
            enable_headers: true,
        })
    }

    #[test]
    fn allows_up_to_the_limit() {
        let limiter = limiter(3, 60);
        for _ in 0..3 {
            assert!(limiter.check_rate_limit("ip:10.0.0.1").allowed);
        }
        let result = limiter.check_rate_limit("ip:10.0.0.1");
        assert!(!result.allowed);
        assert_eq!(result.remaining, 0);
    }

    #[test]
    fn keys_are_isolated() {
        let limiter = limiter(1, 60);
        assert!(limiter.check_rate_limit("ip:10.0.0.1").allowed);
        assert!(!limiter.check_rate_limit("ip:10.0.0.1").allowed);
        assert!(limiter.check_rate_limit("ip:10.0.0.2").allowed);
    }

    #[test]
    fn remaining_counts_down() {
        let limiter = limiter(5, 60);
        assert_eq!(limiter.check_rate_limit("k").remaining, 4);
        assert_eq!(limiter.check_rate_limit("k").remaining, 3);
        assert_eq!(limiter.check_rate_limit("k").remaining, 2);
    }

    #[test]
    fn cleanup_keeps_live_windows() {
        let limiter = limiter(5, 60);
        limiter.check_rate_limit("k");
        limiter.cleanup_expired();
        // Window still open, so the second request counts against it
        assert_eq!(limiter.check_rate_limit("k").remaining, 3);
    }
}
