//! Per-client rate limiting for the HTTP endpoints.
//!
//! Fixed-window counters keyed by client address. Each endpoint group
//! gets its own limiter with an independent budget, so a flood of spins
//! cannot starve wheel creation.

use axum::{
    body::Body,
    extract::State,
    http::{header, Request, Response, StatusCode},
    middleware::Next,
};
use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::RwLock;

use crate::incidents::{IncidentKind, IncidentRecorder};

/// Fixed-window request counter.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    /// Map of client key to (request count, window start)
    requests: Arc<RwLock<HashMap<String, (u32, Instant)>>>,
    max_requests: u32,
    window: Duration,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            requests: Arc::new(RwLock::new(HashMap::new())),
            max_requests,
            window,
        }
    }

    /// Check if a request should be allowed
    /// Returns true if allowed, false if rate limited
    pub async fn check(&self, key: &str) -> bool {
        let now = Instant::now();
        let mut requests = self.requests.write().await;

        match requests.get_mut(key) {
            Some((count, window_start)) => {
                if now.duration_since(*window_start) >= self.window {
                    *count = 1;
                    *window_start = now;
                    true
                } else if *count >= self.max_requests {
                    false
                } else {
                    *count += 1;
                    true
                }
            }
            None => {
                requests.insert(key.to_string(), (1, now));
                true
            }
        }
    }

    /// Drop entries whose window expired long ago (called periodically).
    pub async fn cleanup(&self) {
        let now = Instant::now();
        let mut requests = self.requests.write().await;
        requests.retain(|_, (_, window_start)| now.duration_since(*window_start) < self.window * 2);
    }
}

/// A limiter bound to one endpoint group, with the incident log for
/// recording denials.
pub struct RouteLimit {
    pub route: &'static str,
    pub limiter: RateLimiter,
    pub incidents: Arc<IncidentRecorder>,
}

impl RouteLimit {
    pub fn new(
        route: &'static str,
        max_requests: u32,
        window: Duration,
        incidents: Arc<IncidentRecorder>,
    ) -> Arc<Self> {
        Arc::new(Self {
            route,
            limiter: RateLimiter::new(max_requests, window),
            incidents,
        })
    }
}

/// Throttling key for a request: the first `X-Forwarded-For` entry when
/// present (reverse-proxy deployment), otherwise a shared bucket.
fn client_key(request: &Request<Body>) -> String {
    request
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| "direct".to_string())
}

fn rate_limited(window: Duration) -> Response<Body> {
    Response::builder()
        .status(StatusCode::TOO_MANY_REQUESTS)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::RETRY_AFTER, window.as_secs().to_string())
        .body(Body::from(
            r#"{"error":"Rate limit exceeded. Please try again later."}"#,
        ))
        .unwrap()
}

/// Middleware enforcing one endpoint group's budget.
pub async fn rate_limit_middleware(
    State(route): State<Arc<RouteLimit>>,
    request: Request<Body>,
    next: Next,
) -> Response<Body> {
    let key = client_key(&request);
    if !route.limiter.check(&key).await {
        tracing::warn!(route = route.route, key, "Rate limited");
        route.incidents.record(
            IncidentKind::RateLimitExceeded,
            format!("{} from {}", route.route, key),
        );
        return rate_limited(route.limiter.window);
    }

    next.run(request).await
}

/// Periodically evict expired windows from all limiters.
pub fn spawn_cleanup(limiters: Vec<RateLimiter>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(60));
        loop {
            interval.tick().await;
            for limiter in &limiters {
                limiter.cleanup().await;
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_rate_limiter_allows_normal_traffic() {
        let limiter = RateLimiter::new(5, Duration::from_secs(1));

        for _ in 0..5 {
            assert!(limiter.check("10.0.0.1").await);
        }

        assert!(!limiter.check("10.0.0.1").await);
    }

    #[tokio::test]
    async fn test_rate_limiter_isolates_clients() {
        let limiter = RateLimiter::new(2, Duration::from_secs(1));

        assert!(limiter.check("10.0.0.1").await);
        assert!(limiter.check("10.0.0.1").await);
        assert!(!limiter.check("10.0.0.1").await);

        assert!(limiter.check("10.0.0.2").await);
        assert!(limiter.check("10.0.0.2").await);
        assert!(!limiter.check("10.0.0.2").await);
    }

    #[tokio::test]
    async fn test_rate_limiter_window_reset() {
        let limiter = RateLimiter::new(2, Duration::from_millis(50));

        assert!(limiter.check("key").await);
        assert!(limiter.check("key").await);
        assert!(!limiter.check("key").await);

        tokio::time::sleep(Duration::from_millis(60)).await;

        assert!(limiter.check("key").await);
    }

    #[tokio::test]
    async fn test_cleanup_drops_stale_windows() {
        let limiter = RateLimiter::new(2, Duration::from_millis(10));
        limiter.check("key").await;

        tokio::time::sleep(Duration::from_millis(30)).await;
        limiter.cleanup().await;

        assert!(limiter.requests.read().await.is_empty());
    }

    #[test]
    fn test_client_key_prefers_forwarded_header() {
        let request = Request::builder()
            .uri("/api/spin")
            .header("x-forwarded-for", "203.0.113.7, 10.0.0.1")
            .body(Body::empty())
            .unwrap();
        assert_eq!(client_key(&request), "203.0.113.7");

        let request = Request::builder()
            .uri("/api/spin")
            .body(Body::empty())
            .unwrap();
        assert_eq!(client_key(&request), "direct");
    }
}
