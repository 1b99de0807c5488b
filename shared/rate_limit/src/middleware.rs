//! Tower middleware applying the sliding-window limit per client IP

use crate::limiter::{KeyGenerator, RateLimitResult, RateLimiter};
use crate::memory_limiter::InMemoryRateLimiter;
use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{header, HeaderValue, Request, Response};
use axum::response::IntoResponse;
use shared_error::ApiError;
use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;
use tower::{Layer, Service};
use tracing::{info, warn};

/// Shared state for rate-limited route groups
#[derive(Clone)]
pub struct RateLimitState {
    pub limiter: InMemoryRateLimiter,
    pub max_requests: u32,
    pub window: Duration,
    pub enabled: bool,
}

impl RateLimitState {
    pub fn new(max_requests: u32, window: Duration, enabled: bool) -> Self {
        let limiter = InMemoryRateLimiter::new();
        if enabled {
            // Sweep fully expired entries every five minutes
            limiter.spawn_sweeper(window, Duration::from_secs(300));
        }
        Self {
            limiter,
            max_requests,
            window,
            enabled,
        }
    }
}

/// Layer applying the per-IP limit to a route group
#[derive(Clone)]
pub struct RateLimitLayer {
    state: RateLimitState,
    key_prefix: &'static str,
}

impl RateLimitLayer {
    pub fn new(state: RateLimitState, key_prefix: &'static str) -> Self {
        Self { state, key_prefix }
    }
}

impl<S> Layer<S> for RateLimitLayer {
    type Service = RateLimitMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RateLimitMiddleware {
            inner,
            state: self.state.clone(),
            key_prefix: self.key_prefix,
        }
    }
}

#[derive(Clone)]
pub struct RateLimitMiddleware<S> {
    inner: S,
    state: RateLimitState,
    key_prefix: &'static str,
}

impl<S> Service<Request<Body>> for RateLimitMiddleware<S>
where
    S: Service<Request<Body>, Response = Response<Body>> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response<Body>;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let state = self.state.clone();
        let key_prefix = self.key_prefix;
        let mut inner = self.inner.clone();

        Box::pin(async move {
            if !state.enabled {
                return inner.call(req).await;
            }

            let ip = extract_client_ip(&req);
            let key = KeyGenerator::ip_key(key_prefix, &ip);

            match state
                .limiter
                .check_rate_limit(&key, state.max_requests, state.window)
                .await
            {
                Ok(result) if result.allowed => {
                    let response = inner.call(req).await?;
                    Ok(add_rate_limit_headers(response, &result))
                }
                Ok(result) => {
                    info!(
                        key = %key,
                        limit = result.limit,
                        "rate limit exceeded"
                    );
                    Ok(rate_limit_exceeded_response(&result))
                }
                Err(e) => {
                    // Fail open for availability
                    warn!("rate limit check failed: {}. Allowing request.", e);
                    inner.call(req).await
                }
            }
        })
    }
}

/// Extract the client IP: proxy headers first, then connection info
fn extract_client_ip<B>(req: &Request<B>) -> String {
    if let Some(xff) = req.headers().get("x-forwarded-for") {
        if let Ok(xff_str) = xff.to_str() {
            if let Some(ip) = xff_str.split(',').next() {
                let ip = ip.trim();
                if !ip.is_empty() {
                    return ip.to_string();
                }
            }
        }
    }

    if let Some(real_ip) = req.headers().get("x-real-ip") {
        if let Ok(ip) = real_ip.to_str() {
            let ip = ip.trim();
            if !ip.is_empty() {
                return ip.to_string();
            }
        }
    }

    if let Some(connect_info) = req.extensions().get::<ConnectInfo<SocketAddr>>() {
        return connect_info.0.ip().to_string();
    }

    "unknown".to_string()
}

fn add_rate_limit_headers(mut response: Response<Body>, result: &RateLimitResult) -> Response<Body> {
    let headers = response.headers_mut();
    if let Ok(v) = HeaderValue::from_str(&result.limit.to_string()) {
        headers.insert("x-ratelimit-limit", v);
    }
    if let Ok(v) = HeaderValue::from_str(&result.remaining.to_string()) {
        headers.insert("x-ratelimit-remaining", v);
    }
    if let Ok(v) = HeaderValue::from_str(&result.reset_at.to_string()) {
        headers.insert("x-ratelimit-reset", v);
    }
    response
}

fn rate_limit_exceeded_response(result: &RateLimitResult) -> Response<Body> {
    let mut response = ApiError::rate_limited(result.retry_after).into_response();

    let headers = response.headers_mut();
    if let Ok(v) = HeaderValue::from_str(&result.retry_after.to_string()) {
        headers.insert(header::RETRY_AFTER, v);
    }
    if let Ok(v) = HeaderValue::from_str(&result.limit.to_string()) {
        headers.insert("x-ratelimit-limit", v);
    }
    headers.insert("x-ratelimit-remaining", HeaderValue::from_static("0"));
    if let Ok(v) = HeaderValue::from_str(&result.reset_at.to_string()) {
        headers.insert("x-ratelimit-reset", v);
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::Router;
    use tower::ServiceExt;

    fn test_router(state: RateLimitState) -> Router {
        Router::new()
            .route("/login", post(|| async { "ok" }))
            .layer(RateLimitLayer::new(state, "rate_limit:test:ip"))
    }

    fn request_from(ip: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/login")
            .header("x-forwarded-for", ip)
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn test_sixth_request_is_rejected() {
        let state = RateLimitState::new(5, Duration::from_secs(900), true);
        let app = test_router(state);

        for _ in 0..5 {
            let response = app.clone().oneshot(request_from("10.0.0.1")).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }

        let response = app.clone().oneshot(request_from("10.0.0.1")).await.unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        let retry_after = response
            .headers()
            .get(header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap();
        assert!(retry_after > 0);
    }

    #[tokio::test]
    async fn test_limits_are_per_ip() {
        let state = RateLimitState::new(2, Duration::from_secs(60), true);
        let app = test_router(state);

        for _ in 0..2 {
            app.clone().oneshot(request_from("10.0.0.1")).await.unwrap();
        }
        let response = app.clone().oneshot(request_from("10.0.0.1")).await.unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);

        let response = app.clone().oneshot(request_from("10.0.0.2")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_disabled_limiter_passes_everything() {
        let state = RateLimitState::new(1, Duration::from_secs(60), false);
        let app = test_router(state);

        for _ in 0..10 {
            let response = app.clone().oneshot(request_from("10.0.0.1")).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }
    }

    #[test]
    fn test_extract_client_ip_prefers_forwarded_header() {
        let req = Request::builder()
            .uri("/")
            .header("x-forwarded-for", "203.0.113.9, 10.0.0.1")
            .body(())
            .unwrap();
        assert_eq!(extract_client_ip(&req), "203.0.113.9");

        let req = Request::builder()
            .uri("/")
            .header("x-real-ip", "203.0.113.7")
            .body(())
            .unwrap();
        assert_eq!(extract_client_ip(&req), "203.0.113.7");

        let req = Request::builder().uri("/").body(()).unwrap();
        assert_eq!(extract_client_ip(&req), "unknown");
    }
}
