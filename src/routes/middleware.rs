//! Per-route rate limiting and the panic boundary.

use crate::{errors::AppError, handlers::context::ClientContext};
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use futures::FutureExt;
use parking_lot::Mutex;
use std::{
    collections::HashMap,
    net::IpAddr,
    panic::AssertUnwindSafe,
    sync::Arc,
    time::{Duration, Instant},
};
use tracing::{error, warn};

/// Fixed-window request counter keyed by client IP.
#[derive(Clone)]
pub struct RateLimiter {
    inner: Arc<LimiterInner>,
}

struct LimiterInner {
    limit: u32,
    window: Duration,
    trusted_proxies: Vec<IpAddr>,
    windows: Mutex<HashMap<String, Window>>,
}

struct Window {
    started: Instant,
    count: u32,
}

impl RateLimiter {
    /// Requests are keyed by socket peer unless the peer is in `trusted_proxies`,
    /// in which case the first `x-forwarded-for` hop is used.
    pub fn new(limit: u32, window: Duration, trusted_proxies: &[IpAddr]) -> Self {
        Self {
            inner: Arc::new(LimiterInner {
                limit,
                window,
                trusted_proxies: trusted_proxies.to_vec(),
                windows: Mutex::new(HashMap::new()),
            }),
        }
    }

    pub fn per_minute(limit: u32, trusted_proxies: &[IpAddr]) -> Self {
        Self::new(limit, Duration::from_secs(60), trusted_proxies)
    }

    /// Count one request from `client`; `false` once the window is used up.
    pub fn try_acquire(&self, client: &str) -> bool {
        let now = Instant::now();
        let window_len = self.inner.window;
        let mut windows = self.inner.windows.lock();

        if !windows.contains_key(client) {
            windows.retain(|_, window| now.duration_since(window.started) < window_len);
        }
        let window = windows.entry(client.to_string()).or_insert(Window {
            started: now,
            count: 0,
        });
        if now.duration_since(window.started) >= window_len {
            window.started = now;
            window.count = 0;
        }
        if window.count >= self.inner.limit {
            return false;
        }
        window.count += 1;
        true
    }
}

pub async fn enforce_rate_limit(
    State(limiter): State<RateLimiter>,
    ctx: ClientContext,
    request: Request,
    next: Next,
) -> Response {
    let client = ctx.client_ip(&limiter.inner.trusted_proxies);
    if !limiter.try_acquire(&client) {
        warn!(
            client = %client,
            peer = %ctx.ip,
            forwarded_for = ctx.forwarded_for.as_deref().unwrap_or("-"),
            path = %request.uri().path(),
            request_id = %ctx.request_id,
            "rate limit exceeded"
        );
        return AppError::rate_limited().into_response();
    }
    next.run(request).await
}

/// Turn a panicking handler into a logged, generic 500.
pub async fn catch_panics(request: Request, next: Next) -> Response {
    let path = request.uri().path().to_string();
    match AssertUnwindSafe(next.run(request)).catch_unwind().await {
        Ok(response) => response,
        Err(panic) => {
            let detail = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            error!(path = %path, panic = %detail, "handler panicked");
            AppError::unexpected().into_response()
        }
    }
}
