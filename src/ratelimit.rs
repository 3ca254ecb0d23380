//! Per-client rate limiting for the data endpoints
//!
//! A sliding one-minute window per client address gates entry to the
//! orchestrators. A limiter built with a limit of zero lets everything
//! through, so a deployment without rate limiting fails open rather than
//! closed.

use crate::error::SkycastError;
use axum::extract::{ConnectInfo, Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

const WINDOW: Duration = Duration::from_secs(60);
const CLEANUP_INTERVAL: Duration = Duration::from_secs(10);

struct ClientLog {
    requests: HashMap<IpAddr, Vec<Instant>>,
    last_cleanup: Instant,
}

/// Sliding-window request limiter keyed by client address
pub struct RateLimiter {
    max_requests_per_minute: u32,
    log: Mutex<ClientLog>,
}

impl RateLimiter {
    /// Create a limiter; a `max_requests_per_minute` of 0 disables it
    #[must_use]
    pub fn new(max_requests_per_minute: u32) -> Self {
        Self {
            max_requests_per_minute,
            log: Mutex::new(ClientLog {
                requests: HashMap::new(),
                last_cleanup: Instant::now(),
            }),
        }
    }

    /// Check whether a request from `addr` is allowed, recording it if so
    pub fn allow_request(&self, addr: IpAddr) -> bool {
        if self.max_requests_per_minute == 0 {
            return true;
        }

        let now = Instant::now();
        let mut log = self.log.lock().unwrap_or_else(|e| e.into_inner());

        // Drop addresses whose whole window has passed
        if now.duration_since(log.last_cleanup) >= CLEANUP_INTERVAL {
            log.requests
                .retain(|_, times| times.iter().any(|&t| now.duration_since(t) < WINDOW));
            log.last_cleanup = now;
        }

        let times = log.requests.entry(addr).or_default();
        times.retain(|&t| now.duration_since(t) < WINDOW);
        if times.len() >= self.max_requests_per_minute as usize {
            false
        } else {
            times.push(now);
            true
        }
    }
}

/// Axum middleware rejecting over-limit clients with 429
pub async fn limit_middleware(
    State(limiter): State<Arc<RateLimiter>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    request: Request,
    next: Next,
) -> Response {
    if limiter.allow_request(addr.ip()) {
        next.run(request).await
    } else {
        tracing::warn!("Rate limit exceeded for {}", addr.ip());
        SkycastError::RateLimited.into_response()
    }
}
