//! Request handling: request IDs and in-flight tracking.
//!
//! # Responsibilities
//! - Generate a unique request ID (UUID v4) and echo it on the response
//! - Count in-flight requests so shutdown can report what it abandons
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - In-flight count is a plain atomic guarded by RAII

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{HeaderName, Request},
    middleware::Next,
    response::Response,
};

/// Header carrying the request ID.
pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Counts requests currently being handled.
#[derive(Debug, Clone, Default)]
pub struct RequestTracker {
    active: Arc<AtomicU64>,
}

impl RequestTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new in-flight request. Returns a guard that decrements on drop.
    pub fn track(&self) -> RequestGuard {
        self.active.fetch_add(1, Ordering::SeqCst);
        RequestGuard {
            active: Arc::clone(&self.active),
        }
    }

    /// Current in-flight request count.
    pub fn active_count(&self) -> u64 {
        self.active.load(Ordering::SeqCst)
    }
}

/// Guard that tracks one request's lifetime.
#[derive(Debug)]
pub struct RequestGuard {
    active: Arc<AtomicU64>,
}

impl Drop for RequestGuard {
    fn drop(&mut self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Middleware holding a [`RequestGuard`] for the duration of each request.
pub async fn track_in_flight(
    State(tracker): State<RequestTracker>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let _guard = tracker.track();
    next.run(request).await
}
