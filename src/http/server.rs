//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (request ID, tracing, timeout, limits, metrics)
//! - Track in-flight requests for shutdown reporting

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::Request,
    middleware,
    routing::{get, post},
    Router,
};
use tower::limit::GlobalConcurrencyLimitLayer;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::AppConfig;
use crate::health::HealthReporter;
use crate::http::handlers;
use crate::http::request::{track_in_flight, RequestTracker, X_REQUEST_ID};
use crate::observability::metrics;
use crate::service::ConfigService;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ConfigService>,
    pub health: Arc<HealthReporter>,
}

impl AppState {
    pub fn new(service: ConfigService, health: HealthReporter) -> Self {
        Self {
            service: Arc::new(service),
            health: Arc::new(health),
        }
    }
}

/// Build the Axum router with all middleware layers.
#[allow(deprecated)]
pub fn build_router(config: &AppConfig, state: AppState, tracker: RequestTracker) -> Router {
    Router::new()
        .route("/ping", get(handlers::ping))
        .route(
            "/server-config",
            post(handlers::create_config).get(handlers::list_configs),
        )
        .route(
            "/server-config/{id}",
            get(handlers::get_config)
                .put(handlers::update_config)
                .delete(handlers::delete_config),
        )
        .with_state(state)
        .layer(middleware::from_fn(metrics::track_requests))
        .layer(middleware::from_fn_with_state(tracker, track_in_flight))
        .layer(RequestBodyLimitLayer::new(config.listener.max_body_bytes))
        .layer(GlobalConcurrencyLimitLayer::new(config.listener.max_connections))
        .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
        .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
            let request_id = request
                .headers()
                .get(X_REQUEST_ID)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("unknown");
            tracing::info_span!(
                "request",
                method = %request.method(),
                uri = %request.uri(),
                request_id = %request_id,
            )
        }))
        .layer(SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuid))
}
