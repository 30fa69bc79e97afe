//! Server configuration service library.
//!
//! Named server configuration entries stored in PostgreSQL, served over HTTP,
//! with a readiness probe and an ordered startup/shutdown lifecycle.

// Core subsystems
pub mod config;
pub mod http;
pub mod net;
pub mod service;
pub mod store;

// Probes
pub mod health;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use config::AppConfig;
pub use lifecycle::{App, LifecycleError, LifecycleState};
pub use service::ConfigService;
pub use store::{ConfigRepository, StoreConnector};
