//! Service layer.
//!
//! # Data Flow
//! ```text
//! HTTP handler (already-parsed body / path id)
//!     → config_service.rs (validate id and fields)
//!     → ConfigRepository (one call)
//!     → ServiceError (NotFound passed through, storage → Internal)
//! ```

pub mod config_service;

pub use config_service::{ConfigEntryRequest, ConfigService, ServiceError, ServiceResult};
