//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! GET /ping
//!     → reporter.rs (ping the store, bounded by probe timeout)
//!     → HealthReport { alive, store_reachable }
//!     → HTTP layer picks the status code
//! ```
//!
//! # Design Decisions
//! - Liveness is unconditional; reachability is a separate fact
//! - A failed probe never crashes or degrades the process
//! - Probes are on demand; there is no background checker

pub mod reporter;

pub use reporter::{HealthReport, HealthReporter};
