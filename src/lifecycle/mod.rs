//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs, controller.rs):
//!     Open store → Bind listener → Build service/health/router → Serve
//!
//! Shutdown (controller.rs, shutdown.rs):
//!     stop(deadline) → Stop accepting → Drain (bounded) → Close store
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → main calls stop(deadline)
//! ```
//!
//! # Design Decisions
//! - Ordered startup: store first, listener last
//! - Ordered shutdown: stop accept, drain, close
//! - Shutdown has a deadline: the store is closed even if it elapses

pub mod controller;
pub mod shutdown;
pub mod signals;
pub mod startup;

pub use controller::{App, LifecycleError, LifecycleState};
pub use shutdown::{Shutdown, ShutdownSignal};
pub use signals::{wait_for_termination, TerminationSignal};
