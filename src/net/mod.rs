//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! ListenerConfig
//!     → listener.rs (parse address, bind socket)
//!     → Hand off to the lifecycle controller, which serves HTTP on it
//! ```

pub mod listener;

pub use listener::{bind_listener, ListenerError};
