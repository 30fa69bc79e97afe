//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection (accepted by the lifecycle controller)
//!     → server.rs (Axum router, middleware stack)
//!     → request.rs (request ID, in-flight tracking)
//!     → handlers.rs (unpack request, call service / health)
//!     → response.rs (map errors to status + JSON body)
//!     → Send to client
//! ```

pub mod handlers;
pub mod request;
pub mod response;
pub mod server;

pub use request::{RequestTracker, X_REQUEST_ID};
pub use response::ApiError;
pub use server::{build_router, AppState};
