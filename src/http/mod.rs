//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, route groups, layer stack)
//!     → request.rs (request ID, tracing span)
//!     → cors.rs (CorsLayer per route group, 204 preflights)
//!     → [rate limit → intake pipeline | events | admin]
//!     → response.rs (success/error envelope)
//!     → Send to client
//! ```

pub mod cors;
pub mod request;
pub mod response;
pub mod server;

pub use request::X_REQUEST_ID;
pub use response::{ApiError, ApiResponse, ApiResult, ErrorKind};
pub use server::{build_router, AppState, Collaborators, HttpServer};
