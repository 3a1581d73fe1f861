//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → client.rs (derive the caller's key)
//!     → rate_limit.rs (check the route's policy for that key)
//!     → limits.rs (cap body size while reading)
//!     → Pass to intake handler
//! Outgoing response:
//!     → headers.rs (security headers)
//! ```
//!
//! # Design Decisions
//! - Cheapest check first: the limiter runs before any body is read
//! - Store failures follow the configured fail mode, never a silent default
//! - No trust in client input

pub mod client;
pub mod headers;
pub mod limits;
pub mod rate_limit;

pub use client::ClientKey;
pub use rate_limit::{
    CounterStore, CounterStoreError, MemoryCounterStore, RateDecision, RateLimitState,
    RateLimiter, RatePolicy,
};
