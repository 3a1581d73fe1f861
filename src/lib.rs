//! Restaurant form intake service.
//!
//! Accepts reservation, private event, banquet, contact, feedback and career
//! submissions over HTTP, and serves the public events calendar plus a small
//! admin API.

// Core subsystems
pub mod config;
pub mod http;
pub mod intake;
pub mod storage;

// Public and staff surfaces
pub mod admin;
pub mod events;
pub mod notification;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;
pub mod security;

pub use config::IntakeConfig;
pub use http::{AppState, Collaborators, HttpServer};
pub use lifecycle::Shutdown;
