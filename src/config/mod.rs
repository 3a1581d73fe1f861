//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → IntakeConfig (validated, immutable)
//!     → shared via AppState to handlers and middleware
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    AdminConfig, AdminUserConfig, CorsConfig, EventsConfig, FailMode, FormLimits, IntakeConfig,
    ListenerConfig, NotificationConfig, NotificationProvider, ObservabilityConfig,
    RateLimitConfig, RatePolicyConfig, SecurityConfig, StorageConfig, UploadConfig,
};
