//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the intake
//! service. All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration for the intake service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct IntakeConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Rate limiting configuration.
    pub rate_limit: RateLimitConfig,

    /// Cross-origin settings for the public API.
    pub cors: CorsConfig,

    /// Numeric bounds used by the form schemas.
    pub forms: FormLimits,

    /// Resume upload settings.
    pub uploads: UploadConfig,

    /// Notification (email) settings.
    pub notifications: NotificationConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Submission store settings.
    pub storage: StorageConfig,

    /// Public events listing settings.
    pub events: EventsConfig,

    #[serde(default)]
    pub admin: AdminConfig,

    #[serde(default)]
    pub security: SecurityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// What the limiter does when its counter store cannot be reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FailMode {
    /// Let the request through and log the failure.
    Open,
    /// Reject the request as rate limited.
    Closed,
}

impl FailMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailMode::Open => "open",
            FailMode::Closed => "closed",
        }
    }
}

/// A single rate policy: at most `max_requests` per `window_secs` per client.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RatePolicyConfig {
    pub max_requests: u32,
    pub window_secs: u64,
}

impl RatePolicyConfig {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Enable rate limiting.
    pub enabled: bool,

    /// Policy for plain JSON forms and the events listing.
    pub default: RatePolicyConfig,

    /// Policy for upload-bearing forms (career applications).
    pub strict: RatePolicyConfig,

    /// Behaviour when the counter store fails.
    pub on_store_error: FailMode,

    /// Use X-Forwarded-For / X-Real-IP to identify clients.
    pub trust_forwarded_for: bool,

    /// Interval between sweeps of expired windows, in seconds.
    pub sweep_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            default: RatePolicyConfig {
                max_requests: 10,
                window_secs: 60,
            },
            strict: RatePolicyConfig {
                max_requests: 3,
                window_secs: 60,
            },
            on_store_error: FailMode::Open,
            trust_forwarded_for: true,
            sweep_secs: 60,
        }
    }
}

/// CORS configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Allowed origins. `"*"` allows any origin.
    pub allowed_origins: Vec<String>,

    /// Preflight cache lifetime in seconds.
    pub max_age_secs: u64,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["*".to_string()],
            max_age_secs: 86_400,
        }
    }
}

/// Numeric bounds applied by the form schemas.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FormLimits {
    pub reservation_max_party: i64,
    pub private_event_min_guests: i64,
    pub private_event_max_guests: i64,
    pub banquet_min_guests: i64,
    pub banquet_max_guests: i64,
    pub contact_message_min: usize,
    pub contact_message_max: usize,
    /// Minimum length of the career "why join us" narrative.
    pub career_motivation_min: usize,
}

impl Default for FormLimits {
    fn default() -> Self {
        Self {
            reservation_max_party: 20,
            private_event_min_guests: 1,
            private_event_max_guests: 500,
            banquet_min_guests: 50,
            banquet_max_guests: 2000,
            contact_message_min: 10,
            contact_message_max: 2000,
            career_motivation_min: 100,
        }
    }
}

/// Resume upload configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UploadConfig {
    /// Maximum resume size in bytes.
    pub max_resume_bytes: usize,

    /// MIME types accepted for resumes.
    pub allowed_mime_types: Vec<String>,

    /// Directory that holds stored files.
    pub storage_dir: String,

    /// Bucket (sub-directory) for resumes.
    pub bucket: String,

    /// Base URL under which stored files are served.
    pub public_base_url: String,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_resume_bytes: 5 * 1024 * 1024, // 5MB
            allowed_mime_types: vec![
                "application/pdf".to_string(),
                "application/msword".to_string(),
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
                    .to_string(),
            ],
            storage_dir: "data/uploads".to_string(),
            bucket: "resumes".to_string(),
            public_base_url: "http://localhost:8080/files".to_string(),
        }
    }
}

/// Notification provider selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationProvider {
    /// Write notifications to the log only.
    Log,
    /// Send email through an HTTP mail API.
    Http,
}

/// Notification configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NotificationConfig {
    pub provider: NotificationProvider,

    /// Mail API endpoint (Resend-compatible `POST /emails`).
    pub api_url: String,

    /// Bearer token for the mail API.
    pub api_key: String,

    /// Sender address.
    pub from_address: String,

    /// Addresses that receive a copy of every new submission.
    pub admin_recipients: Vec<String>,

    /// Venue name used in email subjects.
    pub venue_name: String,

    /// Mail API timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            provider: NotificationProvider::Log,
            api_url: "https://api.resend.com/emails".to_string(),
            api_key: String::new(),
            from_address: "no-reply@localhost".to_string(),
            admin_recipients: Vec::new(),
            venue_name: "Amante".to_string(),
            timeout_secs: 10,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format ("pretty" or "json").
    pub log_format: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Submission store configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct StorageConfig {
    /// JSON snapshot loaded at startup and written at shutdown.
    pub snapshot_path: Option<String>,
}

/// Public events listing configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EventsConfig {
    /// JSON file with the events calendar.
    pub seed_file: Option<String>,

    /// Page size when `limit` is not given.
    pub default_limit: usize,

    /// Largest accepted `limit`.
    pub max_limit: usize,

    /// Shared cache lifetime for successful responses, in seconds.
    pub cache_max_age_secs: u64,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            seed_file: None,
            default_limit: 50,
            max_limit: 100,
            cache_max_age_secs: 300, // 5 minutes
        }
    }
}

/// A back-office user allowed to call the admin API.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AdminUserConfig {
    pub name: String,
    #[serde(default = "default_role")]
    pub role: String,
    #[serde(default = "default_access_level")]
    pub access_level: String,
    /// Bearer token presented by this user.
    pub token: String,
}

fn default_role() -> String {
    "manager".to_string()
}

fn default_access_level() -> String {
    "full".to_string()
}

/// Admin API configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AdminConfig {
    /// Enable admin routes.
    pub enabled: bool,

    /// Users and their bearer tokens.
    pub users: Vec<AdminUserConfig>,
}

/// Security hardening configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Enable security headers.
    pub enable_headers: bool,
    /// Maximum body size in bytes.
    pub max_body_size: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            enable_headers: true,
            max_body_size: 6 * 1024 * 1024, // 6MB, room for a 5MB resume plus fields
        }
    }
}
