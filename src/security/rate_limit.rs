//! Rate limiting middleware with named policies.

use async_trait::async_trait;
use axum::{
    body::Body,
    extract::State,
    http::{HeaderName, HeaderValue, Method, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::{FailMode, RateLimitConfig, RatePolicyConfig};
use crate::http::response::{ApiError, ErrorKind};
use crate::observability::metrics;
use crate::security::client::ClientKey;

/// A named ceiling: `max_requests` per `window` per client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RatePolicy {
    pub name: &'static str,
    pub max_requests: u32,
    pub window: Duration,
}

impl RatePolicy {
    pub fn new(name: &'static str, max_requests: u32, window: Duration) -> Self {
        Self {
            name,
            max_requests,
            window,
        }
    }

    pub fn from_config(name: &'static str, config: &RatePolicyConfig) -> Self {
        Self::new(name, config.max_requests, config.window())
    }
}

/// Outcome of counting one request against a window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateDecision {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    /// Time until the current window closes.
    pub reset_after: Duration,
}

/// Error from a counter backend.
#[derive(Debug, thiserror::Error)]
#[error("counter store unavailable: {0}")]
pub struct CounterStoreError(pub String);

/// Backing store for per-key window counters.
///
/// `hit` must count and decide atomically per key, so two concurrent
/// requests sharing a key cannot both observe "under limit".
#[async_trait]
pub trait CounterStore: Send + Sync {
    async fn hit(&self, key: &str, policy: &RatePolicy) -> Result<RateDecision, CounterStoreError>;

    /// Drop windows that have closed. Returns how many were removed.
    fn purge_expired(&self) -> usize {
        0
    }
}

struct Window {
    count: u32,
    reset_at: Instant,
}

/// In-process fixed-window counters.
#[derive(Default)]
pub struct MemoryCounterStore {
    windows: DashMap<String, Window>,
}

impl MemoryCounterStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }
}

#[async_trait]
impl CounterStore for MemoryCounterStore {
    async fn hit(&self, key: &str, policy: &RatePolicy) -> Result<RateDecision, CounterStoreError> {
        let now = Instant::now();
        // The entry guard holds the shard lock for the whole check-and-increment.
        let mut window = self.windows.entry(key.to_string()).or_insert_with(|| Window {
            count: 0,
            reset_at: now + policy.window,
        });

        if now >= window.reset_at {
            window.count = 0;
            window.reset_at = now + policy.window;
        }

        let allowed = window.count < policy.max_requests;
        if allowed {
            window.count += 1;
        }

        Ok(RateDecision {
            allowed,
            limit: policy.max_requests,
            remaining: policy.max_requests.saturating_sub(window.count),
            reset_after: window.reset_at.saturating_duration_since(now),
        })
    }

    fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.windows.len();
        self.windows.retain(|_, w| w.reset_at > now);
        before.saturating_sub(self.windows.len())
    }
}

/// Applies policies to client keys on top of a counter store.
pub struct RateLimiter {
    store: Arc<dyn CounterStore>,
    fail_mode: FailMode,
    trust_forwarded: bool,
    enabled: bool,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn CounterStore>, config: &RateLimitConfig) -> Self {
        Self {
            store,
            fail_mode: config.on_store_error,
            trust_forwarded: config.trust_forwarded_for,
            enabled: config.enabled,
        }
    }

    pub fn trust_forwarded(&self) -> bool {
        self.trust_forwarded
    }

    pub fn store(&self) -> &Arc<dyn CounterStore> {
        &self.store
    }

    /// Count one request for `client` under `policy`.
    pub async fn check(&self, client: &ClientKey, policy: &RatePolicy) -> Result<(), ApiError> {
        if !self.enabled {
            return Ok(());
        }

        let key = format!("{}:{}", policy.name, client);
        match self.store.hit(&key, policy).await {
            Ok(decision) if decision.allowed => Ok(()),
            Ok(decision) => {
                tracing::warn!(client = %client, policy = policy.name, "Rate limit exceeded");
                metrics::record_rate_limited(policy.name);
                Err(rejection(&decision))
            }
            Err(e) => {
                metrics::record_rate_limiter_store_error(self.fail_mode.as_str());
                match self.fail_mode {
                    FailMode::Open => {
                        tracing::warn!(
                            client = %client,
                            policy = policy.name,
                            error = %e,
                            "Counter store failed; allowing request"
                        );
                        Ok(())
                    }
                    FailMode::Closed => {
                        tracing::error!(
                            client = %client,
                            policy = policy.name,
                            error = %e,
                            "Counter store failed; rejecting request"
                        );
                        Err(rejection(&RateDecision {
                            allowed: false,
                            limit: policy.max_requests,
                            remaining: 0,
                            reset_after: policy.window,
                        }))
                    }
                }
            }
        }
    }
}

fn header(value: u64) -> HeaderValue {
    HeaderValue::from(value)
}

fn rejection(decision: &RateDecision) -> ApiError {
    let retry_after = decision.reset_after.as_secs_f64().ceil().max(1.0) as u64;
    ApiError::new(
        ErrorKind::RateLimited,
        "Too many requests. Please try again later.",
    )
    .with_details(serde_json::json!({ "retryAfter": retry_after }))
    .with_header(HeaderName::from_static("retry-after"), header(retry_after))
    .with_header(
        HeaderName::from_static("x-ratelimit-limit"),
        header(decision.limit.into()),
    )
    .with_header(
        HeaderName::from_static("x-ratelimit-remaining"),
        header(decision.remaining.into()),
    )
    .with_header(HeaderName::from_static("x-ratelimit-reset"), header(retry_after))
}

/// State for one rate-limited route group.
#[derive(Clone)]
pub struct RateLimitState {
    pub limiter: Arc<RateLimiter>,
    pub policy: RatePolicy,
}

/// Middleware function for per-route rate limiting.
///
/// Runs before any body parsing so rejected requests cost nothing further.
pub async fn rate_limit_middleware(
    State(state): State<RateLimitState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    if request.method() == Method::OPTIONS {
        return next.run(request).await;
    }

    let client = ClientKey::from_request(&request, state.limiter.trust_forwarded());
    match state.limiter.check(&client, &state.policy).await {
        Ok(()) => {
            request.extensions_mut().insert(client);
            next.run(request).await
        }
        Err(rejected) => rejected.into_response(),
    }
}

/// Spawn the periodic sweep of closed windows.
pub fn spawn_sweeper(
    store: Arc<dyn CounterStore>,
    every: Duration,
    mut shutdown: tokio::sync::broadcast::Receiver<()>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.tick().await;
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let purged = store.purge_expired();
                    if purged > 0 {
                        tracing::debug!(purged, "Purged expired rate windows");
                    }
                }
                _ = shutdown.recv() => break,
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    struct BrokenStore;

    #[async_trait]
    impl CounterStore for BrokenStore {
        async fn hit(&self, _: &str, _: &RatePolicy) -> Result<RateDecision, CounterStoreError> {
            Err(CounterStoreError("connection refused".into()))
        }
    }

    fn limiter(store: Arc<dyn CounterStore>, mode: FailMode) -> RateLimiter {
        let config = RateLimitConfig {
            on_store_error: mode,
            ..RateLimitConfig::default()
        };
        RateLimiter::new(store, &config)
    }

    #[tokio::test]
    async fn test_window_allows_ceiling_then_rejects() {
        let store = MemoryCounterStore::new();
        let policy = RatePolicy::new("default", 3, Duration::from_secs(60));

        for expected_remaining in [2, 1, 0] {
            let d = store.hit("k", &policy).await.unwrap();
            assert!(d.allowed);
            assert_eq!(d.remaining, expected_remaining);
        }
        let d = store.hit("k", &policy).await.unwrap();
        assert!(!d.allowed);
        assert!(d.reset_after <= Duration::from_secs(60));

        // Another key has its own window.
        assert!(store.hit("other", &policy).await.unwrap().allowed);
    }

    #[tokio::test]
    async fn test_window_rolls_over() {
        let store = MemoryCounterStore::new();
        let policy = RatePolicy::new("strict", 1, Duration::from_millis(40));

        assert!(store.hit("k", &policy).await.unwrap().allowed);
        assert!(!store.hit("k", &policy).await.unwrap().allowed);
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert!(store.hit("k", &policy).await.unwrap().allowed);
    }

    #[tokio::test]
    async fn test_concurrent_hits_never_exceed_ceiling() {
        let store = Arc::new(MemoryCounterStore::new());
        let policy = RatePolicy::new("default", 10, Duration::from_secs(60));

        let mut tasks = Vec::new();
        for _ in 0..50 {
            let store = store.clone();
            let policy = policy.clone();
            tasks.push(tokio::spawn(async move {
                store.hit("shared", &policy).await.unwrap().allowed
            }));
        }
        let mut allowed = 0;
        for task in tasks {
            if task.await.unwrap() {
                allowed += 1;
            }
        }
        assert_eq!(allowed, 10);
    }

    #[tokio::test]
    async fn test_purge_removes_closed_windows() {
        let store = MemoryCounterStore::new();
        let short = RatePolicy::new("a", 5, Duration::from_millis(10));
        let long = RatePolicy::new("b", 5, Duration::from_secs(60));
        store.hit("short", &short).await.unwrap();
        store.hit("long", &long).await.unwrap();

        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(store.purge_expired(), 1);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_policies_are_counted_separately() {
        let limiter = limiter(Arc::new(MemoryCounterStore::new()), FailMode::Open);
        let client = ClientKey::new("203.0.113.1");
        let strict = RatePolicy::new("strict", 1, Duration::from_secs(60));
        let default = RatePolicy::new("default", 1, Duration::from_secs(60));

        assert!(limiter.check(&client, &strict).await.is_ok());
        assert!(limiter.check(&client, &default).await.is_ok());
        let err = limiter.check(&client, &strict).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::RateLimited);
        assert!(err.details.unwrap()["retryAfter"].as_u64().unwrap() >= 1);
    }

    #[tokio::test]
    async fn test_fail_open_allows_on_store_error() {
        let limiter = limiter(Arc::new(BrokenStore), FailMode::Open);
        let policy = RatePolicy::new("default", 1, Duration::from_secs(60));
        assert!(limiter.check(&ClientKey::new("x"), &policy).await.is_ok());
    }

    #[tokio::test]
    async fn test_fail_closed_rejects_on_store_error() {
        let limiter = limiter(Arc::new(BrokenStore), FailMode::Closed);
        let policy = RatePolicy::new("default", 1, Duration::from_secs(30));
        let err = limiter.check(&ClientKey::new("x"), &policy).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::RateLimited);
        assert_eq!(err.details.unwrap()["retryAfter"], 30);
    }

    #[tokio::test]
    async fn test_disabled_limiter_always_allows() {
        let config = RateLimitConfig {
            enabled: false,
            ..RateLimitConfig::default()
        };
        let limiter = RateLimiter::new(Arc::new(BrokenStore), &config);
        let policy = RatePolicy::new("default", 0, Duration::from_secs(1));
        assert!(limiter.check(&ClientKey::new("x"), &policy).await.is_ok());
    }
}
