//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router with every public, admin and health route
//! - Attach rate-limit policies per route group
//! - Wire up middleware (request ID, tracing, timeout, body limit, CORS, metrics, security headers)
//! - Serve with connection info until shutdown is signalled

use axum::{
    extract::State,
    middleware,
    routing::{get, post},
    Router,
};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::admin::setup_admin_router;
use crate::config::{IntakeConfig, RatePolicyConfig};
use crate::events::list_events;
use crate::http::cors::{cors_layer, preflight_no_content, FORM_METHODS, READ_METHODS};
use crate::http::request::{propagate_request_id_layer, set_request_id_layer, RequestSpan};
use crate::http::response::{not_found, ApiResponse, ApiResult};
use crate::intake::handlers::*;
use crate::intake::IntakeService;
use crate::notification::Notifier;
use crate::observability::metrics::track_metrics;
use crate::security::headers::apply_security_headers;
use crate::security::limits::body_limit;
use crate::security::rate_limit::{rate_limit_middleware, spawn_sweeper};
use crate::security::{CounterStore, RateLimitState, RateLimiter, RatePolicy};
use crate::storage::{EventStore, FileStorage, SubmissionStore};

/// Backends the server is built on. Tests swap in doubles here.
#[derive(Clone)]
pub struct Collaborators {
    pub submissions: Arc<dyn SubmissionStore>,
    pub events: Arc<dyn EventStore>,
    pub files: Arc<dyn FileStorage>,
    pub notifier: Arc<dyn Notifier>,
    pub counters: Arc<dyn CounterStore>,
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<IntakeConfig>,
    pub intake: Arc<IntakeService>,
    pub submissions: Arc<dyn SubmissionStore>,
    pub events: Arc<dyn EventStore>,
    pub limiter: Arc<RateLimiter>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(config: IntakeConfig, collaborators: Collaborators) -> Self {
        let intake = IntakeService::new(
            &config.forms,
            config.uploads.clone(),
            collaborators.submissions.clone(),
            collaborators.files,
            collaborators.notifier,
            config.rate_limit.trust_forwarded_for,
        );
        let limiter = RateLimiter::new(collaborators.counters, &config.rate_limit);

        Self {
            config: Arc::new(config),
            intake: Arc::new(intake),
            submissions: collaborators.submissions,
            events: collaborators.events,
            limiter: Arc::new(limiter),
            started_at: Instant::now(),
        }
    }
}

/// HTTP server for the intake API.
pub struct HttpServer {
    router: Router,
    state: AppState,
}

impl HttpServer {
    pub fn new(state: AppState) -> Self {
        let router = build_router(state.clone());
        Self { router, state }
    }

    /// The fully layered router, for driving requests without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server, accepting connections on the given listener until
    /// `shutdown` fires.
    pub async fn run(self, listener: TcpListener, mut shutdown: broadcast::Receiver<()>) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let config = &self.state.config;
        let sweeper = config.rate_limit.enabled.then(|| {
            spawn_sweeper(
                self.state.limiter.store().clone(),
                Duration::from_secs(config.rate_limit.sweep_secs),
                shutdown.resubscribe(),
            )
        });

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received; draining connections");
            })
            .await?;

        if let Some(sweeper) = sweeper {
            let _ = sweeper.await;
        }
        tracing::info!("HTTP server stopped");
        Ok(())
    }

    pub fn config(&self) -> &IntakeConfig {
        &self.state.config
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Health {
    status: &'static str,
    version: &'static str,
    uptime_secs: u64,
}

async fn health(State(state): State<AppState>) -> ApiResult<Health> {
    Ok(ApiResponse::ok(Health {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        uptime_secs: state.started_at.elapsed().as_secs(),
    }))
}

fn rate_limit_state(state: &AppState, name: &'static str, policy: &RatePolicyConfig) -> RateLimitState {
    RateLimitState {
        limiter: state.limiter.clone(),
        policy: RatePolicy::from_config(name, policy),
    }
}

/// Build the Axum router with all middleware layers.
#[allow(deprecated)]
pub fn build_router(state: AppState) -> Router {
    let config = state.config.clone();
    let default_limit = middleware::from_fn_with_state(
        rate_limit_state(&state, "default", &config.rate_limit.default),
        rate_limit_middleware,
    );

    // `layer` rather than `route_layer` so OPTIONS reaches CORS on POST-only routes.
    let forms = Router::new()
        .route("/api/reservations", post(submit_reservation))
        .route("/api/private-events", post(submit_private_event))
        .route("/api/banquets", post(submit_banquet))
        .route("/api/contact", post(submit_contact))
        .route("/api/feedback", post(submit_feedback))
        .route_layer(default_limit.clone())
        .layer(cors_layer(&config.cors, &FORM_METHODS));

    let events = Router::new()
        .route("/api/events", get(list_events))
        .route_layer(default_limit)
        .layer(cors_layer(&config.cors, &READ_METHODS));

    let uploads = Router::new()
        .route("/api/careers", post(submit_career))
        .route_layer(middleware::from_fn_with_state(
            rate_limit_state(&state, "strict", &config.rate_limit.strict),
            rate_limit_middleware,
        ))
        .layer(cors_layer(&config.cors, &FORM_METHODS));

    let public = Router::new()
        .merge(forms)
        .merge(events)
        .merge(uploads)
        .layer(middleware::from_fn(preflight_no_content));

    let mut router = public.route("/health", get(health));
    if config.admin.enabled {
        router = router.merge(setup_admin_router(state.clone()));
    }

    let router = router
        .route_layer(middleware::from_fn(track_metrics))
        .fallback(not_found)
        .with_state(state)
        .layer(body_limit(&config.security))
        .layer(
            ServiceBuilder::new()
                .layer(set_request_id_layer())
                .layer(TraceLayer::new_for_http().make_span_with(RequestSpan))
                .layer(propagate_request_id_layer())
                .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs))),
        );

    if config.security.enable_headers {
        apply_security_headers(router)
    } else {
        router
    }
}
