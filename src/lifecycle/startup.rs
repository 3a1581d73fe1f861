//! Startup orchestration.
//!
//! # Responsibilities
//! - Build the submission/event store, restoring a snapshot when configured
//! - Seed the events calendar
//! - Construct the file bucket, notifier and rate-limit counters
//! - Assemble the [`AppState`] the HTTP server runs on
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Subsystems initialize in order, not concurrently
//! - Listeners are bound by the caller, after this returns

use std::path::PathBuf;
use std::sync::Arc;

use crate::config::IntakeConfig;
use crate::http::server::{AppState, Collaborators};
use crate::notification::{build_notifier, NotifyError};
use crate::security::MemoryCounterStore;
use crate::storage::{LocalFileStorage, MemoryStore, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("failed to open submission store: {0}")]
    Store(#[source] StoreError),
    #[error("failed to seed events from {path}: {source}")]
    Events {
        path: String,
        #[source]
        source: StoreError,
    },
    #[error("failed to build notifier: {0}")]
    Notifier(#[from] NotifyError),
}

/// Everything `main` needs after startup.
pub struct Bootstrapped {
    pub state: AppState,
    /// Kept so the snapshot can be written on shutdown.
    pub store: Arc<MemoryStore>,
}

/// Build application state from a validated configuration.
pub fn bootstrap(config: IntakeConfig) -> Result<Bootstrapped, StartupError> {
    let store = match &config.storage.snapshot_path {
        Some(path) => MemoryStore::load_from_file(path).map_err(StartupError::Store)?,
        None => MemoryStore::new(None),
    };
    let store = Arc::new(store);

    if let Some(seed) = &config.events.seed_file {
        let count = store
            .seed_events(&PathBuf::from(seed))
            .map_err(|source| StartupError::Events {
                path: seed.clone(),
                source,
            })?;
        tracing::info!(count, path = %seed, "Seeded events calendar");
    }

    let files = LocalFileStorage::new(&config.uploads.storage_dir, &config.uploads.public_base_url);
    let notifier = build_notifier(&config.notifications)?;

    tracing::info!(
        provider = ?config.notifications.provider,
        rate_limit = config.rate_limit.enabled,
        on_store_error = config.rate_limit.on_store_error.as_str(),
        admin = config.admin.enabled,
        "Subsystems initialized"
    );

    let state = AppState::new(
        config,
        Collaborators {
            submissions: store.clone(),
            events: store.clone(),
            files: Arc::new(files),
            notifier,
            counters: Arc::new(MemoryCounterStore::new()),
        },
    );

    Ok(Bootstrapped { state, store })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{EventQuery, EventStore};

    #[tokio::test]
    async fn test_bootstrap_seeds_events() {
        let dir = tempfile::tempdir().unwrap();
        let seed = dir.path().join("events.json");
        std::fs::write(
            &seed,
            r#"[{
                "id": "6f1c3a52-8d0e-4b7a-9c1e-2f3d4a5b6c7d",
                "title": "Jazz Night",
                "eventType": "Live Music",
                "space": "Rooftop",
                "eventDate": "2099-01-01",
                "published": true
            }]"#,
        )
        .unwrap();

        let mut config = IntakeConfig::default();
        config.events.seed_file = Some(seed.display().to_string());
        config.uploads.storage_dir = dir.path().join("uploads").display().to_string();

        let booted = bootstrap(config).unwrap();
        let today = chrono::Local::now().date_naive();
        let page = booted
            .store
            .published_events(&EventQuery::default(), today)
            .await
            .unwrap();
        assert_eq!(page.total, 1);
    }

    #[test]
    fn test_missing_seed_file_is_fatal() {
        let mut config = IntakeConfig::default();
        config.events.seed_file = Some("/nonexistent/events.json".into());
        assert!(matches!(bootstrap(config), Err(StartupError::Events { .. })));
    }
}
