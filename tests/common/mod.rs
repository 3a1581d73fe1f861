//! Shared utilities for integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header::CONTENT_TYPE, Request, Response};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use uuid::Uuid;

use form_intake::config::{AdminUserConfig, IntakeConfig};
use form_intake::notification::{Notifier, NotifyError};
use form_intake::security::{CounterStore, CounterStoreError, MemoryCounterStore, RateDecision, RatePolicy};
use form_intake::storage::{
    LocalFileStorage, MemoryStore, NewSubmission, StoreError, StoredSubmission, SubmissionKind,
    SubmissionStatus, SubmissionStore,
};
use form_intake::{AppState, Collaborators, HttpServer, Shutdown};

pub const ADMIN_TOKEN: &str = "front-desk-token";

/// Records every submission it is asked to announce.
#[derive(Default)]
pub struct RecordingNotifier {
    pub seen: Mutex<Vec<StoredSubmission>>,
}

impl RecordingNotifier {
    pub fn count(&self) -> usize {
        self.seen.lock().unwrap().len()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, submission: &StoredSubmission) -> Result<(), NotifyError> {
        self.seen.lock().unwrap().push(submission.clone());
        Ok(())
    }
}

/// Always fails, as a mail provider outage would.
pub struct FailingNotifier;

#[async_trait]
impl Notifier for FailingNotifier {
    async fn notify(&self, _: &StoredSubmission) -> Result<(), NotifyError> {
        Err(NotifyError::Rejected {
            status: 503,
            body: "provider down".into(),
        })
    }
}

/// Submission store whose backend is unreachable.
pub struct FailingStore;

#[async_trait]
impl SubmissionStore for FailingStore {
    async fn create(&self, _: NewSubmission) -> Result<Option<StoredSubmission>, StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }
    async fn list(&self, _: SubmissionKind) -> Result<Vec<StoredSubmission>, StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }
    async fn get(&self, _: SubmissionKind, _: Uuid) -> Result<Option<StoredSubmission>, StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }
    async fn update_status(
        &self,
        _: SubmissionKind,
        _: Uuid,
        _: SubmissionStatus,
    ) -> Result<Option<StoredSubmission>, StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }
}

/// Counter store whose backend is unreachable.
pub struct FailingCounters;

#[async_trait]
impl CounterStore for FailingCounters {
    async fn hit(&self, _: &str, _: &RatePolicy) -> Result<RateDecision, CounterStoreError> {
        Err(CounterStoreError("connection refused".into()))
    }
}

/// A running test application and handles to its backends.
pub struct TestApp {
    pub state: AppState,
    pub store: Arc<MemoryStore>,
    pub notifier: Arc<RecordingNotifier>,
    pub upload_dir: tempfile::TempDir,
}

impl TestApp {
    pub fn router(&self) -> axum::Router {
        HttpServer::new(self.state.clone()).router()
    }

    pub fn uploaded_files(&self) -> usize {
        count_files(self.upload_dir.path())
    }
}

fn count_files(dir: &Path) -> usize {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return 0;
    };
    entries
        .flatten()
        .map(|e| {
            let path = e.path();
            if path.is_dir() {
                count_files(&path)
            } else {
                1
            }
        })
        .sum()
}

pub fn test_config() -> IntakeConfig {
    let mut config = IntakeConfig::default();
    config.admin.enabled = true;
    config.admin.users.push(AdminUserConfig {
        name: "Front Desk".into(),
        role: "manager".into(),
        access_level: "full".into(),
        token: ADMIN_TOKEN.into(),
    });
    config.uploads.public_base_url = "http://files.test".into();
    config
}

/// Build an app on in-memory backends, letting the caller swap any of them.
pub fn build_app(config: IntakeConfig, customize: impl FnOnce(&mut Collaborators)) -> TestApp {
    let upload_dir = tempfile::tempdir().unwrap();
    let store = Arc::new(MemoryStore::new(None));
    let notifier = Arc::new(RecordingNotifier::default());

    let mut collaborators = Collaborators {
        submissions: store.clone(),
        events: store.clone(),
        files: Arc::new(LocalFileStorage::new(
            upload_dir.path(),
            config.uploads.public_base_url.clone(),
        )),
        notifier: notifier.clone(),
        counters: Arc::new(MemoryCounterStore::new()),
    };
    customize(&mut collaborators);

    TestApp {
        state: AppState::new(config, collaborators),
        store,
        notifier,
        upload_dir,
    }
}

pub fn test_app() -> TestApp {
    build_app(test_config(), |_| {})
}

/// Serve the app on an ephemeral port. Returns the address and the shutdown handle.
pub async fn spawn_server(app: &TestApp) -> (SocketAddr, Shutdown) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let server = HttpServer::new(app.state.clone());
    let receiver = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, receiver).await;
    });
    (addr, shutdown)
}

pub fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .timeout(Duration::from_secs(5))
        .build()
        .unwrap()
}

pub fn json_post(path: &str, client_ip: &str, body: &Value) -> Request<Body> {
    Request::post(path)
        .header(CONTENT_TYPE, "application/json")
        .header("x-forwarded-for", client_ip)
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Wait for detached notification tasks.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(50)).await;
}

pub fn today() -> chrono::NaiveDate {
    chrono::Local::now().date_naive()
}

pub fn days_from_today(days: i64) -> String {
    (today() + chrono::Duration::days(days)).format("%Y-%m-%d").to_string()
}

// Payload builders

pub fn reservation() -> Value {
    json!({
        "date": days_from_today(7),
        "time": "7:00 PM",
        "partySize": 4,
        "spacePreference": "Rooftop Restaurant",
        "occasion": "Anniversary",
        "name": "Asha Rao",
        "phone": "+919876543210",
        "email": "asha@example.com",
        "specialRequests": "Window table please",
        "agreeToSMS": true
    })
}

pub fn private_event() -> Value {
    json!({
        "eventType": "Birthday",
        "eventDate": days_from_today(30),
        "guestCount": 40,
        "budgetRange": "₹1L-2L",
        "spacePreference": "Private Dining",
        "name": "Rohan Mehta",
        "phone": "+919812345678",
        "email": "rohan@example.com",
        "requirements": "Live acoustic set and a custom cake",
        "preferredContact": "WhatsApp"
    })
}

pub fn banquet() -> Value {
    json!({
        "eventType": "Wedding",
        "eventDate": days_from_today(120),
        "guestCount": 300,
        "timingFrom": "18:00",
        "timingTo": "23:30",
        "requirements": ["Catering", "Decor"],
        "name": "Meera Shah",
        "phone": "+919812345679",
        "email": "meera@example.com",
        "city": "Pune",
        "hearAboutUs": "Instagram",
        "requestType": "Quote"
    })
}

pub fn contact() -> Value {
    json!({
        "inquiryType": "General",
        "name": "Kabir Singh",
        "phone": "+919800000001",
        "email": "kabir@example.com",
        "message": "Do you have live music on Fridays?"
    })
}

pub fn feedback() -> Value {
    json!({
        "visitDate": days_from_today(-2),
        "spaceVisited": "Lounge",
        "overallRating": 5,
        "foodRating": 5,
        "serviceRating": 4,
        "ambianceRating": 5,
        "valueRating": 4,
        "whatYouLoved": "The cocktails and the view at sunset",
        "wouldRecommend": "Definitely",
        "canSharePublicly": true
    })
}

pub fn career() -> Value {
    json!({
        "position": "Bartender",
        "fullName": "Vikram Nair",
        "email": "vikram@example.com",
        "phone": "+919811112222",
        "currentCity": "Mumbai",
        "experienceYears": 5,
        "whyAmante": "I have spent five years behind busy bars and want to build a cocktail \
                      programme around regional ingredients with a team that cares about craft.",
        "availableToJoin": days_from_today(30),
        "resumeUrl": "https://files.example.com/resumes/vikram.pdf"
    })
}

/// Build a `multipart/form-data` body from text fields and one optional file.
pub fn multipart_body(fields: &Value, file: Option<(&str, &str, &[u8])>) -> (String, Vec<u8>) {
    let boundary = "----intake-test-boundary";
    let mut body = Vec::new();

    if let Some(map) = fields.as_object() {
        for (name, value) in map {
            let text = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            body.extend_from_slice(
                format!(
                    "--{boundary}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{text}\r\n"
                )
                .as_bytes(),
            );
        }
    }

    if let Some((filename, content_type, bytes)) = file {
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"resume\"; filename=\"{filename}\"\r\n\
                 Content-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());

    (format!("multipart/form-data; boundary={boundary}"), body)
}

pub fn multipart_post(path: &str, client_ip: &str, fields: &Value, file: Option<(&str, &str, &[u8])>) -> Request<Body> {
    let (content_type, body) = multipart_body(fields, file);
    Request::post(path)
        .header(CONTENT_TYPE, content_type)
        .header("x-forwarded-for", client_ip)
        .body(Body::from(body))
        .unwrap()
}
