//! Mock fal.ai queue API for integration tests
//!
//! Serves submit, status and result endpoints for one model plus a static
//! file that generated image URLs can point at.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::{DefaultBodyLimit, Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::IntoResponse;
use axum::{Json, Router, routing};
use serde::Deserialize;
use serde_json::json;
use tokio_util::sync::CancellationToken;

/// Model the mock serves
pub const MODEL: &str = "fal-ai/test-model/edit";

/// Bytes served as the generated card
pub const CARD_BYTES: &[u8] = b"\x89PNG\r\n\x1a\nmock-card";

/// How the mock answers a generation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behavior {
    /// Queue, progress, then complete with an image
    Complete,
    /// Complete with an empty `images` list
    NoImage,
    /// Reject the submission with 500
    FailSubmit,
}

/// Mock fal queue
pub struct MockFal {
    addr: SocketAddr,
    shutdown: CancellationToken,
    state: Arc<MockFalState>,
}

struct MockFalState {
    addr: SocketAddr,
    behavior: Behavior,
    omit_queue_urls: bool,
    image_path: String,
    polls_before_complete: u32,
    submit_count: AtomicU32,
    status_count: AtomicU32,
    result_count: AtomicU32,
    last_submission: Mutex<Option<Submission>>,
    last_authorization: Mutex<Option<String>>,
}

/// Body the relay submitted
#[derive(Debug, Clone, Deserialize)]
pub struct Submission {
    pub prompt: String,
    pub image_urls: Vec<String>,
}

/// Builder for a [`MockFal`]
pub struct MockFalBuilder {
    behavior: Behavior,
    omit_queue_urls: bool,
    image_path: String,
}

impl MockFalBuilder {
    /// Answer with the given behavior
    pub fn behavior(mut self, behavior: Behavior) -> Self {
        self.behavior = behavior;
        self
    }

    /// Leave `status_url` and `response_url` out of the submit response
    pub fn omit_queue_urls(mut self) -> Self {
        self.omit_queue_urls = true;
        self
    }

    /// Point the generated image URL at another path on the mock
    pub fn image_path(mut self, path: &str) -> Self {
        self.image_path = path.to_owned();
        self
    }

    pub async fn start(self) -> anyhow::Result<MockFal> {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let state = Arc::new(MockFalState {
            addr,
            behavior: self.behavior,
            omit_queue_urls: self.omit_queue_urls,
            image_path: self.image_path,
            polls_before_complete: 2,
            submit_count: AtomicU32::new(0),
            status_count: AtomicU32::new(0),
            result_count: AtomicU32::new(0),
            last_submission: Mutex::new(None),
            last_authorization: Mutex::new(None),
        });

        let app = Router::new()
            // Submissions carry full batches of data URLs
            .route(
                &format!("/{MODEL}"),
                routing::post(handle_submit).layer(DefaultBodyLimit::disable()),
            )
            .route(
                "/fal-ai/test-model/requests/{id}/status",
                routing::get(handle_status),
            )
            .route("/fal-ai/test-model/requests/{id}", routing::get(handle_result))
            .route("/files/card.png", routing::get(handle_card))
            .with_state(Arc::clone(&state));

        let shutdown = CancellationToken::new();
        let shutdown_clone = shutdown.clone();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    shutdown_clone.cancelled().await;
                })
                .await
                .ok();
        });

        Ok(MockFal { addr, shutdown, state })
    }
}

impl MockFal {
    pub fn builder() -> MockFalBuilder {
        MockFalBuilder {
            behavior: Behavior::Complete,
            omit_queue_urls: false,
            image_path: "/files/card.png".to_owned(),
        }
    }

    /// Start a mock that completes every generation
    pub async fn start() -> anyhow::Result<Self> {
        Self::builder().start().await
    }

    /// Base URL for configuring the mock as the queue endpoint
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// URL the mock reports as the generated image
    pub fn image_url(&self) -> String {
        format!("http://{}{}", self.addr, self.state.image_path)
    }

    pub fn submit_count(&self) -> u32 {
        self.state.submit_count.load(Ordering::Relaxed)
    }

    pub fn status_count(&self) -> u32 {
        self.state.status_count.load(Ordering::Relaxed)
    }

    pub fn result_count(&self) -> u32 {
        self.state.result_count.load(Ordering::Relaxed)
    }

    /// Last body submitted to the queue
    pub fn last_submission(&self) -> Option<Submission> {
        self.state.last_submission.lock().unwrap().clone()
    }

    /// Authorization header of the last submission
    pub fn last_authorization(&self) -> Option<String> {
        self.state.last_authorization.lock().unwrap().clone()
    }
}

impl Drop for MockFal {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

async fn handle_submit(
    State(state): State<Arc<MockFalState>>,
    headers: HeaderMap,
    Json(submission): Json<Submission>,
) -> impl IntoResponse {
    let n = state.submit_count.fetch_add(1, Ordering::Relaxed) + 1;
    state.status_count.store(0, Ordering::Relaxed);

    *state.last_authorization.lock().unwrap() = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(ToOwned::to_owned);
    *state.last_submission.lock().unwrap() = Some(submission);

    if state.behavior == Behavior::FailSubmit {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"detail": "mock submit failure"})),
        );
    }

    let request_id = format!("req-{n}");
    let base = format!("http://{}/fal-ai/test-model/requests/{request_id}", state.addr);

    let body = if state.omit_queue_urls {
        json!({ "request_id": request_id })
    } else {
        json!({
            "request_id": request_id,
            "status_url": format!("{base}/status"),
            "response_url": base,
        })
    };

    (StatusCode::OK, Json(body))
}

async fn handle_status(
    State(state): State<Arc<MockFalState>>,
    Path(_id): Path<String>,
) -> impl IntoResponse {
    let n = state.status_count.fetch_add(1, Ordering::Relaxed);

    let body = if n == 0 {
        json!({ "status": "IN_QUEUE", "queue_position": 0 })
    } else if n < state.polls_before_complete {
        json!({ "status": "IN_PROGRESS", "logs": [{ "message": "compositing references" }] })
    } else {
        json!({
            "status": "COMPLETED",
            "logs": [{ "message": "compositing references" }, { "message": "done" }]
        })
    };

    Json(body)
}

async fn handle_result(
    State(state): State<Arc<MockFalState>>,
    Path(_id): Path<String>,
) -> impl IntoResponse {
    state.result_count.fetch_add(1, Ordering::Relaxed);

    let body = match state.behavior {
        Behavior::NoImage => json!({ "images": [] }),
        _ => json!({
            "images": [{
                "url": format!("http://{}{}", state.addr, state.image_path),
                "content_type": "image/png"
            }],
            "description": ""
        }),
    };

    Json(body)
}

async fn handle_card() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "image/png")], CARD_BYTES)
}
