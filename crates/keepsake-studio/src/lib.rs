//! Browser-facing card studio
//!
//! Serves the single page UI and keeps one server-side session per visitor:
//! the uploaded reference images, whether an upload or generation is
//! running and the last generated card.

#![allow(
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_const_for_fn,
    clippy::module_name_repetitions
)]

mod compress;
mod error;
mod session;
mod store;
mod upload;

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Path, State},
    http::{HeaderValue, StatusCode, header},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{delete, get, post},
};
use bytes::Bytes;
use keepsake_compress::CompressionSettings;
use keepsake_telemetry::{
    Counter, Histogram,
    metrics::{self, UPLOAD_COMPRESSED_BYTES, UPLOAD_IMAGES},
};

pub use error::{GENERATION_FAILED_MESSAGE, Result, StudioError};
pub use session::{GeneratedCard, ImageEntry, ImageSet, Phase, Session, SessionView};
pub use store::SessionStore;
use store::lock;
use upload::ImageUploads;

const INDEX_HTML: &str = include_str!("../assets/index.html");

/// Studio state shared by all handlers
pub struct Studio {
    sessions: SessionStore,
    relay: Arc<keepsake_imagegen::Server>,
    client: reqwest::Client,
    target_bytes: usize,
    max_request_bytes: usize,
    compression: CompressionSettings,
    uploaded_images: Counter<u64>,
    compressed_bytes: Histogram<u64>,
}

impl std::fmt::Debug for Studio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Studio")
            .field("sessions", &self.sessions)
            .field("target_bytes", &self.target_bytes)
            .finish_non_exhaustive()
    }
}

/// Build the studio from configuration and the relay it generates through
///
/// # Errors
///
/// Returns an error if the studio fails to initialize
pub fn build_server(
    config: &keepsake_config::Config,
    relay: Arc<keepsake_imagegen::Server>,
) -> anyhow::Result<Arc<Studio>> {
    let meter = metrics::meter();

    let studio = Studio {
        sessions: SessionStore::new(
            config.sessions.max_sessions,
            config.sessions.idle_ttl(),
            config.uploads.max_images,
        ),
        relay,
        client: keepsake_imagegen::http_client(),
        target_bytes: config.uploads.target_bytes,
        max_request_bytes: config.uploads.max_request_bytes,
        compression: compress::settings_from_config(&config.uploads.compression),
        uploaded_images: meter
            .u64_counter(UPLOAD_IMAGES)
            .with_description("Reference images accepted into sessions")
            .build(),
        compressed_bytes: meter
            .u64_histogram(UPLOAD_COMPRESSED_BYTES)
            .with_unit("By")
            .with_description("Size of each image after compression")
            .build(),
    };

    tracing::debug!(
        max_images = config.uploads.max_images,
        target_bytes = studio.target_bytes,
        "Studio initialized"
    );

    Ok(Arc::new(studio))
}

/// Create the endpoint router for the studio
pub fn endpoint_router() -> Router<Arc<Studio>> {
    Router::new()
        .route("/", get(index))
        .route("/api/sessions", post(create_session))
        .route("/api/sessions/{id}", get(get_session))
        .route(
            "/api/sessions/{id}/images",
            // The upload extractor enforces its own configured limit
            post(upload_images).layer(DefaultBodyLimit::disable()),
        )
        .route("/api/sessions/{id}/images/{index}", delete(remove_image))
        .route("/api/sessions/{id}/generate", post(generate))
        .route("/api/sessions/{id}/download", get(download))
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn create_session(State(studio): State<Arc<Studio>>) -> impl IntoResponse {
    let (id, session) = studio.sessions.create();

    tracing::debug!(session = %id, "session created");

    let view = lock(&session).view(id);
    (StatusCode::CREATED, Json(view))
}

async fn get_session(
    State(studio): State<Arc<Studio>>,
    Path(id): Path<String>,
) -> Result<Json<SessionView>> {
    let (id, session) = studio.sessions.get(&id)?;
    let view = lock(&session).view(id);
    Ok(Json(view))
}

/// Compress and append a batch of images
///
/// Work runs on a spawned task so the session is settled even if the
/// client disconnects mid-upload.
async fn upload_images(
    State(studio): State<Arc<Studio>>,
    Path(id): Path<String>,
    ImageUploads(files): ImageUploads,
) -> Result<Json<SessionView>> {
    let (id, session) = studio.sessions.get(&id)?;

    let remaining = lock(&session).begin_upload()?;
    let received = files.len();
    let files: Vec<_> = files.into_iter().take(remaining).collect();

    tracing::debug!(session = %id, received, accepted = files.len(), "upload started");

    if files.is_empty() {
        let mut state = lock(&session);
        state.finish_upload(None);
        return Ok(Json(state.view(id)));
    }

    let worker = Arc::clone(&studio);
    let task = tokio::spawn(async move {
        let outcome =
            compress::compress_batch(files, worker.target_bytes, &worker.compression).await;

        let entries = match outcome {
            Ok(images) => {
                for image in &images {
                    worker.compressed_bytes.record(image.len() as u64, &[]);
                }
                Some(images.into_iter().map(ImageEntry::from).collect::<Vec<_>>())
            }
            Err(e) => {
                lock(&session).finish_upload(None);
                return Err(e);
            }
        };

        let mut state = lock(&session);
        let added = state.finish_upload(entries);
        worker.uploaded_images.add(added as u64, &[]);

        tracing::info!(session = %id, added, total = state.images().len(), "images uploaded");

        Ok(state.view(id))
    });

    let view = task
        .await
        .map_err(|e| StudioError::Internal(format!("upload task failed: {e}")))??;

    Ok(Json(view))
}

async fn remove_image(
    State(studio): State<Arc<Studio>>,
    Path((id, index)): Path<(String, usize)>,
) -> Result<Json<SessionView>> {
    let (id, session) = studio.sessions.get(&id)?;

    let mut state = lock(&session);
    state.remove_image(index)?;

    Ok(Json(state.view(id)))
}

/// Generate a card from the session's images
///
/// A failed generation is recorded on the session and still answers 200
/// with the updated view.
async fn generate(
    State(studio): State<Arc<Studio>>,
    Path(id): Path<String>,
) -> Result<Json<SessionView>> {
    let (id, session) = studio.sessions.get(&id)?;

    let images = lock(&session).begin_generation()?;
    let relay = Arc::clone(&studio.relay);

    let task = tokio::spawn(async move {
        let card = relay.generate(&images).await.ok().map(GeneratedCard::from);

        let mut state = lock(&session);
        state.finish_generation(card);
        state.view(id)
    });

    let view = task
        .await
        .map_err(|e| StudioError::Internal(format!("generation task failed: {e}")))?;

    Ok(Json(view))
}

/// Return the generated card as a file download
///
/// Falls back to redirecting to the image URL when it cannot be fetched.
async fn download(State(studio): State<Arc<Studio>>, Path(id): Path<String>) -> Result<Response> {
    let (_, session) = studio.sessions.get(&id)?;

    let card = lock(&session).card().cloned().ok_or(StudioError::NoResult)?;

    let file_name = format!("christmas-card-{}.png", jiff::Timestamp::now().as_millisecond());

    match fetch_image(&studio.client, &card.image_url).await {
        Ok((content_type, bytes)) => {
            let disposition =
                HeaderValue::from_str(&format!("attachment; filename=\"{file_name}\""))
                    .map_err(|e| StudioError::Internal(e.to_string()))?;

            Ok((
                [
                    (header::CONTENT_TYPE, content_type),
                    (header::CONTENT_DISPOSITION, disposition),
                ],
                bytes,
            )
                .into_response())
        }
        Err(e) => {
            tracing::warn!(error = %e, url = %card.image_url, "card download failed, redirecting");
            Ok(Redirect::temporary(&card.image_url).into_response())
        }
    }
}

async fn fetch_image(client: &reqwest::Client, url: &str) -> reqwest::Result<(HeaderValue, Bytes)> {
    let response = client.get(url).send().await?.error_for_status()?;

    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .cloned()
        .unwrap_or_else(|| HeaderValue::from_static("image/png"));

    let bytes = response.bytes().await?;

    Ok((content_type, bytes))
}
