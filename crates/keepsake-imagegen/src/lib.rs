#![allow(
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_const_for_fn,
    clippy::module_name_repetitions
)]

mod error;
mod http_client;
mod prompt;
mod provider;
mod server;
mod types;

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, State, rejection::JsonRejection},
    routing::post,
};

pub use error::{ImageGenError, Result};
pub use http_client::http_client;
pub use prompt::render_prompt;
pub use server::{ImageGenServerBuilder, Server};
pub use types::{GenerateRequest, GenerateResponse, GenerationRequest, GenerationResult};

/// Build the image generation relay from configuration
///
/// # Errors
///
/// Returns an error if the relay fails to initialize
pub fn build_server(config: &keepsake_config::Config) -> anyhow::Result<Arc<Server>> {
    let server = Arc::new(
        ImageGenServerBuilder::new(config)
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to initialize image generation relay: {e}"))?,
    );
    Ok(server)
}

/// Create the endpoint router for the relay
///
/// `max_request_bytes` replaces axum's default body limit, which is far
/// below a batch of reference images sent as data URLs.
pub fn endpoint_router(max_request_bytes: usize) -> Router<Arc<Server>> {
    Router::new().route(
        "/api/generate",
        post(generate).layer(DefaultBodyLimit::max(max_request_bytes)),
    )
}

/// Relay a set of reference images to the generation provider
async fn generate(
    State(server): State<Arc<Server>>,
    payload: std::result::Result<Json<GenerateRequest>, JsonRejection>,
) -> Result<Json<GenerateResponse>> {
    let Json(request) = payload.map_err(|rejection| {
        tracing::warn!(status = %rejection.status(), "rejected generate request body");
        ImageGenError::InvalidRequest(rejection.body_text())
    })?;

    let images = request.images.unwrap_or_default();

    tracing::debug!(images = images.len(), "generate handler called");

    let result = server.generate(&images).await?;

    Ok(Json(GenerateResponse::from(result)))
}
