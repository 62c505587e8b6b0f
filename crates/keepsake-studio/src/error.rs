use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use keepsake_compress::CompressError;
use keepsake_core::{ErrorBody, HttpError};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, StudioError>;

/// Message stored on a session when generation fails
pub const GENERATION_FAILED_MESSAGE: &str = "Failed to generate card. Please try again.";

#[derive(Debug, Error)]
pub enum StudioError {
    #[error("Session not found")]
    SessionNotFound,

    #[error("No image at index {0}")]
    ImageNotFound(usize),

    #[error("No card has been generated yet")]
    NoResult,

    #[error("An upload is already in progress")]
    UploadInProgress,

    #[error("A card is already being generated")]
    GenerationInProgress,

    #[error("Upload images before generating a card")]
    NoImages,

    #[error("Invalid upload: {0}")]
    InvalidUpload(String),

    #[error("Could not process image: {0}")]
    Compression(#[from] CompressError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl HttpError for StudioError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::SessionNotFound | Self::ImageNotFound(_) | Self::NoResult => {
                StatusCode::NOT_FOUND
            }
            Self::UploadInProgress | Self::GenerationInProgress => StatusCode::CONFLICT,
            Self::NoImages | Self::InvalidUpload(_) => StatusCode::BAD_REQUEST,
            Self::Compression(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_type(&self) -> &str {
        match self {
            Self::SessionNotFound | Self::ImageNotFound(_) | Self::NoResult => "not_found_error",
            Self::UploadInProgress | Self::GenerationInProgress => "conflict_error",
            Self::NoImages | Self::InvalidUpload(_) | Self::Compression(_) => {
                "invalid_request_error"
            }
            Self::Internal(_) => "api_error",
        }
    }

    fn client_message(&self) -> String {
        match self {
            Self::Internal(_) => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for StudioError {
    fn into_response(self) -> Response {
        if let Self::Internal(ref detail) = self {
            tracing::error!(error = %detail, "studio request failed");
        }

        (self.status_code(), Json(ErrorBody::from_error(&self))).into_response()
    }
}
