use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use keepsake_core::{ErrorBody, HttpError};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ImageGenError>;

/// Message returned for every provider or transport failure
pub const GENERATION_FAILED: &str = "Failed to generate card";

/// Relay errors
///
/// Provider and transport failures keep their details for logging but
/// all surface to callers as [`GENERATION_FAILED`].
#[derive(Debug, Error)]
pub enum ImageGenError {
    /// Request carried no images
    #[error("No images provided")]
    NoImages,

    /// Request body was not a JSON object of the expected shape
    #[error("Invalid request body: {0}")]
    InvalidRequest(String),

    /// No provider credential configured
    #[error("FAL API key not configured. Set FAL_KEY in the environment")]
    MissingCredential,

    /// Provider API returned a non-success status
    #[error("Provider API error ({status}): {message}")]
    ProviderApiError { status: u16, message: String },

    /// Network or connection error
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Provider answered with something we could not interpret
    #[error("Malformed provider response: {0}")]
    MalformedResponse(String),

    /// Provider completed without producing an image URL
    #[error("No image in provider response")]
    NoImageInResponse,
}

impl ImageGenError {
    /// Whether this error came from talking to the provider
    pub fn is_provider_failure(&self) -> bool {
        !matches!(
            self,
            Self::NoImages | Self::InvalidRequest(_) | Self::MissingCredential
        )
    }

    /// Short label used as a metric attribute
    pub fn outcome(&self) -> &'static str {
        match self {
            Self::NoImages => "no_images",
            Self::InvalidRequest(_) => "invalid_request",
            Self::MissingCredential => "missing_credential",
            _ => "provider_error",
        }
    }
}

impl HttpError for ImageGenError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::NoImages | Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_type(&self) -> &str {
        match self {
            Self::NoImages | Self::InvalidRequest(_) => "invalid_request_error",
            Self::MissingCredential => "configuration_error",
            _ => "api_error",
        }
    }

    fn client_message(&self) -> String {
        if self.is_provider_failure() {
            GENERATION_FAILED.to_string()
        } else {
            self.to_string()
        }
    }
}

impl IntoResponse for ImageGenError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(ErrorBody::from_error(&self))).into_response()
    }
}
