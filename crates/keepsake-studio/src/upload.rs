use std::sync::Arc;

use axum::{
    body::Body,
    extract::{FromRequest, Multipart},
};
use bytes::Bytes;

use crate::{Studio, error::StudioError};

/// One image file from a multipart upload
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: Option<String>,
    pub content_type: String,
    pub bytes: Bytes,
}

/// Extractor for the `file` parts of a multipart form
///
/// Parts that are not `image/*` are dropped. The body is buffered up to
/// the configured request limit before parsing.
pub struct ImageUploads(pub Vec<UploadedFile>);

impl FromRequest<Arc<Studio>> for ImageUploads {
    type Rejection = StudioError;

    async fn from_request(
        request: http::Request<Body>,
        studio: &Arc<Studio>,
    ) -> Result<Self, Self::Rejection> {
        let (parts, body) = request.into_parts();

        let content_type = parts
            .headers
            .get(http::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");

        if !content_type.starts_with("multipart/form-data") {
            return Err(StudioError::InvalidUpload(
                "expected Content-Type: multipart/form-data".to_string(),
            ));
        }

        let bytes = axum::body::to_bytes(body, studio.max_request_bytes)
            .await
            .map_err(|e| StudioError::InvalidUpload(format!("failed to read request body: {e}")))?;

        let rebuilt = http::Request::from_parts(parts, Body::from(bytes));

        let mut multipart = Multipart::from_request(rebuilt, &())
            .await
            .map_err(|e| {
                StudioError::InvalidUpload(format!("failed to parse multipart form: {e}"))
            })?;

        let mut files = Vec::new();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| {
                StudioError::InvalidUpload(format!("failed to read multipart field: {e}"))
            })?
        {
            if field.name() != Some("file") {
                continue;
            }

            let content_type = field.content_type().unwrap_or("").to_string();
            let file_name = field.file_name().map(ToString::to_string);

            if !content_type.starts_with("image/") {
                tracing::debug!(?file_name, %content_type, "skipping non-image upload");
                continue;
            }

            let bytes = field
                .bytes()
                .await
                .map_err(|e| {
                    StudioError::InvalidUpload(format!("failed to read image data: {e}"))
                })?;

            files.push(UploadedFile {
                file_name,
                content_type,
                bytes,
            });
        }

        Ok(Self(files))
    }
}
