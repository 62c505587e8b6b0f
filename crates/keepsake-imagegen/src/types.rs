use serde::{Deserialize, Serialize};

/// Body of `POST /api/generate`
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct GenerateRequest {
    /// Reference images as data URLs or public URLs
    #[serde(default)]
    pub images: Option<Vec<String>>,
}

/// Successful relay response
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    /// Result image URL exactly as returned by the provider
    pub image_url: String,
    /// Provider-side request identifier
    pub request_id: String,
}

impl From<GenerationResult> for GenerateResponse {
    fn from(result: GenerationResult) -> Self {
        Self {
            image_url: result.image_url,
            request_id: result.request_id,
        }
    }
}

/// What a provider is asked to produce
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    /// Rendered prompt
    pub prompt: String,
    /// Reference images, already capped
    pub image_urls: Vec<String>,
}

/// What a provider produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationResult {
    pub image_url: String,
    pub request_id: String,
}
