pub(crate) mod fal;

use async_trait::async_trait;

use crate::{
    error::Result,
    types::{GenerationRequest, GenerationResult},
};

/// Trait for image generation provider implementations
#[async_trait]
pub trait ImageGenProvider: Send + Sync {
    /// Generate one image and wait for it to complete
    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResult>;

    /// Get the provider name
    fn name(&self) -> &str;
}
