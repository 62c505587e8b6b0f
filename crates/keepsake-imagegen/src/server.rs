use std::time::{Duration, Instant};

use keepsake_config::GenerationProviderType;
use keepsake_telemetry::{
    Counter, Histogram, KeyValue,
    metrics::{self, GENERATION_COUNT, GENERATION_DURATION},
};

use crate::{
    error::{ImageGenError, Result},
    http_client::http_client,
    prompt::render_prompt,
    provider::{ImageGenProvider, fal::FalProvider},
    types::{GenerationRequest, GenerationResult},
};

/// Image generation relay
///
/// Validates a batch of reference images, renders the prompt and hands a
/// capped batch to the configured provider.
pub struct Server {
    provider: Box<dyn ImageGenProvider>,
    prompt_template: String,
    max_reference_images: usize,
    duration: Histogram<f64>,
    count: Counter<u64>,
}

impl Server {
    fn new(
        provider: Box<dyn ImageGenProvider>,
        prompt_template: String,
        max_reference_images: usize,
    ) -> Self {
        let meter = metrics::meter();

        Self {
            provider,
            prompt_template,
            max_reference_images,
            duration: meter
                .f64_histogram(GENERATION_DURATION)
                .with_unit("s")
                .with_description("Time spent waiting on the image generation provider")
                .build(),
            count: meter
                .u64_counter(GENERATION_COUNT)
                .with_description("Generation requests by outcome")
                .build(),
        }
    }

    /// Generate a card from the given reference images
    ///
    /// The prompt counts every image received while only the first
    /// `max_reference_images` are forwarded.
    pub async fn generate(&self, images: &[String]) -> Result<GenerationResult> {
        if images.is_empty() {
            self.record_outcome("no_images");
            return Err(ImageGenError::NoImages);
        }

        let request = GenerationRequest {
            prompt: render_prompt(&self.prompt_template, images.len()),
            image_urls: images.iter().take(self.max_reference_images).cloned().collect(),
        };

        tracing::info!(
            provider = self.provider.name(),
            received = images.len(),
            forwarded = request.image_urls.len(),
            "generating card"
        );

        let start = Instant::now();
        let result = self.provider.generate(&request).await;

        match &result {
            Ok(_) => {
                let outcome = [KeyValue::new("outcome", "success")];
                metrics::record_duration(&self.duration, start, &outcome);
                self.record_outcome("success");
            }
            Err(e) => {
                if e.is_provider_failure() {
                    let outcome = [KeyValue::new("outcome", e.outcome())];
                    metrics::record_duration(&self.duration, start, &outcome);
                    tracing::error!(
                        provider = self.provider.name(),
                        error = %e,
                        "card generation failed"
                    );
                } else {
                    tracing::warn!(error = %e, "card generation rejected");
                }
                self.record_outcome(e.outcome());
            }
        }

        result
    }

    /// Name of the configured provider
    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    fn record_outcome(&self, outcome: &'static str) {
        self.count.add(1, &[KeyValue::new("outcome", outcome)]);
    }
}

/// Builder for constructing the relay from configuration
pub struct ImageGenServerBuilder<'a> {
    config: &'a keepsake_config::Config,
}

impl<'a> ImageGenServerBuilder<'a> {
    pub fn new(config: &'a keepsake_config::Config) -> Self {
        Self { config }
    }

    pub fn build(self) -> Result<Server> {
        let generation = &self.config.generation;

        let provider: Box<dyn ImageGenProvider> = match generation.provider {
            GenerationProviderType::Fal => Box::new(FalProvider::new(
                http_client(),
                generation.credential().cloned(),
                generation.base_url.clone(),
                generation.model.clone(),
                Duration::from_millis(generation.poll_interval_ms),
            )),
        };

        if generation.credential().is_none() {
            tracing::debug!("Image generation relay initialized without a credential");
        }

        tracing::debug!(
            provider = provider.name(),
            model = %generation.model,
            "Image generation relay initialized"
        );

        Ok(Server::new(
            provider,
            generation.prompt.clone(),
            generation.max_reference_images,
        ))
    }
}
