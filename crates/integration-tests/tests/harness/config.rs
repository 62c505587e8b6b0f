//! Programmatic configuration builder for integration tests

use std::net::SocketAddr;

use keepsake_config::{Config, CorsConfig};
use secrecy::SecretString;

/// Builder for constructing test configurations
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder with minimal defaults
    ///
    /// Polls the provider queue every 10ms so tests stay fast.
    pub fn new() -> Self {
        let mut config = Config::default();
        config.server.listen_address = Some(SocketAddr::from(([127, 0, 0, 1], 0)));
        config.generation.poll_interval_ms = 10;

        Self { config }
    }

    /// Point the relay at a mock queue with a test credential
    pub fn with_fal(mut self, base_url: &str, model: &str) -> Self {
        self.config.generation.api_key = Some(SecretString::from("test-key"));
        self.config.generation.base_url = base_url.parse().expect("valid URL");
        self.config.generation.model = model.to_owned();
        self
    }

    /// Point the relay at a mock queue without any credential
    pub fn with_fal_without_credential(mut self, base_url: &str, model: &str) -> Self {
        self = self.with_fal(base_url, model);
        self.config.generation.api_key = Some(SecretString::from(""));
        self
    }

    /// Limit images per session
    pub fn with_max_images(mut self, max_images: usize) -> Self {
        self.config.uploads.max_images = max_images;
        self
    }

    /// Cap the `/api/generate` request body
    pub fn with_generate_body_limit(mut self, max_request_bytes: usize) -> Self {
        self.config.generation.max_request_bytes = max_request_bytes;
        self
    }

    /// Set CORS configuration
    pub fn with_cors(mut self, config: CorsConfig) -> Self {
        self.config.server.cors = Some(config);
        self
    }

    /// Disable health endpoint
    pub fn without_health(mut self) -> Self {
        self.config.server.health.enabled = false;
        self
    }

    /// Build the final config
    pub fn build(self) -> Config {
        self.config
    }
}
