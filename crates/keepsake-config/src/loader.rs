use std::path::Path;

use crate::Config;

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Reads the file, expands `{{ env.VAR }}` placeholders, then
    /// deserializes and validates the result.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, environment variable
    /// expansion fails, TOML parsing fails, or validation fails
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read config file {}: {e}", path.display()))?;

        Self::parse(&raw)
    }

    /// Parse and validate configuration from TOML text
    ///
    /// # Errors
    ///
    /// Returns an error if expansion, parsing, or validation fails
    pub fn parse(raw: &str) -> anyhow::Result<Self> {
        let expanded = crate::env::expand_env(raw)
            .map_err(|e| anyhow::anyhow!("config variable expansion failed: {e}"))?;

        let config: Self =
            toml::from_str(&expanded).map_err(|e| anyhow::anyhow!("failed to parse config: {e}"))?;

        config.validate()?;

        if config.generation.credential().is_none() {
            tracing::warn!(
                "no generation API key configured; generation requests will fail until FAL_KEY is set"
            );
        }

        Ok(config)
    }

    /// Validate that the configuration is internally consistent
    ///
    /// A missing provider credential is not a validation failure: the
    /// relay reports it per request instead.
    ///
    /// # Errors
    ///
    /// Returns an error describing the first invalid setting
    pub fn validate(&self) -> anyhow::Result<()> {
        self.validate_uploads()?;
        self.validate_generation()?;
        self.validate_sessions()?;
        Ok(())
    }

    fn validate_uploads(&self) -> anyhow::Result<()> {
        let uploads = &self.uploads;

        if uploads.max_images == 0 {
            anyhow::bail!("uploads.max_images must be at least 1");
        }

        if uploads.target_bytes == 0 {
            anyhow::bail!("uploads.target_bytes must be greater than 0");
        }

        let c = &uploads.compression;

        if !(1..=100).contains(&c.initial_quality) || !(1..=100).contains(&c.rescale_quality) {
            anyhow::bail!("uploads.compression qualities must be within 1..=100");
        }

        let starting = c.initial_quality.min(c.rescale_quality);
        if c.min_quality == 0 || c.min_quality > starting {
            anyhow::bail!(
                "uploads.compression.min_quality must be between 1 and the starting qualities"
            );
        }

        if c.quality_step == 0 {
            anyhow::bail!("uploads.compression.quality_step must be greater than 0");
        }

        if !(c.scale_step > 0.0 && c.scale_step < 1.0) {
            anyhow::bail!("uploads.compression.scale_step must be between 0 and 1 (exclusive)");
        }

        if c.min_dimension == 0 {
            anyhow::bail!("uploads.compression.min_dimension must be greater than 0");
        }

        Ok(())
    }

    fn validate_generation(&self) -> anyhow::Result<()> {
        let generation = &self.generation;

        if generation.max_reference_images == 0 {
            anyhow::bail!("generation.max_reference_images must be at least 1");
        }

        if generation.poll_interval_ms == 0 {
            anyhow::bail!("generation.poll_interval_ms must be greater than 0");
        }

        if generation.max_request_bytes == 0 {
            anyhow::bail!("generation.max_request_bytes must be greater than 0");
        }

        if generation.model.trim_matches('/').is_empty() {
            anyhow::bail!("generation.model must not be empty");
        }

        if generation.prompt.trim().is_empty() {
            anyhow::bail!("generation.prompt must not be empty");
        }

        Ok(())
    }

    fn validate_sessions(&self) -> anyhow::Result<()> {
        if self.sessions.idle_ttl_secs == 0 {
            anyhow::bail!("sessions.idle_ttl_secs must be greater than 0");
        }

        if self.sessions.max_sessions == 0 {
            anyhow::bail!("sessions.max_sessions must be at least 1");
        }

        Ok(())
    }
}
