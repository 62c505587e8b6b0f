#![allow(clippy::must_use_candidate)]

pub mod cors;
mod env;
pub mod generation;
pub mod health;
mod loader;
pub mod server;
pub mod sessions;
pub mod telemetry;
pub mod uploads;

use serde::Deserialize;

pub use cors::*;
pub use generation::*;
pub use health::*;
pub use server::*;
pub use sessions::*;
pub use telemetry::TelemetryConfig;
pub use uploads::*;

/// Top-level Keepsake configuration
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Upload limits and compression tuning
    #[serde(default)]
    pub uploads: UploadsConfig,
    /// Image generation provider configuration
    #[serde(default)]
    pub generation: GenerationConfig,
    /// Browser session storage
    #[serde(default)]
    pub sessions: SessionsConfig,
    /// Telemetry configuration
    #[serde(default)]
    pub telemetry: Option<TelemetryConfig>,
}
