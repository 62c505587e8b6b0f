use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use url::Url;

/// Prompt sent with every generation; `{count}` becomes the number of
/// reference images the user supplied
pub const DEFAULT_PROMPT: &str = "Create a cute illustrated card with the elements (i.e., figures with their \
clothes and decorations, pets, and other notable features) from all the reference images using comic style. \
You need to ensure the main figure of each reference image is present in the card (in this case, there are \
{count} reference images). Use playful pastel colors and soft shading. Add festive hand-drawn text above the \
characters that reads Happy Holidays. Add a smaller friendly message that reads Sending joy your way. Use \
aspect ratio 1:1.";

/// Image generation provider configuration
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GenerationConfig {
    /// Provider type
    #[serde(default)]
    pub provider: GenerationProviderType,
    /// Provider credential; an empty value counts as missing
    #[serde(default)]
    pub api_key: Option<SecretString>,
    /// Queue API base URL
    #[serde(default = "default_base_url")]
    pub base_url: Url,
    /// Model endpoint, e.g. `fal-ai/nano-banana-pro/edit`
    #[serde(default = "default_model")]
    pub model: String,
    /// Number of reference images forwarded to the provider
    #[serde(default = "default_max_reference_images")]
    pub max_reference_images: usize,
    /// Delay between queue status polls
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Prompt template
    #[serde(default = "default_prompt")]
    pub prompt: String,
    /// Maximum size of one `/api/generate` request body
    ///
    /// Reference images arrive as base64 data URLs, so this has to cover a
    /// full batch at the upload budget plus the encoding overhead.
    #[serde(default = "default_max_request_bytes")]
    pub max_request_bytes: usize,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            provider: GenerationProviderType::default(),
            api_key: None,
            base_url: default_base_url(),
            model: default_model(),
            max_reference_images: default_max_reference_images(),
            poll_interval_ms: default_poll_interval_ms(),
            prompt: default_prompt(),
            max_request_bytes: default_max_request_bytes(),
        }
    }
}

impl GenerationConfig {
    /// The configured credential, treating a blank key as absent
    pub fn credential(&self) -> Option<&SecretString> {
        self.api_key
            .as_ref()
            .filter(|key| !key.expose_secret().trim().is_empty())
    }
}

/// Supported image generation providers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationProviderType {
    /// fal.ai queue API
    #[default]
    Fal,
}

fn default_base_url() -> Url {
    Url::parse("https://queue.fal.run").expect("valid default URL")
}

fn default_model() -> String {
    "fal-ai/nano-banana-pro/edit".to_string()
}

#[allow(clippy::missing_const_for_fn)]
fn default_max_reference_images() -> usize {
    8
}

#[allow(clippy::missing_const_for_fn)]
fn default_poll_interval_ms() -> u64 {
    500
}

#[allow(clippy::missing_const_for_fn)]
fn default_max_request_bytes() -> usize {
    32 << 20
}

fn default_prompt() -> String {
    DEFAULT_PROMPT.to_string()
}
