use serde::Deserialize;

/// Upload limits
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UploadsConfig {
    /// Maximum number of images a session may hold
    #[serde(default = "default_max_images")]
    pub max_images: usize,
    /// Byte budget each uploaded image is compressed towards
    #[serde(default = "default_target_bytes")]
    pub target_bytes: usize,
    /// Maximum size of one multipart upload request
    #[serde(default = "default_max_request_bytes")]
    pub max_request_bytes: usize,
    /// Compression loop tuning
    #[serde(default)]
    pub compression: CompressionConfig,
}

impl Default for UploadsConfig {
    fn default() -> Self {
        Self {
            max_images: default_max_images(),
            target_bytes: default_target_bytes(),
            max_request_bytes: default_max_request_bytes(),
            compression: CompressionConfig::default(),
        }
    }
}

/// Quality and dimension steps used by the adaptive compressor
///
/// Qualities are JPEG qualities in `1..=100`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompressionConfig {
    pub initial_quality: u8,
    pub min_quality: u8,
    pub quality_step: u8,
    /// Quality restored after each dimension reduction
    pub rescale_quality: u8,
    /// Factor applied to width and height on each reduction
    pub scale_step: f64,
    /// Dimension reduction stops once either side is at or below this
    pub min_dimension: u32,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            initial_quality: 90,
            min_quality: 10,
            quality_step: 10,
            rescale_quality: 80,
            scale_step: 0.8,
            min_dimension: 100,
        }
    }
}

#[allow(clippy::missing_const_for_fn)]
fn default_max_images() -> usize {
    15
}

#[allow(clippy::missing_const_for_fn)]
fn default_target_bytes() -> usize {
    500 * 1024
}

#[allow(clippy::missing_const_for_fn)]
fn default_max_request_bytes() -> usize {
    64 << 20
}
