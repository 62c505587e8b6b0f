use thiserror::Error;

pub type Result<T> = std::result::Result<T, CompressError>;

/// Failures that stop an image from being compressed at all
///
/// Exceeding the byte budget is never one of them.
#[derive(Debug, Error)]
pub enum CompressError {
    /// Bytes are not in a recognised image format
    #[error("unsupported image format")]
    UnsupportedFormat,

    /// Bytes look like an image but could not be decoded
    #[error("failed to decode image: {0}")]
    Decode(#[source] image::ImageError),

    /// Re-encoding failed
    #[error("failed to encode image: {0}")]
    Encode(#[source] image::ImageError),
}
