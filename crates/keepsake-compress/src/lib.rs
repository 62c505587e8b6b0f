//! Adaptive image compression towards a byte budget
//!
//! Images are re-encoded at decreasing quality, then at decreasing
//! dimensions, until the encoding fits the target or the dimension floor
//! is reached. Missing the target is not an error: the last encoding
//! produced is returned.

#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

mod compressor;
mod encode;
mod error;
mod output;
mod settings;

pub use compressor::compress;
pub use error::{CompressError, Result};
pub use output::{CompressedImage, OutputFormat};
pub use settings::CompressionSettings;
