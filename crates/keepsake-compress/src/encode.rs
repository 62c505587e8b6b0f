use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{DynamicImage, imageops};

use crate::error::{CompressError, Result};
use crate::output::OutputFormat;

/// Encode pixels in the given format
///
/// `quality` only applies to JPEG. JPEG has no alpha channel, so
/// transparent pixels are flattened first.
pub(crate) fn encode(image: &DynamicImage, format: OutputFormat, quality: u8) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();

    match format {
        OutputFormat::Jpeg => {
            let encoder = JpegEncoder::new_with_quality(&mut buffer, quality);
            let rgb = DynamicImage::ImageRgb8(image.to_rgb8());
            rgb.write_with_encoder(encoder).map_err(CompressError::Encode)?;
        }
        OutputFormat::Png => {
            let encoder = PngEncoder::new_with_quality(
                &mut buffer,
                CompressionType::Best,
                FilterType::Adaptive,
            );
            image.write_with_encoder(encoder).map_err(CompressError::Encode)?;
        }
    }

    Ok(buffer)
}

/// Redraw the source at exact dimensions
pub(crate) fn redraw(source: &DynamicImage, width: u32, height: u32) -> DynamicImage {
    if source.width() == width && source.height() == height {
        return source.clone();
    }

    source.resize_exact(width, height, imageops::FilterType::Triangle)
}
