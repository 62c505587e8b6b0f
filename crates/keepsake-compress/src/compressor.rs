use std::io::Cursor;

use image::metadata::Orientation;
use image::{DynamicImage, ImageDecoder, ImageFormat, ImageReader};

use crate::encode::{encode, redraw};
use crate::error::{CompressError, Result};
use crate::output::{CompressedImage, OutputFormat};
use crate::settings::CompressionSettings;

/// Compress an encoded image towards `target_bytes`
///
/// JPEG and PNG input already within budget is returned unchanged.
/// Otherwise quality is lowered first; if that is not enough both
/// dimensions are scaled down and quality is retried, until the target is
/// met or either side reaches the dimension floor. The last encoding is
/// returned even when it is still over budget.
pub fn compress(
    input: &[u8],
    target_bytes: usize,
    settings: &CompressionSettings,
) -> Result<CompressedImage> {
    let format = image::guess_format(input).map_err(|_| CompressError::UnsupportedFormat)?;

    if input.len() <= target_bytes && matches!(format, ImageFormat::Jpeg | ImageFormat::Png) {
        return passthrough(input, format);
    }

    let source = decode_upright(input, format)?;
    let output = OutputFormat::for_input(format);

    let mut attempt = Attempt::first(&source, output, settings)?;

    if attempt.len() > target_bytes {
        attempt.reduce_quality(&source, target_bytes, settings)?;
    }

    while attempt.len() > target_bytes && settings.can_shrink(attempt.width, attempt.height) {
        let width = settings.shrink(attempt.width);
        let height = settings.shrink(attempt.height);
        let resized = redraw(&source, width, height);

        attempt = Attempt::encode(&resized, output, settings.rescale_quality)?;
        attempt.reduce_quality(&resized, target_bytes, settings)?;
    }

    tracing::debug!(
        original_bytes = input.len(),
        final_bytes = attempt.len(),
        width = attempt.width,
        height = attempt.height,
        quality = attempt.quality,
        over_budget = attempt.len() > target_bytes,
        "image compressed"
    );

    Ok(attempt.finish(input.len()))
}

/// Decode pixels and apply the EXIF orientation
///
/// Re-encoding drops the EXIF block, so the rotation has to be baked into
/// the pixels or camera photos come out sideways.
fn decode_upright(input: &[u8], format: ImageFormat) -> Result<DynamicImage> {
    let mut decoder = ImageReader::with_format(Cursor::new(input), format)
        .into_decoder()
        .map_err(CompressError::Decode)?;
    let orientation = decoder.orientation().unwrap_or(Orientation::NoTransforms);

    let mut image = DynamicImage::from_decoder(decoder).map_err(CompressError::Decode)?;
    image.apply_orientation(orientation);

    Ok(image)
}

fn passthrough(input: &[u8], format: ImageFormat) -> Result<CompressedImage> {
    let (width, height) = ImageReader::with_format(Cursor::new(input), format)
        .into_dimensions()
        .map_err(CompressError::Decode)?;

    tracing::debug!(bytes = input.len(), width, height, "image already within budget");

    Ok(CompressedImage {
        bytes: input.to_vec(),
        format: OutputFormat::for_input(format),
        width,
        height,
        quality: None,
        original_size: input.len(),
        passthrough: true,
    })
}

/// One encoding of the image at a given size and quality
struct Attempt {
    bytes: Vec<u8>,
    format: OutputFormat,
    width: u32,
    height: u32,
    quality: u8,
}

impl Attempt {
    fn first(
        source: &DynamicImage,
        format: OutputFormat,
        settings: &CompressionSettings,
    ) -> Result<Self> {
        Self::encode(source, format, settings.initial_quality)
    }

    fn encode(image: &DynamicImage, format: OutputFormat, quality: u8) -> Result<Self> {
        Ok(Self {
            bytes: encode(image, format, quality)?,
            format,
            width: image.width(),
            height: image.height(),
            quality,
        })
    }

    fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Lower quality step by step while over budget
    ///
    /// PNG is lossless, so re-encoding at another quality cannot help.
    fn reduce_quality(
        &mut self,
        image: &DynamicImage,
        target_bytes: usize,
        settings: &CompressionSettings,
    ) -> Result<()> {
        if self.format == OutputFormat::Png {
            return Ok(());
        }

        while self.len() > target_bytes && self.quality > settings.min_quality {
            self.quality = settings.lower(self.quality);
            self.bytes = encode(image, self.format, self.quality)?;
        }

        Ok(())
    }

    fn finish(self, original_size: usize) -> CompressedImage {
        CompressedImage {
            quality: (self.format == OutputFormat::Jpeg).then_some(self.quality),
            bytes: self.bytes,
            format: self.format,
            width: self.width,
            height: self.height,
            original_size,
            passthrough: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use image::{Rgb, RgbImage, Rgba, RgbaImage};

    use super::*;

    /// Deterministic noise so encoders cannot shrink the image much
    fn noise(width: u32, height: u32) -> RgbImage {
        let mut state: u32 = 0x9e37_79b9;
        RgbImage::from_fn(width, height, |_, _| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            let [r, g, b, _] = state.to_le_bytes();
            Rgb([r, g, b])
        })
    }

    fn encoded(image: DynamicImage, format: ImageFormat) -> Vec<u8> {
        let mut buffer = Cursor::new(Vec::new());
        image.write_to(&mut buffer, format).unwrap();
        buffer.into_inner()
    }

    fn noisy_jpeg(width: u32, height: u32) -> Vec<u8> {
        encoded(DynamicImage::ImageRgb8(noise(width, height)), ImageFormat::Jpeg)
    }

    fn assert_budget_or_floor(
        result: &CompressedImage,
        target: usize,
        settings: &CompressionSettings,
    ) {
        let at_floor =
            result.width <= settings.min_dimension || result.height <= settings.min_dimension;
        let at_min_quality = result.quality.is_none_or(|q| q == settings.min_quality);
        assert!(
            result.len() <= target || (at_floor && at_min_quality),
            "{} bytes at {}x{} q{:?} misses target {target}",
            result.len(),
            result.width,
            result.height,
            result.quality,
        );
    }

    #[test]
    fn under_budget_jpeg_is_returned_untouched() {
        let input = noisy_jpeg(32, 24);
        let settings = CompressionSettings::default();

        let result = compress(&input, input.len() + 1, &settings).unwrap();

        assert!(result.passthrough);
        assert_eq!(result.bytes, input);
        assert_eq!((result.width, result.height), (32, 24));
        assert_eq!(result.format, OutputFormat::Jpeg);
    }

    #[test]
    fn compressing_twice_changes_nothing() {
        let input = noisy_jpeg(400, 300);
        let settings = CompressionSettings::default();
        let target = 30_000;

        let first = compress(&input, target, &settings).unwrap();
        assert!(first.len() <= target);

        let second = compress(&first.bytes, target, &settings).unwrap();
        assert!(second.passthrough);
        assert_eq!(second.bytes, first.bytes);
    }

    #[test]
    fn over_budget_jpeg_meets_target_or_floor() {
        let input = noisy_jpeg(640, 480);
        let settings = CompressionSettings::default();
        let target = 20_000;
        assert!(input.len() > target);

        let result = compress(&input, target, &settings).unwrap();

        assert!(!result.passthrough);
        assert_eq!(result.original_size, input.len());
        assert_budget_or_floor(&result, target, &settings);
    }

    #[test]
    fn unreachable_target_stops_at_floor() {
        let input = noisy_jpeg(300, 200);
        let settings = CompressionSettings::default();

        let result = compress(&input, 10, &settings).unwrap();

        assert!(result.len() > 10);
        assert!(result.width <= 100 || result.height <= 100);
        assert_eq!(result.quality, Some(settings.min_quality));
        // 300x200 -> 240x160 -> 192x128 -> 153x102 -> 122x81
        assert_eq!((result.width, result.height), (122, 81));
    }

    #[test]
    fn quality_alone_can_be_enough() {
        let pixels = DynamicImage::ImageRgb8(noise(200, 200));
        let input = encoded(pixels.clone(), ImageFormat::Bmp);
        let settings = CompressionSettings::default();

        // Anything at least as large as the floor-quality encoding is reachable
        // without touching dimensions.
        let floor = encode(&pixels, OutputFormat::Jpeg, settings.min_quality).unwrap();
        let target = floor.len() * 2;

        let result = compress(&input, target, &settings).unwrap();

        assert_eq!(result.format, OutputFormat::Jpeg);
        assert_eq!((result.width, result.height), (200, 200));
        assert!(result.len() <= target);
    }

    #[test]
    fn png_stays_png_and_shrinks() {
        let rgb = noise(256, 256);
        let rgba = RgbaImage::from_fn(256, 256, |x, y| {
            let [r, g, b] = rgb.get_pixel(x, y).0;
            Rgba([r, g, b, 128])
        });
        let input = encoded(DynamicImage::ImageRgba8(rgba), ImageFormat::Png);
        let settings = CompressionSettings::default();
        let target = input.len() / 2;

        let result = compress(&input, target, &settings).unwrap();

        assert_eq!(result.format, OutputFormat::Png);
        assert_eq!(result.quality, None);
        assert!(result.width < 256);
        assert_budget_or_floor(&result, target, &settings);
        assert!(result.to_data_url().starts_with("data:image/png;base64,"));
    }

    /// Insert an EXIF APP1 segment carrying `orientation` after the SOI marker
    fn with_exif_orientation(jpeg: &[u8], orientation: u8) -> Vec<u8> {
        #[rustfmt::skip]
        let app1: [u8; 36] = [
            0xFF, 0xE1, 0x00, 0x22,
            b'E', b'x', b'i', b'f', 0x00, 0x00,
            // Big-endian TIFF header, first IFD at offset 8
            b'M', b'M', 0x00, 0x2A, 0x00, 0x00, 0x00, 0x08,
            // One entry: Orientation (0x0112), SHORT, count 1
            0x00, 0x01,
            0x01, 0x12, 0x00, 0x03, 0x00, 0x00, 0x00, 0x01, 0x00, orientation, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00,
        ];

        let mut out = Vec::with_capacity(jpeg.len() + app1.len());
        out.extend_from_slice(&jpeg[..2]);
        out.extend_from_slice(&app1);
        out.extend_from_slice(&jpeg[2..]);
        out
    }

    #[test]
    fn exif_rotation_is_baked_into_reencoded_pixels() {
        // Stored landscape, displayed portrait (rotate 90 clockwise)
        let input = with_exif_orientation(&noisy_jpeg(400, 200), 6);
        let settings = CompressionSettings::default();
        let target = 20_000;
        assert!(input.len() > target);

        let result = compress(&input, target, &settings).unwrap();

        assert!(!result.passthrough);
        assert!(
            result.height > result.width,
            "expected portrait output, got {}x{}",
            result.width,
            result.height
        );

        let decoded = image::load_from_memory(&result.bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (result.width, result.height));
    }

    #[test]
    fn garbage_is_rejected() {
        let err = compress(b"definitely not an image", 1024, &CompressionSettings::default())
            .unwrap_err();
        assert!(matches!(err, CompressError::UnsupportedFormat));
    }

    #[test]
    fn truncated_image_fails_to_decode() {
        let input = encoded(DynamicImage::ImageRgb8(noise(200, 200)), ImageFormat::Png);
        let truncated = &input[..input.len() / 3];

        let err = compress(truncated, 10, &CompressionSettings::default()).unwrap_err();
        assert!(matches!(err, CompressError::Decode(_)));
    }
}
