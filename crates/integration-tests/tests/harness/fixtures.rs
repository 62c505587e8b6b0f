//! Image fixtures

use std::io::Cursor;

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use reqwest::multipart::{Form, Part};

/// A small solid-color PNG
pub fn png(width: u32, height: u32) -> Vec<u8> {
    let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([20, 120, 60])));
    let mut out = Cursor::new(Vec::new());
    image.write_to(&mut out, ImageFormat::Png).expect("encode PNG");
    out.into_inner()
}

/// `n` distinct data URLs
pub fn data_urls(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("data:image/jpeg;base64,{i:04}")).collect()
}

/// `n` distinct data URLs the size of a photo compressed to `target_bytes`
///
/// Base64 grows the payload by a third.
pub fn full_budget_data_urls(n: usize, target_bytes: usize) -> Vec<String> {
    let encoded_len = target_bytes.div_ceil(3) * 4;
    (0..n)
        .map(|i| {
            let fill = char::from(b'A' + u8::try_from(i % 26).expect("small index"));
            format!("data:image/jpeg;base64,{}", fill.to_string().repeat(encoded_len))
        })
        .collect()
}

/// Multipart part carrying an image file
pub fn image_part(bytes: Vec<u8>, name: &str) -> Part {
    Part::bytes(bytes)
        .file_name(name.to_owned())
        .mime_str("image/png")
        .expect("valid mime")
}

/// Form with `n` small PNG files
pub fn png_form(n: usize) -> Form {
    (0..n).fold(Form::new(), |form, i| {
        form.part("file", image_part(png(16 + i as u32, 16), &format!("photo-{i}.png")))
    })
}
