use base64::{Engine as _, engine::general_purpose::STANDARD};

/// Encoding of a compressed image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Jpeg,
    Png,
}

impl OutputFormat {
    pub const fn mime_type(self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
        }
    }

    /// PNG input stays PNG so transparency survives; everything else becomes JPEG
    pub(crate) fn for_input(format: image::ImageFormat) -> Self {
        if format == image::ImageFormat::Png {
            Self::Png
        } else {
            Self::Jpeg
        }
    }
}

/// Result of compressing one image
#[derive(Debug, Clone)]
pub struct CompressedImage {
    /// Encoded bytes
    pub bytes: Vec<u8>,
    pub format: OutputFormat,
    pub width: u32,
    pub height: u32,
    /// JPEG quality of the final encoding; `None` for PNG and passthrough
    pub quality: Option<u8>,
    /// Size of the input in bytes
    pub original_size: usize,
    /// Input was already under budget and returned untouched
    pub passthrough: bool,
}

impl CompressedImage {
    /// Size of the encoded bytes
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub const fn mime_type(&self) -> &'static str {
        self.format.mime_type()
    }

    /// `data:<mime>;base64,<payload>` URL suitable for an `<img>` tag or
    /// as a provider image reference
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type(), STANDARD.encode(&self.bytes))
    }
}
