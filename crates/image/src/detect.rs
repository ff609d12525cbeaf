//! Image format detection from magic bytes.

use crate::{ImageError, Result};

/// Image formats the detector recognises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    /// JPEG image
    Jpeg,
    /// PNG image
    Png,
    /// GIF image
    Gif,
    /// WebP image
    WebP,
    /// AVIF image
    Avif,
    /// BMP image
    Bmp,
    /// TIFF image
    Tiff,
    /// HEIC/HEIF image
    Heic,
}

impl ImageFormat {
    /// Get the MIME type for this format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Png => "image/png",
            ImageFormat::Gif => "image/gif",
            ImageFormat::WebP => "image/webp",
            ImageFormat::Avif => "image/avif",
            ImageFormat::Bmp => "image/bmp",
            ImageFormat::Tiff => "image/tiff",
            ImageFormat::Heic => "image/heic",
        }
    }

    /// Guess a format from a file extension (case-insensitive, no dot).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Some(ImageFormat::Jpeg),
            "png" => Some(ImageFormat::Png),
            "gif" => Some(ImageFormat::Gif),
            "webp" => Some(ImageFormat::WebP),
            "avif" => Some(ImageFormat::Avif),
            "bmp" => Some(ImageFormat::Bmp),
            "tif" | "tiff" => Some(ImageFormat::Tiff),
            "heic" | "heif" => Some(ImageFormat::Heic),
            _ => None,
        }
    }

    /// Whether the encoder can honour a quality setting for this format.
    pub fn is_lossy(&self) -> bool {
        matches!(self, ImageFormat::Jpeg)
    }

    /// The codec the compressor writes this format with, if any.
    pub(crate) fn encoder_format(&self) -> Option<image::ImageFormat> {
        match self {
            ImageFormat::Jpeg => Some(image::ImageFormat::Jpeg),
            ImageFormat::Png => Some(image::ImageFormat::Png),
            ImageFormat::Gif => Some(image::ImageFormat::Gif),
            ImageFormat::WebP => Some(image::ImageFormat::WebP),
            _ => None,
        }
    }
}

/// Detect image format from magic bytes.
///
/// # Arguments
/// * `data` - First few bytes of the image file (at least 12 bytes recommended)
///
/// # Example
/// ```
/// use shrink_image::{detect_format, ImageFormat};
///
/// let jpeg_data = [0xFF, 0xD8, 0xFF, 0xE0];
/// assert!(matches!(detect_format(&jpeg_data), Ok(ImageFormat::Jpeg)));
/// ```
pub fn detect_format(data: &[u8]) -> Result<ImageFormat> {
    if data.len() < 4 {
        return Err(ImageError::InvalidData("Not enough data for format detection".into()));
    }

    const SIGNATURES: &[(&[u8], ImageFormat)] = &[
        (&[0xFF, 0xD8, 0xFF], ImageFormat::Jpeg),
        (&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A], ImageFormat::Png),
        (b"GIF87a", ImageFormat::Gif),
        (b"GIF89a", ImageFormat::Gif),
        (&[0x49, 0x49, 0x2A, 0x00], ImageFormat::Tiff),
        (&[0x4D, 0x4D, 0x00, 0x2A], ImageFormat::Tiff),
        (b"BM", ImageFormat::Bmp),
    ];

    if let Some((_, format)) = SIGNATURES.iter().find(|(magic, _)| data.starts_with(magic)) {
        return Ok(*format);
    }

    if data.len() >= 12 {
        if data.starts_with(b"RIFF") && &data[8..12] == b"WEBP" {
            return Ok(ImageFormat::WebP);
        }

        // ISO base media: ....ftyp<brand>
        if &data[4..8] == b"ftyp" {
            match &data[8..12] {
                b"avif" | b"avis" => return Ok(ImageFormat::Avif),
                b"heic" | b"heix" | b"mif1" | b"msf1" => return Ok(ImageFormat::Heic),
                _ => {}
            }
        }
    }

    Err(ImageError::UnknownFormat)
}
