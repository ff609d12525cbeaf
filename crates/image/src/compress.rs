//! Size-capped image compression with the image crate.

use crate::dimensions::{fit_within, scale_by};
use crate::options::to_jpeg_quality;
use crate::{detect_format, CompressionOptions, ImageError, ImageFormat, Result};
use image::imageops::FilterType;
use image::{DynamicImage, ImageOutputFormat};
use std::io::Cursor;

/// Upper bound on shrink passes made to get under the size cap.
pub const MAX_ITERATIONS: u32 = 10;

/// Factor applied to dimensions (and lossy quality) on every shrink pass.
const SHRINK_STEP: f64 = 0.95;

/// Output of a compression call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressedImage {
    /// Encoded image data
    pub bytes: Vec<u8>,
    /// Format of `bytes` (always the input format)
    pub format: ImageFormat,
    /// Output width in pixels
    pub width: u32,
    /// Output height in pixels
    pub height: u32,
}

impl CompressedImage {
    /// MIME type of the encoded data.
    pub fn mime_type(&self) -> &'static str {
        self.format.mime_type()
    }

    /// Encoded size in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the encoded data is empty.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Compress an image.
///
/// The image is downscaled so its longer side fits `max_width_or_height`,
/// then re-encoded in its own format at `initial_quality`. While the output
/// is still over `max_size_mb`, dimensions shrink by 5% per pass (and quality
/// too, for lossy formats), up to [`MAX_ITERATIONS`] passes. If nothing had
/// to be resized and re-encoding made the file bigger, the input is returned
/// as-is.
///
/// # Arguments
/// * `data` - Image file data
/// * `options` - Compression options
pub fn compress_image(data: &[u8], options: &CompressionOptions) -> Result<CompressedImage> {
    let format = detect_format(data)?;
    let codec = format
        .encoder_format()
        .ok_or(ImageError::UnsupportedFormat(format))?;
    let original = image::load_from_memory_with_format(data, codec)?;
    let (orig_width, orig_height) = (original.width(), original.height());

    let (width, height) = fit_within(orig_width, orig_height, options.max_width_or_height);
    let resized = (width, height) != (orig_width, orig_height);
    let mut current = if resized {
        original.resize_exact(width, height, FilterType::Lanczos3)
    } else {
        original.clone()
    };

    let max_bytes = options.max_size_bytes();
    let mut quality = options.initial_quality;
    let mut encoded = encode_image(&current, format, quality)?;
    let mut iterations = 0;

    while encoded.len() > max_bytes && iterations < MAX_ITERATIONS {
        let (w, h) = scale_by(current.width(), current.height(), SHRINK_STEP);
        if (w, h) == (current.width(), current.height()) && !format.is_lossy() {
            break;
        }
        current = original.resize_exact(w, h, FilterType::Lanczos3);
        if format.is_lossy() {
            quality *= SHRINK_STEP;
        }
        encoded = encode_image(&current, format, quality)?;
        iterations += 1;
    }

    tracing::debug!(
        format = ?format,
        input_bytes = data.len(),
        output_bytes = encoded.len(),
        width = current.width(),
        height = current.height(),
        iterations,
        "Image compressed"
    );

    if !resized && iterations == 0 && encoded.len() > data.len() {
        tracing::debug!("Re-encoding grew the image; keeping the original");
        return Ok(CompressedImage {
            bytes: data.to_vec(),
            format,
            width: orig_width,
            height: orig_height,
        });
    }

    Ok(CompressedImage {
        bytes: encoded,
        format,
        width: current.width(),
        height: current.height(),
    })
}

/// Encode a DynamicImage to bytes.
fn encode_image(img: &DynamicImage, format: ImageFormat, quality: f64) -> Result<Vec<u8>> {
    let mut buffer = Cursor::new(Vec::new());

    match format {
        // JPEG has no alpha channel
        ImageFormat::Jpeg => DynamicImage::ImageRgb8(img.to_rgb8())
            .write_to(&mut buffer, ImageOutputFormat::Jpeg(to_jpeg_quality(quality)))?,
        ImageFormat::Png => img.write_to(&mut buffer, ImageOutputFormat::Png)?,
        ImageFormat::Gif => img.write_to(&mut buffer, ImageOutputFormat::Gif)?,
        ImageFormat::WebP => img.write_to(&mut buffer, ImageOutputFormat::WebP)?,
        other => return Err(ImageError::UnsupportedFormat(other)),
    }

    Ok(buffer.into_inner())
}
