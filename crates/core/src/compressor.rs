//! The compressor seam.
//!
//! The session treats compression as a black box: bytes and options in,
//! compressed image or failure out.

use crate::state::CompressionFailure;
use shrink_image::{CompressedImage, CompressionOptions};

/// Something that can compress an image.
pub trait Compressor: Send + Sync + 'static {
    /// Compress `data` under `options`. May block; the session decides
    /// whether to call it on a worker.
    fn compress(
        &self,
        data: &[u8],
        options: &CompressionOptions,
    ) -> Result<CompressedImage, CompressionFailure>;
}

/// Production compressor backed by `shrink_image`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageCompressor;

impl Compressor for ImageCompressor {
    fn compress(
        &self,
        data: &[u8],
        options: &CompressionOptions,
    ) -> Result<CompressedImage, CompressionFailure> {
        shrink_image::compress_image(data, options).map_err(CompressionFailure::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn test_image_compressor_reports_typed_failure() {
        let failure = ImageCompressor
            .compress(b"not an image at all", &CompressionOptions::default())
            .unwrap_err();
        assert_eq!(failure.code, ErrorCode::UnknownFormat);
    }
}
