//! Error types for the image crate.

use thiserror::Error;

/// Result type alias for image operations.
pub type Result<T> = std::result::Result<T, ImageError>;

/// Errors that can occur during image operations.
#[derive(Debug, Error)]
pub enum ImageError {
    /// Unknown image format
    #[error("Unknown image format")]
    UnknownFormat,

    /// Invalid image data
    #[error("Invalid image data: {0}")]
    InvalidData(String),

    /// Compression rate outside the accepted range
    #[error("Compression rate {0}% is outside 10-100%")]
    InvalidRate(u8),

    /// Format can be detected but not re-encoded
    #[error("Unsupported output format: {0:?}")]
    UnsupportedFormat(crate::ImageFormat),

    /// Decoder or encoder failure
    #[error("Image processing error: {0}")]
    ProcessingError(#[from] image::ImageError),
}
