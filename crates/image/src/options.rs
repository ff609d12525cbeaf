//! Compression rate policy.
//!
//! The user-facing rate grows with the amount of compression wanted, while
//! the encoder's quality parameter grows with the fidelity to keep. The
//! mapping between the two lives here, together with the fixed size and
//! dimension caps every compression call is made with.

use crate::{ImageError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Output size cap in megabytes.
pub const MAX_SIZE_MB: f64 = 1.0;

/// Cap on the longer side of the output, in pixels.
pub const MAX_WIDTH_OR_HEIGHT: u32 = 1920;

/// Quality requested at the highest compression rate.
///
/// A zero quality is not a meaningful encoder request, so the top of the
/// scale bottoms out here instead.
pub const MIN_QUALITY: f64 = 0.01;

/// User-facing compression rate, an integer percentage in `10..=100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct CompressionRate(u8);

impl CompressionRate {
    /// Lowest selectable rate.
    pub const MIN: u8 = 10;
    /// Highest selectable rate.
    pub const MAX: u8 = 100;
    /// Rate used until the user picks one.
    pub const DEFAULT: u8 = 70;

    /// Create a rate, rejecting values outside `10..=100`.
    ///
    /// # Example
    /// ```
    /// use shrink_image::CompressionRate;
    ///
    /// assert!(CompressionRate::new(70).is_ok());
    /// assert!(CompressionRate::new(5).is_err());
    /// ```
    pub fn new(percent: u8) -> Result<Self> {
        if (Self::MIN..=Self::MAX).contains(&percent) {
            Ok(Self(percent))
        } else {
            Err(ImageError::InvalidRate(percent))
        }
    }

    /// The percentage value.
    pub fn percent(self) -> u8 {
        self.0
    }

    /// Encoder quality for this rate, in `0.01..=0.90`.
    ///
    /// # Example
    /// ```
    /// use shrink_image::CompressionRate;
    ///
    /// assert_eq!(CompressionRate::new(70).unwrap().initial_quality(), 0.3);
    /// assert_eq!(CompressionRate::new(100).unwrap().initial_quality(), 0.01);
    /// ```
    pub fn initial_quality(self) -> f64 {
        if self.0 == Self::MAX {
            MIN_QUALITY
        } else {
            f64::from(Self::MAX - self.0) / 100.0
        }
    }
}

impl Default for CompressionRate {
    fn default() -> Self {
        Self(Self::DEFAULT)
    }
}

impl TryFrom<u8> for CompressionRate {
    type Error = ImageError;

    fn try_from(value: u8) -> Result<Self> {
        Self::new(value)
    }
}

impl From<CompressionRate> for u8 {
    fn from(rate: CompressionRate) -> Self {
        rate.0
    }
}

impl fmt::Display for CompressionRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

/// Configuration handed to the compressor for one call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompressionOptions {
    /// Output size cap in megabytes
    #[serde(rename = "maxSizeMB")]
    pub max_size_mb: f64,
    /// Cap on the longer output side in pixels
    #[serde(rename = "maxWidthOrHeight")]
    pub max_width_or_height: u32,
    /// Run the encoder off the calling thread
    #[serde(rename = "useWebWorker")]
    pub use_web_worker: bool,
    /// Encoder quality to start from
    #[serde(rename = "initialQuality")]
    pub initial_quality: f64,
}

impl CompressionOptions {
    /// Options for a rate. Caps are fixed policy; only quality follows the rate.
    pub fn for_rate(rate: CompressionRate) -> Self {
        Self {
            max_size_mb: MAX_SIZE_MB,
            max_width_or_height: MAX_WIDTH_OR_HEIGHT,
            use_web_worker: true,
            initial_quality: rate.initial_quality(),
        }
    }

    /// Size cap in bytes.
    pub fn max_size_bytes(&self) -> usize {
        (self.max_size_mb * 1024.0 * 1024.0) as usize
    }

    /// Initial quality on the 1-100 scale JPEG encoders take.
    pub fn jpeg_quality(&self) -> u8 {
        to_jpeg_quality(self.initial_quality)
    }
}

impl Default for CompressionOptions {
    fn default() -> Self {
        Self::for_rate(CompressionRate::default())
    }
}

pub(crate) fn to_jpeg_quality(quality: f64) -> u8 {
    (quality * 100.0).round().clamp(1.0, 100.0) as u8
}
