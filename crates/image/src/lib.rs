//! Image compression engine for Shrink.
//!
//! This crate provides:
//! - Format detection from magic bytes
//! - The compression-rate policy and the options it maps to
//! - Size-capped re-encoding with the image crate
//! - Optional WASM bindings for in-browser use

#![warn(missing_docs)]

mod compress;
mod detect;
pub mod dimensions;
mod error;
mod options;

#[cfg(feature = "wasm")]
mod wasm;

pub use compress::{compress_image, CompressedImage};
pub use detect::{detect_format, ImageFormat};
pub use dimensions::fit_within;
pub use error::{ImageError, Result};
pub use options::{CompressionOptions, CompressionRate};
