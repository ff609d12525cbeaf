//! WASM bindings for the compression engine.
//!
//! These let a browser page run the same policy and encoder client-side.

use crate::{CompressionOptions, CompressionRate};
use wasm_bindgen::prelude::*;

fn rate(percent: u8) -> Result<CompressionRate, JsValue> {
    CompressionRate::new(percent).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Encoder quality for a compression rate (10-100).
#[wasm_bindgen]
pub fn initial_quality(percent: u8) -> Result<f64, JsValue> {
    Ok(rate(percent)?.initial_quality())
}

/// Compressor options for a compression rate, as a JSON string.
#[wasm_bindgen]
pub fn compression_options(percent: u8) -> Result<String, JsValue> {
    let options = CompressionOptions::for_rate(rate(percent)?);
    serde_json::to_string(&options).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Compress an image at the given compression rate.
///
/// # Arguments
/// * `data` - Image file data
/// * `percent` - Compression rate (10-100, higher = smaller output)
///
/// # Returns
/// Compressed image data as Uint8Array
#[wasm_bindgen]
pub fn compress_image(data: &[u8], percent: u8) -> Result<Vec<u8>, JsValue> {
    let options = CompressionOptions::for_rate(rate(percent)?);
    crate::compress_image(data, &options)
        .map(|compressed| compressed.bytes)
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

/// File name offered when downloading a compressed copy.
#[wasm_bindgen]
pub fn download_name(original: &str) -> String {
    format!("compressed_{}", original)
}

#[cfg(all(test, feature = "wasm"))]
mod tests {
    use super::*;

    #[test]
    fn test_initial_quality() {
        assert_eq!(initial_quality(70).unwrap(), 0.3);
        assert_eq!(initial_quality(100).unwrap(), 0.01);
    }

    #[test]
    fn test_compression_options_json() {
        let json: serde_json::Value =
            serde_json::from_str(&compression_options(40).unwrap()).unwrap();
        assert_eq!(json["maxSizeMB"], 1.0);
        assert_eq!(json["maxWidthOrHeight"], 1920);
        assert_eq!(json["useWebWorker"], true);
        assert_eq!(json["initialQuality"], 0.6);
    }

    #[test]
    fn test_download_name() {
        assert_eq!(download_name("cat.png"), "compressed_cat.png");
    }
}
