//! The originally selected, uncompressed file.

use crate::error::{Error, Result, ResultExt};
use shrink_image::{detect_format, ImageFormat};
use std::path::Path;
use std::sync::Arc;

/// A selected source image. Replaced wholesale on a new selection, never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceImage {
    bytes: Arc<[u8]>,
    name: String,
    mime: String,
}

impl SourceImage {
    /// Wrap in-memory file contents.
    ///
    /// The MIME type is sniffed from the content, falling back to the
    /// extension of `name`, and finally to `application/octet-stream`.
    pub fn from_bytes(name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        let name = name.into();
        let bytes = bytes.into();
        let mime = detect_format(&bytes)
            .ok()
            .or_else(|| {
                Path::new(&name)
                    .extension()
                    .and_then(|ext| ImageFormat::from_extension(&ext.to_string_lossy()))
            })
            .map(|format| format.mime_type().to_string())
            .unwrap_or_else(|| "application/octet-stream".to_string());

        Self { bytes, name, mime }
    }

    /// Read a file from disk, accepting only image content.
    pub fn from_path(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)
            .map_err(Error::from)
            .context(format!("Failed to read {}", path.display()))?;

        if detect_format(&bytes).is_err() {
            return Err(Error::not_an_image(path));
        }

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| Error::validation(format!("No file name in {}", path.display())))?;

        Ok(Self::from_bytes(name, bytes))
    }

    /// Raw file contents.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Shared handle to the contents, for handing to a worker.
    pub fn shared_bytes(&self) -> Arc<[u8]> {
        Arc::clone(&self.bytes)
    }

    /// File name without directories.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// MIME type.
    pub fn mime(&self) -> &str {
        &self.mime
    }

    /// Size in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the file is empty.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}
