//! Materialising a compressed result as a file.

use crate::error::{Error, Result, ResultExt};
use shrink_image::CompressedImage;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Prefix put in front of the selected file's name.
pub const DOWNLOAD_PREFIX: &str = "compressed_";

/// A compressed result ready to be saved.
#[derive(Debug, Clone)]
pub struct DownloadArtifact {
    file_name: String,
    image: Arc<CompressedImage>,
}

impl DownloadArtifact {
    /// Name the artifact after `original_name`.
    pub fn new(original_name: &str, image: Arc<CompressedImage>) -> Self {
        Self {
            file_name: format!("{}{}", DOWNLOAD_PREFIX, original_name),
            image,
        }
    }

    /// `compressed_<original name>`.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// MIME type the compressor produced.
    pub fn mime(&self) -> &'static str {
        self.image.mime_type()
    }

    /// File contents.
    pub fn bytes(&self) -> &[u8] {
        &self.image.bytes
    }

    /// Write the file into `dir`, replacing any file of the same name.
    pub fn write_to(&self, dir: &Path) -> Result<PathBuf> {
        if !dir.is_dir() {
            return Err(Error::validation(format!(
                "Output directory does not exist: {}",
                dir.display()
            ))
            .with_suggestion("Create the directory or pass a different --out"));
        }

        let path = dir.join(&self.file_name);
        std::fs::write(&path, self.bytes())
            .map_err(Error::from)
            .context(format!("Failed to write {}", path.display()))?;

        tracing::info!(
            path = %path.display(),
            bytes = self.bytes().len(),
            mime = self.mime(),
            "Compressed image saved"
        );

        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use shrink_image::ImageFormat;

    fn artifact(name: &str) -> DownloadArtifact {
        let image = CompressedImage {
            bytes: vec![1, 2, 3],
            format: ImageFormat::Jpeg,
            width: 1,
            height: 1,
        };
        DownloadArtifact::new(name, Arc::new(image))
    }

    #[test]
    fn test_file_name_prefixed() {
        assert_eq!(artifact("photo.png").file_name(), "compressed_photo.png");
        assert_eq!(artifact("photo.png").mime(), "image/jpeg");
    }

    #[test]
    fn test_write_to_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = artifact("photo.jpg").write_to(dir.path()).unwrap();

        assert_eq!(path, dir.path().join("compressed_photo.jpg"));
        assert_eq!(std::fs::read(&path).unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_write_to_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let err = artifact("photo.jpg")
            .write_to(&dir.path().join("missing"))
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }
}
