//! Display handles for compressed previews.
//!
//! A preview needs a handle (think `blob:` URL) that refers to the compressed
//! bytes. Handles are scoped: acquiring registers one, dropping releases it,
//! so replacing a result or tearing down a session never leaks handles.

use shrink_image::CompressedImage;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};
use uuid::Uuid;

const URL_SCHEME: &str = "blob:shrink/";

/// Tracks live preview handles.
#[derive(Debug, Clone, Default)]
pub struct PreviewRegistry {
    live: Arc<Mutex<HashSet<Uuid>>>,
}

impl PreviewRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handle for `image`.
    pub fn acquire(&self, image: Arc<CompressedImage>) -> PreviewHandle {
        let id = Uuid::new_v4();
        self.lock().insert(id);
        tracing::debug!(%id, bytes = image.len(), "Preview handle acquired");
        PreviewHandle {
            id,
            image,
            registry: self.clone(),
        }
    }

    /// Number of handles not yet released.
    pub fn live_count(&self) -> usize {
        self.lock().len()
    }

    /// Whether a handle URL is still live.
    pub fn is_live(&self, url: &str) -> bool {
        url.strip_prefix(URL_SCHEME)
            .and_then(|id| Uuid::parse_str(id).ok())
            .is_some_and(|id| self.lock().contains(&id))
    }

    fn release(&self, id: Uuid) {
        if self.lock().remove(&id) {
            tracing::debug!(%id, "Preview handle released");
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashSet<Uuid>> {
        // The set stays consistent even if a holder panicked
        self.live.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A live display handle. Released on drop.
#[derive(Debug)]
pub struct PreviewHandle {
    id: Uuid,
    image: Arc<CompressedImage>,
    registry: PreviewRegistry,
}

impl PreviewHandle {
    /// URL the preview is displayed from.
    pub fn url(&self) -> String {
        format!("{}{}", URL_SCHEME, self.id)
    }

    /// The image behind the handle.
    pub fn image(&self) -> &CompressedImage {
        &self.image
    }

    pub(crate) fn shows(&self, image: &Arc<CompressedImage>) -> bool {
        Arc::ptr_eq(&self.image, image)
    }
}

impl Drop for PreviewHandle {
    fn drop(&mut self) {
        self.registry.release(self.id);
    }
}
