//! The compression session.
//!
//! [`Session`] owns the state, the compressor and the preview handle, and
//! is the only place that performs effects: running the compressor, logging
//! and writing downloads. State changes go through [`reduce`].
//!
//! A compression is three steps, which callers needing to interleave other
//! actions can drive by hand:
//!
//! 1. [`Session::begin_compress`] issues a tagged request,
//! 2. [`run_request`] runs it, on a blocking worker when the options ask for one,
//! 3. [`Session::finish`] applies the outcome unless it went stale meanwhile.
//!
//! [`Session::compress`] does all three in one call.

use crate::compressor::Compressor;
use crate::error::{ErrorCode, Result};
use crate::preview::{PreviewHandle, PreviewRegistry};
use crate::source::SourceImage;
use crate::state::{
    reduce, Action, CompressedResult, CompressionFailure, CompressionRequest, SessionState,
};
use shrink_image::{CompressedImage, CompressionRate};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

/// How a compression request ended.
#[derive(Debug)]
pub struct Completion {
    /// The request as issued
    pub request: CompressionRequest,
    /// Compressor output
    pub outcome: std::result::Result<CompressedImage, CompressionFailure>,
}

/// Run one request against a compressor.
///
/// With `use_web_worker` set the compressor runs on tokio's blocking pool
/// and the caller only awaits; otherwise it runs inline. No retry, no
/// timeout, no cancellation.
pub async fn run_request<C: Compressor>(compressor: Arc<C>, request: CompressionRequest) -> Completion {
    let started = Instant::now();
    let options = request.options;

    let outcome = if options.use_web_worker {
        let data = request.source.shared_bytes();
        tokio::task::spawn_blocking(move || compressor.compress(&data, &options))
            .await
            .unwrap_or_else(|err| {
                Err(CompressionFailure::new(
                    ErrorCode::WorkerFailed,
                    format!("Compression worker failed: {}", err),
                ))
            })
    } else {
        compressor.compress(request.source.bytes(), &options)
    };

    tracing::debug!(
        request = %request.id,
        elapsed_ms = started.elapsed().as_millis() as u64,
        ok = outcome.is_ok(),
        "Compression call settled"
    );

    Completion { request, outcome }
}

/// One user's compression session.
pub struct Session<C: Compressor> {
    state: SessionState,
    compressor: Arc<C>,
    previews: PreviewRegistry,
    preview: Option<PreviewHandle>,
}

impl<C: Compressor> Session<C> {
    /// New session with its own preview registry.
    pub fn new(compressor: C) -> Self {
        Self::with_registry(compressor, PreviewRegistry::new())
    }

    /// New session sharing a preview registry.
    pub fn with_registry(compressor: C, previews: PreviewRegistry) -> Self {
        Self {
            state: SessionState::new(),
            compressor: Arc::new(compressor),
            previews,
            preview: None,
        }
    }

    /// Current state.
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Handle for displaying the current result.
    pub fn preview(&self) -> Option<&PreviewHandle> {
        self.preview.as_ref()
    }

    /// The compressor, for running requests with [`run_request`].
    pub fn compressor(&self) -> Arc<C> {
        Arc::clone(&self.compressor)
    }

    /// Replace the selected file. Rate and any shown result are kept.
    pub fn select_file(&mut self, source: SourceImage) {
        tracing::info!(name = source.name(), mime = source.mime(), bytes = source.len(), "File selected");
        if let Some(abandoned) = self.state.pending_request() {
            tracing::debug!(request = %abandoned.id, "In-flight request abandoned by new selection");
        }
        self.dispatch(Action::SelectFile(source));
    }

    /// Change the compression rate.
    pub fn set_rate(&mut self, rate: CompressionRate) {
        tracing::debug!(%rate, "Compression rate set");
        self.dispatch(Action::SetRate(rate));
    }

    /// Issue a request for the current file and rate.
    ///
    /// Returns `None`, changing nothing, when no file is selected or a
    /// request is already in flight.
    pub fn begin_compress(&mut self) -> Option<CompressionRequest> {
        if self.state.is_compressing() || self.state.source().is_none() {
            return None;
        }
        self.dispatch(Action::StartCompress);
        let request = self.state.pending_request()?;
        tracing::info!(
            request = %request.id,
            name = request.source.name(),
            rate = %request.rate,
            initial_quality = request.options.initial_quality,
            "Compression started"
        );
        Some(request)
    }

    /// Apply a completion. Returns whether it was applied; stale
    /// completions are dropped.
    pub fn finish(&mut self, completion: Completion) -> bool {
        let id = completion.request.id;
        let current = self
            .state
            .pending_request()
            .is_some_and(|pending| pending.id == id);

        if !current {
            tracing::debug!(request = %id, "Discarding stale compression result");
            return false;
        }

        let action = match completion.outcome {
            Ok(image) => {
                tracing::info!(
                    request = %id,
                    input_bytes = completion.request.source.len(),
                    output_bytes = image.len(),
                    width = image.width,
                    height = image.height,
                    "Compression finished"
                );
                Action::CompressSucceeded {
                    request: completion.request,
                    image,
                }
            }
            Err(failure) => {
                tracing::error!(request = %id, code = %failure.code, "Image compression error: {}", failure.message);
                Action::CompressFailed {
                    request: completion.request,
                    failure,
                }
            }
        };

        self.dispatch(action);
        true
    }

    /// Compress the selected file at the current rate.
    ///
    /// Returns `None` when nothing was started (no file, or already
    /// compressing); otherwise the stored result or the failure.
    pub async fn compress(&mut self) -> Option<std::result::Result<CompressedResult, CompressionFailure>> {
        let request = self.begin_compress()?;
        let id = request.id;
        let completion = run_request(self.compressor(), request).await;
        let failure = completion.outcome.as_ref().err().cloned();
        self.finish(completion);

        if let Some(failure) = failure {
            return Some(Err(failure));
        }
        Some(
            self.state
                .result()
                .filter(|result| result.request == id)
                .cloned()
                .ok_or_else(|| CompressionFailure::new(ErrorCode::Internal, "Result was superseded")),
        )
    }

    /// Save the current result into `dir` as `compressed_<selected name>`.
    ///
    /// Does nothing and returns `Ok(None)` when there is no result.
    pub fn download(&self, dir: &Path) -> Result<Option<PathBuf>> {
        match self.state.download() {
            Some(artifact) => artifact.write_to(dir).map(Some),
            None => {
                tracing::debug!("Nothing to download");
                Ok(None)
            }
        }
    }

    fn dispatch(&mut self, action: Action) {
        let state = std::mem::take(&mut self.state);
        self.state = reduce(state, action);
        self.sync_preview();
    }

    fn sync_preview(&mut self) {
        let Some(result) = self.state.result() else {
            self.preview = None;
            return;
        };
        let current = self
            .preview
            .as_ref()
            .is_some_and(|handle| handle.shows(&result.image));
        if !current {
            // Assigning drops, and so releases, the superseded handle
            self.preview = Some(self.previews.acquire(Arc::clone(&result.image)));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compressor::ImageCompressor;
    use image::{DynamicImage, ImageOutputFormat, Rgb, RgbImage};
    use shrink_image::{CompressionOptions, ImageFormat};
    use std::io::Cursor;
    use std::sync::Mutex;

    /// Records the options it is called with and returns a canned outcome.
    #[derive(Default)]
    struct FakeCompressor {
        calls: Mutex<Vec<CompressionOptions>>,
        fail: bool,
    }

    impl FakeCompressor {
        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::default()
            }
        }

        fn calls(&self) -> Vec<CompressionOptions> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl Compressor for FakeCompressor {
        fn compress(
            &self,
            data: &[u8],
            options: &CompressionOptions,
        ) -> std::result::Result<CompressedImage, CompressionFailure> {
            self.calls.lock().unwrap().push(*options);
            if self.fail {
                return Err(CompressionFailure::new(ErrorCode::DecodeFailed, "corrupt data"));
            }
            Ok(CompressedImage {
                bytes: data[..data.len() / 2].to_vec(),
                format: ImageFormat::Png,
                width: 4,
                height: 4,
            })
        }
    }

    struct PanickingCompressor;

    impl Compressor for PanickingCompressor {
        fn compress(
            &self,
            _data: &[u8],
            _options: &CompressionOptions,
        ) -> std::result::Result<CompressedImage, CompressionFailure> {
            panic!("encoder blew up");
        }
    }

    fn source(name: &str) -> SourceImage {
        SourceImage::from_bytes(name, vec![0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A])
    }

    fn png(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_fn(width, height, |x, y| Rgb([x as u8, y as u8, 90]));
        let mut buffer = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img)
            .write_to(&mut buffer, ImageOutputFormat::Png)
            .unwrap();
        buffer.into_inner()
    }

    fn rate(p: u8) -> CompressionRate {
        CompressionRate::new(p).unwrap()
    }

    #[tokio::test]
    async fn test_compress_without_selection_is_noop() {
        let mut session = Session::new(FakeCompressor::default());
        assert!(session.compress().await.is_none());
        assert!(!session.state().is_compressing());
        assert!(session.state().result().is_none());
        assert!(session.compressor().calls().is_empty());
    }

    #[tokio::test]
    async fn test_default_rate_options_reach_compressor() {
        let mut session = Session::new(FakeCompressor::default());
        session.select_file(source("photo.png"));
        session.compress().await.unwrap().unwrap();

        let calls = session.compressor().calls();
        assert_eq!(calls.len(), 1);
        let json = serde_json::to_value(calls[0]).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "maxSizeMB": 1.0,
                "maxWidthOrHeight": 1920,
                "useWebWorker": true,
                "initialQuality": 0.3,
            })
        );
    }

    #[tokio::test]
    async fn test_rate_extremes_reach_compressor() {
        let mut session = Session::new(FakeCompressor::default());
        session.select_file(source("photo.png"));

        session.set_rate(rate(100));
        session.compress().await.unwrap().unwrap();
        session.set_rate(rate(10));
        session.compress().await.unwrap().unwrap();

        let calls = session.compressor().calls();
        assert_eq!(calls[0].initial_quality, 0.01);
        assert_eq!(calls[1].initial_quality, 0.9);
    }

    #[tokio::test]
    async fn test_success_populates_result_and_preview() {
        let mut session = Session::new(FakeCompressor::default());
        session.select_file(source("photo.png"));

        let result = session.compress().await.unwrap().unwrap();
        assert_eq!(result.image.len(), 4);
        assert!(!session.state().is_compressing());
        assert!(session.preview().unwrap().url().starts_with("blob:shrink/"));
    }

    #[tokio::test]
    async fn test_failure_is_recorded_not_stored() {
        let mut session = Session::new(FakeCompressor::failing());
        session.select_file(source("photo.png"));

        let failure = session.compress().await.unwrap().unwrap_err();
        assert_eq!(failure.code, ErrorCode::DecodeFailed);
        assert!(!session.state().is_compressing());
        assert!(session.state().result().is_none());
        assert!(session.preview().is_none());
        assert_eq!(session.state().last_error(), Some(&failure));
    }

    #[tokio::test]
    async fn test_failed_request_after_success_leaves_result() {
        let mut session = Session::new(FakeCompressor::default());
        session.select_file(source("photo.png"));
        session.compress().await.unwrap().unwrap();
        let before = session.state().result().cloned();
        let preview_url = session.preview().unwrap().url();

        let request = session.begin_compress().unwrap();
        let completion = Completion {
            request,
            outcome: Err(CompressionFailure::new(ErrorCode::CompressionFailed, "out of memory")),
        };
        assert!(session.finish(completion));

        assert!(!session.state().is_compressing());
        assert_eq!(session.state().result().cloned(), before);
        assert_eq!(session.preview().unwrap().url(), preview_url);
        assert!(session.state().last_error().is_some());
    }

    #[tokio::test]
    async fn test_begin_twice_is_gated() {
        let mut session = Session::new(FakeCompressor::default());
        session.select_file(source("photo.png"));
        assert!(session.begin_compress().is_some());
        assert!(session.begin_compress().is_none());
    }

    #[tokio::test]
    async fn test_late_result_for_old_selection_discarded() {
        let mut session = Session::new(FakeCompressor::default());
        session.select_file(source("first.png"));
        let request = session.begin_compress().unwrap();

        session.select_file(source("second.png"));
        let completion = run_request(session.compressor(), request).await;
        assert!(completion.outcome.is_ok());

        assert!(!session.finish(completion));
        assert!(session.state().result().is_none());
        assert!(session.preview().is_none());
        assert!(session.begin_compress().is_some());
    }

    #[tokio::test]
    async fn test_inline_execution_without_worker() {
        let mut session = Session::new(FakeCompressor::default());
        session.select_file(source("photo.png"));
        let mut request = session.begin_compress().unwrap();
        request.options.use_web_worker = false;

        let completion = run_request(session.compressor(), request).await;
        assert!(session.finish(completion));
        assert!(session.state().result().is_some());
    }

    #[tokio::test]
    async fn test_worker_panic_becomes_failure() {
        let mut session = Session::new(PanickingCompressor);
        session.select_file(source("photo.png"));

        let failure = session.compress().await.unwrap().unwrap_err();
        assert_eq!(failure.code, ErrorCode::WorkerFailed);
        assert!(!session.state().is_compressing());
    }

    #[tokio::test]
    async fn test_preview_handles_do_not_accumulate() {
        let registry = PreviewRegistry::new();
        let mut session = Session::with_registry(FakeCompressor::default(), registry.clone());
        session.select_file(source("photo.png"));

        for _ in 0..5 {
            session.compress().await.unwrap().unwrap();
            assert_eq!(registry.live_count(), 1);
        }

        drop(session);
        assert_eq!(registry.live_count(), 0);
    }

    #[tokio::test]
    async fn test_download_without_result_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = Session::new(FakeCompressor::default());
        session.select_file(source("photo.png"));

        assert!(session.download(dir.path()).unwrap().is_none());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_end_to_end_with_image_compressor() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = Session::new(ImageCompressor);
        session.select_file(SourceImage::from_bytes("wide.png", png(2400, 600)));

        let result = session.compress().await.unwrap().unwrap();
        assert_eq!((result.image.width, result.image.height), (1920, 480));
        assert_eq!(result.image.mime_type(), "image/png");

        let path = session.download(dir.path()).unwrap().unwrap();
        assert_eq!(path.file_name().unwrap(), "compressed_wide.png");
        assert_eq!(std::fs::read(&path).unwrap(), result.image.bytes);
    }

    #[tokio::test]
    async fn test_download_uses_current_selection_name() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = Session::new(FakeCompressor::default());
        session.select_file(source("first.png"));
        session.compress().await.unwrap().unwrap();
        session.select_file(source("second.png"));

        let path = session.download(dir.path()).unwrap().unwrap();
        assert_eq!(path.file_name().unwrap(), "compressed_second.png");
    }
}
