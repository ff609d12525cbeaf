//! Session state and its reducer.
//!
//! All session data lives in one [`SessionState`] value. It only changes by
//! feeding an [`Action`] through [`reduce`], which is pure: no I/O, no
//! clocks, no logging. The async side of compression lives in
//! [`crate::session`] and reports back through the completion actions.
//!
//! ```text
//! Idle --select--> Selected --start--> Compressing --succeeded--> Ready
//!                     ^                    |
//!                     +------failed--------+
//! ```
//!
//! Every compression request is tagged with a [`RequestId`]. A completion
//! is applied only if its id is the one currently in flight; anything else
//! is stale and dropped.

use crate::download::DownloadArtifact;
use crate::error::{Error, ErrorCode};
use crate::source::SourceImage;
use serde::Serialize;
use shrink_image::{CompressedImage, CompressionOptions, CompressionRate};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Monotonically increasing tag for compression requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
pub struct RequestId(u64);

impl RequestId {
    fn next(self) -> Self {
        Self(self.0 + 1)
    }

    /// Numeric value.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Why a compression call failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("[{code}] {message}")]
pub struct CompressionFailure {
    /// Error code
    pub code: ErrorCode,
    /// Human-readable reason
    pub message: String,
}

impl CompressionFailure {
    /// Create a failure with a code and message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl From<Error> for CompressionFailure {
    fn from(err: Error) -> Self {
        Self::new(err.code, err.message)
    }
}

impl From<shrink_image::ImageError> for CompressionFailure {
    fn from(err: shrink_image::ImageError) -> Self {
        Error::from(err).into()
    }
}

/// Whether a compression call is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationStatus {
    /// Nothing in flight
    Idle,
    /// The given request is in flight
    Compressing(RequestId),
}

/// Coarse phase of the session, for presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// No file selected
    Idle,
    /// A file is selected; no result for it yet
    Selected,
    /// A compression call is running
    Compressing,
    /// A result for the current file is available
    Ready,
}

/// The stored output of the last applied successful compression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressedResult {
    /// Compressed image
    pub image: Arc<CompressedImage>,
    /// Name of the file it was made from
    pub source_name: String,
    /// Size of the file it was made from
    pub source_len: usize,
    /// Rate it was made at
    pub rate: CompressionRate,
    /// Request that produced it
    pub request: RequestId,
    selection: u64,
}

/// Everything needed to run one compression call.
#[derive(Debug, Clone)]
pub struct CompressionRequest {
    /// Tag for matching the completion
    pub id: RequestId,
    /// File to compress, as selected when the request was issued
    pub source: SourceImage,
    /// Compressor options, as mapped when the request was issued
    pub options: CompressionOptions,
    /// Rate the options were mapped from
    pub rate: CompressionRate,
    selection: u64,
}

/// Named transitions of the session.
#[derive(Debug, Clone)]
pub enum Action {
    /// Replace the selected file
    SelectFile(SourceImage),
    /// Change the compression rate
    SetRate(CompressionRate),
    /// Issue a compression request for the current file and rate
    StartCompress,
    /// A request finished with a compressed image
    CompressSucceeded {
        /// The request as issued
        request: CompressionRequest,
        /// Compressor output
        image: CompressedImage,
    },
    /// A request failed
    CompressFailed {
        /// The request as issued
        request: CompressionRequest,
        /// Reason
        failure: CompressionFailure,
    },
}

/// Immutable snapshot of the session.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    source: Option<SourceImage>,
    rate: CompressionRate,
    result: Option<CompressedResult>,
    in_flight: Option<CompressionRequest>,
    last_error: Option<CompressionFailure>,
    last_request: RequestId,
    selection: u64,
}

impl SessionState {
    /// Fresh session: nothing selected, default rate.
    pub fn new() -> Self {
        Self::default()
    }

    /// The selected file.
    pub fn source(&self) -> Option<&SourceImage> {
        self.source.as_ref()
    }

    /// The current compression rate.
    pub fn rate(&self) -> CompressionRate {
        self.rate
    }

    /// The last applied result, possibly made from a previously selected file.
    pub fn result(&self) -> Option<&CompressedResult> {
        self.result.as_ref()
    }

    /// The failure of the last applied request, if it failed.
    pub fn last_error(&self) -> Option<&CompressionFailure> {
        self.last_error.as_ref()
    }

    /// Whether a compression call is in flight.
    pub fn status(&self) -> OperationStatus {
        match &self.in_flight {
            Some(request) => OperationStatus::Compressing(request.id),
            None => OperationStatus::Idle,
        }
    }

    /// Shorthand for `status() != Idle`.
    pub fn is_compressing(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Whether the stored result was made from an earlier selection.
    pub fn result_is_stale(&self) -> bool {
        self.result
            .as_ref()
            .is_some_and(|result| result.selection != self.selection)
    }

    /// Coarse phase for presentation.
    ///
    /// A failed retry stays `Ready` while the earlier result for the same
    /// selection is still shown.
    pub fn phase(&self) -> Phase {
        if self.is_compressing() {
            Phase::Compressing
        } else if self.source.is_none() {
            Phase::Idle
        } else if self.result.is_some() && !self.result_is_stale() {
            Phase::Ready
        } else {
            Phase::Selected
        }
    }

    /// The in-flight request, with the selection and options captured
    /// when it was issued.
    pub fn pending_request(&self) -> Option<CompressionRequest> {
        self.in_flight.clone()
    }

    /// The file a download would produce, named after the current selection.
    pub fn download(&self) -> Option<DownloadArtifact> {
        let result = self.result.as_ref()?;
        let name = self
            .source
            .as_ref()
            .map_or(result.source_name.as_str(), SourceImage::name);
        Some(DownloadArtifact::new(name, Arc::clone(&result.image)))
    }

    fn settles(&self, request: &CompressionRequest) -> bool {
        self.in_flight
            .as_ref()
            .is_some_and(|in_flight| in_flight.id == request.id)
    }
}

/// Apply one action.
pub fn reduce(state: SessionState, action: Action) -> SessionState {
    match action {
        Action::SelectFile(source) => SessionState {
            source: Some(source),
            // The in-flight request, if any, now belongs to an old selection
            in_flight: None,
            selection: state.selection + 1,
            ..state
        },

        Action::SetRate(rate) => SessionState { rate, ..state },

        Action::StartCompress => {
            let Some(source) = state.source.clone() else {
                return state;
            };
            if state.is_compressing() {
                return state;
            }
            let id = state.last_request.next();
            let request = CompressionRequest {
                id,
                source,
                options: CompressionOptions::for_rate(state.rate),
                rate: state.rate,
                selection: state.selection,
            };
            SessionState {
                in_flight: Some(request),
                last_request: id,
                ..state
            }
        }

        Action::CompressSucceeded { request, image } => {
            if !state.settles(&request) {
                return state;
            }
            let result = CompressedResult {
                image: Arc::new(image),
                source_name: request.source.name().to_string(),
                source_len: request.source.len(),
                rate: request.rate,
                request: request.id,
                selection: request.selection,
            };
            SessionState {
                result: Some(result),
                last_error: None,
                in_flight: None,
                ..state
            }
        }

        Action::CompressFailed { request, failure } => {
            if !state.settles(&request) {
                return state;
            }
            SessionState {
                last_error: Some(failure),
                in_flight: None,
                ..state
            }
        }
    }
}
