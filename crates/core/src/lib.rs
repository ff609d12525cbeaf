//! Core of the Shrink image compressor
//!
//! This crate holds everything between a selected file and a saved,
//! compressed copy:
//!
//! - **Error handling**: coded errors with context and recovery suggestions
//! - **Configuration**: TOML-based presentation settings
//! - **State**: one immutable session state driven by a pure reducer
//! - **Session**: the async compression invoker with stale-result protection
//! - **Preview**: scoped display handles for compressed results
//! - **Download**: writing `compressed_<name>` files
//!
//! # Example
//!
//! ```rust,no_run
//! use shrink_core::{ImageCompressor, Session, SourceImage};
//! use std::path::Path;
//!
//! # async fn run() -> shrink_core::Result<()> {
//! let mut session = Session::new(ImageCompressor);
//! session.select_file(SourceImage::from_path(Path::new("photo.png"))?);
//!
//! if let Some(Ok(result)) = session.compress().await {
//!     println!("{} bytes", result.image.len());
//!     session.download(Path::new("."))?;
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod compressor;
pub mod config;
pub mod download;
#[allow(missing_docs)]
pub mod error;
pub mod preview;
pub mod session;
pub mod source;
pub mod state;

pub use compressor::{Compressor, ImageCompressor};
pub use error::{Error, ErrorCode, Result, ResultExt};
pub use session::Session;
pub use source::SourceImage;
pub use shrink_image::{CompressionOptions, CompressionRate};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::compressor::{Compressor, ImageCompressor};
    pub use crate::config::Config;
    pub use crate::download::DownloadArtifact;
    pub use crate::error::{exit_codes, Error, ErrorCode, Result, ResultExt};
    pub use crate::preview::{PreviewHandle, PreviewRegistry};
    pub use crate::session::{run_request, Completion, Session};
    pub use crate::source::SourceImage;
    pub use crate::state::{
        reduce, Action, CompressedResult, CompressionFailure, CompressionRequest, Phase,
        SessionState,
    };
    pub use shrink_image::{CompressedImage, CompressionOptions, CompressionRate};
}
