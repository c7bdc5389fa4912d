//! Error types for the pdfstack library.
//!
//! Two error types mirror the two ways a batch can go wrong:
//!
//! * [`PdfStackError`] — **Fatal**: the batch (or a single-file call) cannot
//!   continue. Returned as `Err(PdfStackError)` from [`crate::batch::run`],
//!   [`crate::batch::run_batch`] and the individual pipeline stages.
//!
//! * [`FileError`] — **Non-fatal**: one input file failed while the batch was
//!   running with [`crate::config::FailurePolicy::Skip`]. Stored inside
//!   [`crate::batch::FileOutcome`] so callers can see which files were
//!   skipped and why.
//!
//! Every fatal variant maps onto a coarse [`ErrorKind`] so callers can branch
//! on the category (bad document, bad geometry, no regions, disk trouble)
//! without matching every variant.

use crate::config::Region;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the pdfstack library.
#[derive(Debug, Error)]
pub enum PdfStackError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input directory does not exist.
    #[error("Input directory not found: '{path}'")]
    InputDirNotFound { path: PathBuf },

    /// Input directory exists but could not be listed.
    #[error("Failed to read input directory '{path}': {source}")]
    InputDirUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// PDF file vanished between listing and opening.
    #[error("PDF file not found: '{path}'")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    // ── Document errors ───────────────────────────────────────────────────
    /// pdfium could not open the file as a PDF.
    #[error("Cannot open '{path}' as a PDF: {detail}")]
    InvalidDocument { path: PathBuf, detail: String },

    /// The document opened but has no pages to render.
    #[error("PDF '{path}' has no pages")]
    EmptyDocument { path: PathBuf },

    /// pdfium failed while rasterising the first page.
    #[error("Rasterisation failed for '{path}': {detail}")]
    RasterisationFailed { path: PathBuf, detail: String },

    // ── Geometry errors ───────────────────────────────────────────────────
    /// No regions were configured; there is nothing to stack.
    #[error("No regions configured: at least one region is required")]
    EmptyRegions,

    /// Region corners are not ordered (`x1 < x2`, `y1 < y2`).
    #[error("Region #{index} {region} is malformed: expected x1 < x2 and y1 < y2")]
    MalformedRegion { index: usize, region: Region },

    /// Region reaches past the edge of the rendered page.
    #[error("Region #{index} {region} lies outside the {width}x{height} px page")]
    RegionOutOfBounds {
        index: usize,
        region: Region,
        width: u32,
        height: u32,
    },

    /// Stacked crops would exceed the combined image size limit.
    #[error("Combined image would be {width}x{height} px, which exceeds the image size limit")]
    CanvasTooLarge { width: u32, height: u64 },

    // ── Output errors ─────────────────────────────────────────────────────
    /// Could not create the output directory.
    #[error("Failed to create output directory '{path}': {source}")]
    OutputDirFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not create, write or rename the output PNG.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// PNG encoding of the combined image failed.
    #[error("Failed to encode '{path}' as PNG: {source}")]
    EncodeFailed {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation or value parsing failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Pdfium binding errors ─────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
PDFium is normally downloaded automatically on first run.\n\
If the download failed, you can:\n\
  • Check your internet connection and try again.\n\
  • Set PDFIUM_LIB_PATH=/path/to/libpdfium to use an existing copy.\n\
  • Pass --pdfium-lib /path/to/libpdfium.\n"
    )]
    PdfiumBindingFailed(String),

    // ── Batch errors ──────────────────────────────────────────────────────
    /// A single file failed and the batch was aborted.
    #[error("Failed to process '{path}': {source}")]
    FileFailed {
        path: PathBuf,
        #[source]
        source: Box<PdfStackError>,
    },

    /// Some files succeeded but at least one was skipped after failing.
    ///
    /// Returned by [`crate::batch::BatchReport::into_result`].
    #[error("{failed}/{total} files failed")]
    PartialFailure {
        succeeded: usize,
        failed: usize,
        total: usize,
    },
}

/// Coarse category of a [`PdfStackError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Unreadable, invalid or empty PDF.
    Document,
    /// Region malformed or outside the page.
    Geometry,
    /// No regions configured.
    EmptyInput,
    /// Input listing or output writing failed.
    Filesystem,
    /// Invalid configuration value.
    Config,
    /// pdfium library unavailable.
    Engine,
    /// Aggregate batch outcome.
    Batch,
}

impl PdfStackError {
    /// Category of this error. [`PdfStackError::FileFailed`] reports the
    /// category of the wrapped cause.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::FileNotFound { .. }
            | Self::PermissionDenied { .. }
            | Self::InvalidDocument { .. }
            | Self::EmptyDocument { .. }
            | Self::RasterisationFailed { .. } => ErrorKind::Document,
            Self::MalformedRegion { .. }
            | Self::RegionOutOfBounds { .. }
            | Self::CanvasTooLarge { .. } => ErrorKind::Geometry,
            Self::EmptyRegions => ErrorKind::EmptyInput,
            Self::InputDirNotFound { .. }
            | Self::InputDirUnreadable { .. }
            | Self::OutputDirFailed { .. }
            | Self::OutputWriteFailed { .. }
            | Self::EncodeFailed { .. } => ErrorKind::Filesystem,
            Self::InvalidConfig(_) => ErrorKind::Config,
            Self::PdfiumBindingFailed(_) => ErrorKind::Engine,
            Self::FileFailed { source, .. } => source.kind(),
            Self::PartialFailure { .. } => ErrorKind::Batch,
        }
    }
}

/// A non-fatal error for a single input file.
///
/// Recorded in [`crate::batch::FileOutcome`] when the batch runs with
/// [`crate::config::FailurePolicy::Skip`].
#[derive(Debug, Clone, Error, Serialize, Deserialize)]
#[error("{}: {message}", .path.display())]
pub struct FileError {
    #[serde(serialize_with = "lossy_path::serialize")]
    pub path: PathBuf,
    pub kind: ErrorKind,
    pub message: String,
}

impl FileError {
    pub fn new(path: impl Into<PathBuf>, err: &PdfStackError) -> Self {
        Self {
            path: path.into(),
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

/// Serialise paths with `to_string_lossy` so names that are not valid UTF-8
/// still appear in JSON reports instead of failing the whole report.
pub(crate) mod lossy_path {
    use serde::Serializer;
    use std::path::Path;

    pub fn serialize<P: AsRef<Path>, S: Serializer>(path: &P, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&path.as_ref().to_string_lossy())
    }

    pub fn serialize_opt<P: AsRef<Path>, S: Serializer>(
        path: &Option<P>,
        s: S,
    ) -> Result<S::Ok, S::Error> {
        match path {
            Some(p) => serialize(p, s),
            None => s.serialize_none(),
        }
    }
}
