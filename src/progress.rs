//! Progress-callback trait for per-file batch events.
//!
//! Inject an [`Arc<dyn BatchProgressCallback>`] via
//! [`crate::config::BatchConfigBuilder::progress_callback`] to be told as the
//! driver works through the input directory. The CLI uses it to drive its
//! progress bar; library callers can forward events wherever they like.
//!
//! # Example
//!
//! ```rust
//! use pdfstack::{BatchConfig, BatchProgressCallback, Region};
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! struct Printer;
//!
//! impl BatchProgressCallback for Printer {
//!     fn on_file_complete(&self, idx: usize, total: usize, _input: &Path,
//!                         output: &Path, width: u32, height: u32) {
//!         eprintln!("{idx}/{total} → {} ({width}x{height})", output.display());
//!     }
//! }
//!
//! let config = BatchConfig::builder("files", "output")
//!     .region(Region::new(0, 0, 100, 100))
//!     .progress_callback(Arc::new(Printer))
//!     .build()
//!     .unwrap();
//! ```

use std::path::Path;
use std::sync::Arc;

/// Called by the batch driver as it processes each file.
///
/// Files are processed one at a time, so calls never overlap, but the trait
/// is `Send + Sync` so a single callback can be shared with other threads
/// (a progress bar ticker, for instance). All methods default to no-ops.
pub trait BatchProgressCallback: Send + Sync {
    /// Called once after the input directory has been scanned.
    ///
    /// # Arguments
    /// * `total_files` — number of `.pdf` files that will be processed
    fn on_batch_start(&self, total_files: usize) {
        let _ = total_files;
    }

    /// Called before a file is rendered.
    ///
    /// # Arguments
    /// * `file_num`    — 1-indexed position in the batch
    /// * `total_files` — number of files in the batch
    /// * `input`       — path of the PDF
    fn on_file_start(&self, file_num: usize, total_files: usize, input: &Path) {
        let _ = (file_num, total_files, input);
    }

    /// Called after the combined PNG has been written.
    fn on_file_complete(
        &self,
        file_num: usize,
        total_files: usize,
        input: &Path,
        output: &Path,
        width: u32,
        height: u32,
    ) {
        let _ = (file_num, total_files, input, output, width, height);
    }

    /// Called when a file fails, whatever the failure policy.
    ///
    /// Under [`crate::config::FailurePolicy::Abort`] this is the last event
    /// before the driver returns its error.
    fn on_file_error(&self, file_num: usize, total_files: usize, input: &Path, error: &str) {
        let _ = (file_num, total_files, input, error);
    }

    /// Called once after every file has been attempted.
    fn on_batch_complete(&self, total_files: usize, success_count: usize) {
        let _ = (total_files, success_count);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl BatchProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::BatchConfig`].
pub type ProgressCallback = Arc<dyn BatchProgressCallback>;
