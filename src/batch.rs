//! Batch driver: every PDF in a directory → one combined PNG each.
//!
//! Files are handled one at a time, in file-name order, each through the
//! same three stages:
//!
//! ```text
//! a.pdf ──▶ render page 1 ──▶ crop + stack ──▶ out/a_combined.png
//! ```
//!
//! What happens when a file fails is up to
//! [`FailurePolicy`](crate::config::FailurePolicy): `Abort` returns
//! [`PdfStackError::FileFailed`] naming the file, `Skip` records a
//! [`FileError`] in the report and carries on.

use crate::config::{BatchConfig, FailurePolicy};
use crate::engine;
use crate::error::{lossy_path, FileError, PdfStackError};
use crate::pipeline::render::{PageInfo, PageRenderer, PdfiumRenderer};
use crate::pipeline::{compose, input, write};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Result of processing one input file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileOutcome {
    /// The PDF that was processed.
    #[serde(serialize_with = "lossy_path::serialize")]
    pub input: PathBuf,
    /// The PNG written, or None if the file failed.
    #[serde(serialize_with = "lossy_path::serialize_opt")]
    pub output: Option<PathBuf>,
    /// Combined image width in pixels (0 on failure).
    pub width: u32,
    /// Combined image height in pixels (0 on failure).
    pub height: u32,
    /// Wall-clock time spent on this file.
    pub duration_ms: u64,
    /// Why the file failed, under [`FailurePolicy::Skip`].
    pub error: Option<FileError>,
}

impl FileOutcome {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Counters for a whole batch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchStats {
    /// PDFs found in the input directory.
    pub total_files: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub total_duration_ms: u64,
}

/// Everything a batch produced, in processing order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchReport {
    pub files: Vec<FileOutcome>,
    pub stats: BatchStats,
}

impl BatchReport {
    /// Turn any skipped failure into [`PdfStackError::PartialFailure`].
    pub fn into_result(self) -> Result<Self, PdfStackError> {
        if self.stats.failed > 0 {
            return Err(PdfStackError::PartialFailure {
                succeeded: self.stats.succeeded,
                failed: self.stats.failed,
                total: self.stats.total_files,
            });
        }
        Ok(self)
    }

    /// Outputs written, in processing order.
    pub fn outputs(&self) -> impl Iterator<Item = &Path> {
        self.files.iter().filter_map(|f| f.output.as_deref())
    }
}

/// Bind pdfium and run the batch described by `config`.
///
/// This is the primary entry point for the library.
///
/// # Errors
/// Returns `Err` when pdfium cannot be bound, the input directory cannot be
/// listed, the output directory cannot be created, or (with
/// [`FailurePolicy::Abort`]) any file fails.
pub fn run(config: &BatchConfig) -> Result<BatchReport, PdfStackError> {
    let pdfium = engine::bind(config.pdfium_lib_path.as_deref(), None)?;
    let renderer = PdfiumRenderer::new(pdfium, config.dpi);
    run_batch(&renderer, config)
}

/// Run the batch with a caller-supplied renderer.
pub fn run_batch(
    renderer: &dyn PageRenderer,
    config: &BatchConfig,
) -> Result<BatchReport, PdfStackError> {
    let total_start = Instant::now();
    info!(
        "Starting batch: {} → {} ({} region(s))",
        config.input_dir.display(),
        config.output_dir.display(),
        config.regions.len()
    );

    // ── Step 1: Prepare output directory ─────────────────────────────────
    write::ensure_output_dir(&config.output_dir)?;

    // ── Step 2: Find inputs ──────────────────────────────────────────────
    let pdfs = input::list_pdfs(&config.input_dir)?;
    let total = pdfs.len();
    info!("Found {} PDF file(s)", total);

    if let Some(ref cb) = config.progress_callback {
        cb.on_batch_start(total);
    }

    // ── Step 3: Process each file in turn ────────────────────────────────
    let mut files = Vec::with_capacity(total);
    for (i, pdf) in pdfs.iter().enumerate() {
        let file_num = i + 1;
        if let Some(ref cb) = config.progress_callback {
            cb.on_file_start(file_num, total, pdf);
        }

        let file_start = Instant::now();
        match process_file(renderer, pdf, config) {
            Ok((output, (width, height))) => {
                if let Some(ref cb) = config.progress_callback {
                    cb.on_file_complete(file_num, total, pdf, &output, width, height);
                }
                files.push(FileOutcome {
                    input: pdf.clone(),
                    output: Some(output),
                    width,
                    height,
                    duration_ms: file_start.elapsed().as_millis() as u64,
                    error: None,
                });
            }
            Err(e) => {
                if let Some(ref cb) = config.progress_callback {
                    cb.on_file_error(file_num, total, pdf, &e.to_string());
                }
                match config.on_error {
                    FailurePolicy::Abort => {
                        return Err(PdfStackError::FileFailed {
                            path: pdf.clone(),
                            source: Box::new(e),
                        });
                    }
                    FailurePolicy::Skip => {
                        warn!("Skipping {}: {}", pdf.display(), e);
                        files.push(FileOutcome {
                            input: pdf.clone(),
                            output: None,
                            width: 0,
                            height: 0,
                            duration_ms: file_start.elapsed().as_millis() as u64,
                            error: Some(FileError::new(pdf, &e)),
                        });
                    }
                }
            }
        }
    }

    // ── Step 4: Stats ────────────────────────────────────────────────────
    let succeeded = files.iter().filter(|f| f.is_success()).count();
    let stats = BatchStats {
        total_files: total,
        succeeded,
        failed: total - succeeded,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
    };

    info!(
        "Batch complete: {}/{} file(s), {}ms total",
        succeeded, total, stats.total_duration_ms
    );
    if let Some(ref cb) = config.progress_callback {
        cb.on_batch_complete(total, succeeded);
    }

    Ok(BatchReport { files, stats })
}

/// Render, crop, stack and write one PDF.
///
/// Returns the output path and the combined image dimensions.
pub fn process_file(
    renderer: &dyn PageRenderer,
    pdf: &Path,
    config: &BatchConfig,
) -> Result<(PathBuf, (u32, u32)), PdfStackError> {
    let page = renderer.render_first_page(pdf)?;
    let combined = compose::compose(&page, &config.regions, config.fill)?;
    // The page buffer is no longer needed once the crops are copied out.
    drop(page);

    let output = input::output_path_for(pdf, &config.output_dir);
    write::write_png(&combined, &output)?;
    debug!("{} → {}", pdf.display(), output.display());
    Ok((output, combined.dimensions()))
}

/// One `inspect` row: a PDF and its first-page size, or why it could not be read.
pub type InspectRow = (PathBuf, Result<PageInfo, PdfStackError>);

/// First-page size of every PDF in `dir` at `dpi`, without rendering anything.
///
/// Useful for picking region coordinates. Files that cannot be opened are
/// reported individually instead of aborting the listing.
pub fn inspect(
    dir: &Path,
    dpi: u32,
    pdfium_lib_path: Option<&Path>,
) -> Result<Vec<InspectRow>, PdfStackError> {
    let pdfium = engine::bind(pdfium_lib_path, None)?;
    let renderer = PdfiumRenderer::new(pdfium, dpi);
    inspect_with(&renderer, dir)
}

/// [`inspect`] with a caller-supplied renderer.
pub fn inspect_with(
    renderer: &dyn PageRenderer,
    dir: &Path,
) -> Result<Vec<InspectRow>, PdfStackError> {
    Ok(input::list_pdfs(dir)?
        .into_iter()
        .map(|pdf| {
            let info = renderer.inspect_first_page(&pdf);
            (pdf, info)
        })
        .collect())
}
