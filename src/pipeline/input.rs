//! Input discovery: find the PDFs a batch will process.
//!
//! Selection is by name only. A directory entry is picked when it is a
//! regular file whose name ends in `.pdf` (lowercase; `REPORT.PDF` is
//! ignored). File contents are not sniffed, so a broken PDF is only
//! discovered when the renderer opens it.

use crate::error::PdfStackError;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Extension matched by [`list_pdfs`], case-sensitive.
pub const PDF_SUFFIX: &str = ".pdf";

/// Suffix appended to the input stem to name the combined image.
pub const OUTPUT_SUFFIX: &str = "_combined.png";

/// List the PDFs directly inside `dir`, sorted by file name.
pub fn list_pdfs(dir: &Path) -> Result<Vec<PathBuf>, PdfStackError> {
    if !dir.is_dir() {
        return Err(PdfStackError::InputDirNotFound {
            path: dir.to_path_buf(),
        });
    }

    let unreadable = |source| PdfStackError::InputDirUnreadable {
        path: dir.to_path_buf(),
        source,
    };

    let mut pdfs = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(unreadable)? {
        let entry = entry.map_err(unreadable)?;
        // Byte match, so names that are not valid UTF-8 are still picked up.
        if !entry
            .file_name()
            .as_encoded_bytes()
            .ends_with(PDF_SUFFIX.as_bytes())
        {
            continue;
        }
        // Follows symlinks, so a link to a PDF counts.
        let path = entry.path();
        if !path.is_file() {
            debug!("Skipping non-file entry {}", path.display());
            continue;
        }
        pdfs.push(path);
    }

    pdfs.sort();
    debug!("Found {} PDF(s) in {}", pdfs.len(), dir.display());
    Ok(pdfs)
}

/// Output path for `input`: `<output_dir>/<stem>_combined.png`.
///
/// Only the last extension is stripped, so `q3.final.pdf` becomes
/// `q3.final_combined.png`.
pub fn output_path_for(input: &Path, output_dir: &Path) -> PathBuf {
    let mut name = input
        .file_stem()
        .map(OsStr::to_os_string)
        .unwrap_or_default();
    name.push(OUTPUT_SUFFIX);
    output_dir.join(name)
}

/// Check that `path` still exists and is readable before handing it to pdfium.
///
/// pdfium reports every open failure the same way, so this gives missing
/// and unreadable files their own error.
pub fn check_readable(path: &Path) -> Result<(), PdfStackError> {
    match std::fs::File::open(path) {
        Ok(_) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            Err(PdfStackError::PermissionDenied {
                path: path.to_path_buf(),
            })
        }
        Err(_) => Err(PdfStackError::FileNotFound {
            path: path.to_path_buf(),
        }),
    }
}
