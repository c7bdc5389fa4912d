//! PNG output.
//!
//! The image is encoded into a temp file next to the target and renamed into
//! place, so a crash or encode error never leaves a truncated PNG behind and
//! an existing file of the same name is replaced in one step.

use crate::error::PdfStackError;
use image::{ImageFormat, RgbImage};
use std::io::{BufWriter, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::debug;

/// Create `dir` and any missing parents.
pub fn ensure_output_dir(dir: &Path) -> Result<(), PdfStackError> {
    std::fs::create_dir_all(dir).map_err(|e| PdfStackError::OutputDirFailed {
        path: dir.to_path_buf(),
        source: e,
    })
}

/// Write `image` to `path` as PNG, overwriting any existing file.
pub fn write_png(image: &RgbImage, path: &Path) -> Result<(), PdfStackError> {
    let write_failed = |source| PdfStackError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir).map_err(write_failed)?;

    {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        image
            .write_to(&mut writer, ImageFormat::Png)
            .map_err(|e| PdfStackError::EncodeFailed {
                path: path.to_path_buf(),
                source: e,
            })?;
        writer.flush().map_err(write_failed)?;
    }

    tmp.persist(path).map_err(|e| write_failed(e.error))?;
    debug!(
        "Wrote {}x{} PNG → {}",
        image.width(),
        image.height(),
        path.display()
    );
    Ok(())
}
