//! PDF rasterisation: render the first page of a document to an RGB image.
//!
//! The batch driver talks to rendering through the [`PageRenderer`] trait so
//! it can be exercised without a pdfium library. [`PdfiumRenderer`] is the
//! real implementation.
//!
//! Each call opens the document, renders page 0 and drops the
//! `PdfDocument` before returning, so pdfium's file handle is released on
//! every path out of the function, errors included.

use crate::config::NATIVE_DPI;
use crate::error::PdfStackError;
use crate::pipeline::input;
use image::RgbImage;
use pdfium_render::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Renders the first page of a PDF.
pub trait PageRenderer {
    /// Rasterise page 0 of `path` to an RGB image without alpha.
    fn render_first_page(&self, path: &Path) -> Result<RgbImage, PdfStackError>;

    /// Report the page count and first-page pixel size without rasterising.
    fn inspect_first_page(&self, path: &Path) -> Result<PageInfo, PdfStackError>;
}

/// Size of a document's first page, as reported by [`PageRenderer::inspect_first_page`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageInfo {
    pub page_count: usize,
    /// First-page width in pixels at the renderer's DPI.
    pub width_px: u32,
    /// First-page height in pixels at the renderer's DPI.
    pub height_px: u32,
}

/// [`PageRenderer`] backed by a bound pdfium library.
pub struct PdfiumRenderer {
    pdfium: Pdfium,
    scale: f32,
}

impl PdfiumRenderer {
    /// Render at `dpi`; 72 gives one pixel per PDF point.
    pub fn new(pdfium: Pdfium, dpi: u32) -> Self {
        Self {
            pdfium,
            scale: scale_for_dpi(dpi),
        }
    }

    fn open(&self, path: &Path) -> Result<PdfDocument<'_>, PdfStackError> {
        input::check_readable(path)?;
        // Encrypted files surface here too: no password is ever supplied.
        self.pdfium
            .load_pdf_from_file(path, None)
            .map_err(|e| PdfStackError::InvalidDocument {
                path: path.to_path_buf(),
                detail: format!("{:?}", e),
            })
    }
}

impl PageRenderer for PdfiumRenderer {
    fn render_first_page(&self, path: &Path) -> Result<RgbImage, PdfStackError> {
        let document = self.open(path)?;
        let pages = document.pages();
        let page = first_page(&pages, path)?;

        let render_config = PdfRenderConfig::new().scale_page_by_factor(self.scale);
        let bitmap = page.render_with_config(&render_config).map_err(|e| {
            PdfStackError::RasterisationFailed {
                path: path.to_path_buf(),
                detail: format!("{:?}", e),
            }
        })?;

        let image = bitmap.as_image().to_rgb8();
        debug!(
            "Rendered {} page 1 → {}x{} px",
            path.display(),
            image.width(),
            image.height()
        );
        Ok(image)
    }

    fn inspect_first_page(&self, path: &Path) -> Result<PageInfo, PdfStackError> {
        let document = self.open(path)?;
        let pages = document.pages();
        let page = first_page(&pages, path)?;

        Ok(PageInfo {
            page_count: pages.len() as usize,
            width_px: scaled(page.width().value, self.scale),
            height_px: scaled(page.height().value, self.scale),
        })
    }
}

fn first_page<'a>(pages: &PdfPages<'a>, path: &Path) -> Result<PdfPage<'a>, PdfStackError> {
    if pages.len() == 0 {
        return Err(PdfStackError::EmptyDocument {
            path: path.to_path_buf(),
        });
    }
    pages.get(0).map_err(|e| PdfStackError::RasterisationFailed {
        path: path.to_path_buf(),
        detail: format!("{:?}", e),
    })
}

/// pdfium scale factor for `dpi`.
fn scale_for_dpi(dpi: u32) -> f32 {
    dpi as f32 / NATIVE_DPI as f32
}

fn scaled(points: f32, scale: f32) -> u32 {
    (points * scale).round().max(0.0) as u32
}
