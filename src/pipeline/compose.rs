//! Crop-and-stack compositing.
//!
//! ```text
//!  page                          combined
//! ┌──────────────┐              ┌──────────┐
//! │  ┌────────┐  │              │ region 0 │
//! │  │   0    │  │      ──▶     ├──────────┤
//! │  └────────┘  │              │ region 1 │
//! │  ┌────────┐  │              └──────────┘
//! │  │   1    │  │
//! │  └────────┘  │
//! └──────────────┘
//! ```
//!
//! Crops are pasted left-aligned, top to bottom, in region order. The canvas
//! is as wide as the widest crop and as tall as all crops together; pixels
//! to the right of a narrower crop keep the fill colour.

use crate::config::{Fill, Region};
use crate::error::PdfStackError;
use image::{imageops, RgbImage};
use tracing::debug;

/// Check every region against a `width` × `height` page.
///
/// Fails on the first region that is empty, inverted or past the page edge.
pub fn validate_regions(regions: &[Region], width: u32, height: u32) -> Result<(), PdfStackError> {
    if regions.is_empty() {
        return Err(PdfStackError::EmptyRegions);
    }
    for (index, region) in regions.iter().enumerate() {
        if !region.is_well_ordered() {
            return Err(PdfStackError::MalformedRegion {
                index,
                region: *region,
            });
        }
        if !region.fits_within(width, height) {
            return Err(PdfStackError::RegionOutOfBounds {
                index,
                region: *region,
                width,
                height,
            });
        }
    }
    Ok(())
}

/// Largest combined image, in RGB8 bytes, that [`compose`] will allocate.
pub const MAX_CANVAS_BYTES: u64 = 2 << 30;

/// Width and height of the canvas for `regions`: widest crop by summed heights.
///
/// Fails with [`PdfStackError::CanvasTooLarge`] when the height does not fit
/// in `u32` or the RGB8 buffer would exceed [`MAX_CANVAS_BYTES`].
pub fn canvas_size(regions: &[Region]) -> Result<(u32, u32), PdfStackError> {
    let width = regions.iter().map(Region::width).max().unwrap_or(0);
    let height: u64 = regions.iter().map(|r| u64::from(r.height())).sum();

    let too_large = || PdfStackError::CanvasTooLarge { width, height };
    let bytes = u64::from(width)
        .checked_mul(height)
        .and_then(|px| px.checked_mul(3))
        .ok_or_else(too_large)?;
    if bytes > MAX_CANVAS_BYTES {
        return Err(too_large());
    }
    let height = u32::try_from(height).map_err(|_| too_large())?;
    Ok((width, height))
}

/// Crop each region out of `page` and stack the crops vertically.
pub fn compose(page: &RgbImage, regions: &[Region], fill: Fill) -> Result<RgbImage, PdfStackError> {
    validate_regions(regions, page.width(), page.height())?;
    let (total_width, total_height) = canvas_size(regions)?;

    let mut canvas = RgbImage::from_pixel(total_width, total_height, fill.to_rgb());
    let mut y_offset: i64 = 0;
    for region in regions {
        let crop = imageops::crop_imm(page, region.x1, region.y1, region.width(), region.height())
            .to_image();
        imageops::replace(&mut canvas, &crop, 0, y_offset);
        y_offset += i64::from(crop.height());
    }

    debug!(
        "Stacked {} region(s) → {}x{} px",
        regions.len(),
        total_width,
        total_height
    );
    Ok(canvas)
}
