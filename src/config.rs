//! Configuration types for a crop-and-stack batch.
//!
//! Everything a run needs lives in [`BatchConfig`], built through
//! [`BatchConfigBuilder`]. The regions are read-only for the whole run and
//! are shared by every file in the input directory.

use crate::error::PdfStackError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Resolution pdfium treats as one pixel per PDF point.
pub const NATIVE_DPI: u32 = 72;

/// Configuration for a crop-and-stack batch.
///
/// # Example
/// ```rust
/// use pdfstack::{BatchConfig, Region};
///
/// let config = BatchConfig::builder("files", "output")
///     .region(Region::new(90, 10, 680, 200))
///     .region(Region::new(90, 700, 680, 800))
///     .build()
///     .unwrap();
/// assert_eq!(config.regions.len(), 2);
/// ```
#[derive(Clone)]
pub struct BatchConfig {
    /// Directory scanned for `*.pdf` files (non-recursive).
    pub input_dir: PathBuf,

    /// Directory receiving `<name>_combined.png`. Created if missing.
    pub output_dir: PathBuf,

    /// Ordered, non-empty list of regions to crop from each first page.
    pub regions: Vec<Region>,

    /// Rendering resolution. Default: 72, one pixel per PDF point.
    ///
    /// Region coordinates are interpreted at this resolution, so changing it
    /// means changing the coordinates too.
    pub dpi: u32,

    /// Colour of canvas pixels not covered by any crop. Default: white.
    pub fill: Fill,

    /// What to do when one file fails. Default: [`FailurePolicy::Abort`].
    pub on_error: FailurePolicy,

    /// Explicit pdfium library to bind. If None, see [`crate::engine`].
    pub pdfium_lib_path: Option<PathBuf>,

    /// Optional per-file progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl fmt::Debug for BatchConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchConfig")
            .field("input_dir", &self.input_dir)
            .field("output_dir", &self.output_dir)
            .field("regions", &self.regions)
            .field("dpi", &self.dpi)
            .field("fill", &self.fill)
            .field("on_error", &self.on_error)
            .field("pdfium_lib_path", &self.pdfium_lib_path)
            .field(
                "progress_callback",
                &self
                    .progress_callback
                    .as_ref()
                    .map(|_| "<dyn BatchProgressCallback>"),
            )
            .finish()
    }
}

impl BatchConfig {
    /// Create a new builder for the given input and output directories.
    pub fn builder(
        input_dir: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
    ) -> BatchConfigBuilder {
        BatchConfigBuilder {
            config: BatchConfig {
                input_dir: input_dir.into(),
                output_dir: output_dir.into(),
                regions: Vec::new(),
                dpi: NATIVE_DPI,
                fill: Fill::default(),
                on_error: FailurePolicy::default(),
                pdfium_lib_path: None,
                progress_callback: None,
            },
        }
    }
}

/// Builder for [`BatchConfig`].
pub struct BatchConfigBuilder {
    config: BatchConfig,
}

impl BatchConfigBuilder {
    pub fn region(mut self, region: Region) -> Self {
        self.config.regions.push(region);
        self
    }

    pub fn regions(mut self, regions: impl IntoIterator<Item = Region>) -> Self {
        self.config.regions.extend(regions);
        self
    }

    pub fn dpi(mut self, dpi: u32) -> Self {
        self.config.dpi = dpi;
        self
    }

    pub fn fill(mut self, fill: Fill) -> Self {
        self.config.fill = fill;
        self
    }

    pub fn on_error(mut self, policy: FailurePolicy) -> Self {
        self.config.on_error = policy;
        self
    }

    pub fn pdfium_lib_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pdfium_lib_path = Some(path.into());
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    ///
    /// Regions are checked for ordering here; bounds can only be checked
    /// once a page has been rendered.
    pub fn build(self) -> Result<BatchConfig, PdfStackError> {
        let c = &self.config;
        if c.regions.is_empty() {
            return Err(PdfStackError::EmptyRegions);
        }
        for (index, region) in c.regions.iter().enumerate() {
            if !region.is_well_ordered() {
                return Err(PdfStackError::MalformedRegion {
                    index,
                    region: *region,
                });
            }
        }
        if !(NATIVE_DPI..=400).contains(&c.dpi) {
            return Err(PdfStackError::InvalidConfig(format!(
                "DPI must be 72–400, got {}",
                c.dpi
            )));
        }
        Ok(self.config)
    }
}

// ── Region ───────────────────────────────────────────────────────────────

/// Axis-aligned crop rectangle `(x1, y1, x2, y2)` in page pixels.
///
/// Half-open: covers columns `x1..x2` and rows `y1..y2`, so the crop is
/// `x2 - x1` wide and `y2 - y1` tall. Parsed from `"x1,y1,x2,y2"` and
/// serialised as a four-element array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "[u32; 4]", into = "[u32; 4]")]
pub struct Region {
    pub x1: u32,
    pub y1: u32,
    pub x2: u32,
    pub y2: u32,
}

impl Region {
    pub const fn new(x1: u32, y1: u32, x2: u32, y2: u32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    pub fn width(&self) -> u32 {
        self.x2.saturating_sub(self.x1)
    }

    pub fn height(&self) -> u32 {
        self.y2.saturating_sub(self.y1)
    }

    /// `x1 < x2` and `y1 < y2`.
    pub fn is_well_ordered(&self) -> bool {
        self.x1 < self.x2 && self.y1 < self.y2
    }

    /// True when the region fits inside a `width` × `height` image.
    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        self.x2 <= width && self.y2 <= height
    }
}

impl From<[u32; 4]> for Region {
    fn from([x1, y1, x2, y2]: [u32; 4]) -> Self {
        Self::new(x1, y1, x2, y2)
    }
}

impl From<Region> for [u32; 4] {
    fn from(r: Region) -> Self {
        [r.x1, r.y1, r.x2, r.y2]
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {}, {})", self.x1, self.y1, self.x2, self.y2)
    }
}

impl FromStr for Region {
    type Err = PdfStackError;

    /// Accepts `x1,y1,x2,y2`, optionally wrapped in parentheses.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let inner = s
            .trim()
            .trim_start_matches('(')
            .trim_end_matches(')');
        let parts: Vec<&str> = inner.split(',').map(str::trim).collect();
        if parts.len() != 4 {
            return Err(PdfStackError::InvalidConfig(format!(
                "region '{s}' must have four comma-separated values: x1,y1,x2,y2"
            )));
        }

        let mut coords = [0u32; 4];
        for (slot, part) in coords.iter_mut().zip(&parts) {
            *slot = part.parse().map_err(|_| {
                PdfStackError::InvalidConfig(format!(
                    "region '{s}': '{part}' is not a non-negative integer"
                ))
            })?;
        }
        Ok(Region::from(coords))
    }
}

/// Load regions from a JSON file holding an array of `[x1, y1, x2, y2]`.
pub fn load_regions_file(path: &Path) -> Result<Vec<Region>, PdfStackError> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        PdfStackError::InvalidConfig(format!(
            "cannot read regions file '{}': {e}",
            path.display()
        ))
    })?;
    serde_json::from_str(&text).map_err(|e| {
        PdfStackError::InvalidConfig(format!(
            "regions file '{}' is not a JSON array of [x1, y1, x2, y2]: {e}",
            path.display()
        ))
    })
}

// ── Fill ─────────────────────────────────────────────────────────────────

/// Background colour of the combined canvas.
///
/// Only visible when crops have different widths: narrower crops leave a
/// margin on their right.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fill(pub [u8; 3]);

impl Fill {
    pub const WHITE: Fill = Fill([255, 255, 255]);
    pub const BLACK: Fill = Fill([0, 0, 0]);

    pub fn to_rgb(self) -> image::Rgb<u8> {
        image::Rgb(self.0)
    }
}

impl Default for Fill {
    fn default() -> Self {
        Self::WHITE
    }
}

impl FromStr for Fill {
    type Err = PdfStackError;

    /// Accepts `white`, `black` or `#RRGGBB`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        match lower.as_str() {
            "white" => return Ok(Fill::WHITE),
            "black" => return Ok(Fill::BLACK),
            _ => {}
        }

        let invalid = || {
            PdfStackError::InvalidConfig(format!(
                "fill '{s}' must be white, black or #RRGGBB"
            ))
        };
        let hex = lower.strip_prefix('#').ok_or_else(invalid)?;
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(invalid());
        }
        let mut rgb = [0u8; 3];
        for (i, channel) in rgb.iter_mut().enumerate() {
            *channel = u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16).map_err(|_| invalid())?;
        }
        Ok(Fill(rgb))
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// How the batch reacts when one file fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FailurePolicy {
    /// Stop at the first failing file and return its error. (default)
    #[default]
    Abort,
    /// Log the failure, record it in the report, and move on.
    Skip,
}
