//! # pdfstack
//!
//! Crop fixed regions out of the first page of every PDF in a folder and
//! stack them into one PNG per file.
//!
//! Typical use: a folder of same-layout forms or invoices where only a
//! header block and a totals block matter. Give the pixel rectangles once;
//! every PDF gets a `<name>_combined.png` containing just those areas, top
//! to bottom.
//!
//! ## Pipeline Overview
//!
//! ```text
//! input dir
//!  │
//!  ├─ 1. Input    list *.pdf (lowercase, sorted by name)
//!  ├─ 2. Render   rasterise page 1 via pdfium at 72 DPI (1 px per point)
//!  ├─ 3. Compose  crop each region, stack left-aligned top to bottom
//!  └─ 4. Write    <stem>_combined.png in the output dir (atomic rename)
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdfstack::{run, BatchConfig, Region};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = BatchConfig::builder("files", "output")
//!         .region(Region::new(90, 10, 680, 200))
//!         .region(Region::new(90, 700, 680, 800))
//!         .build()?;
//!     let report = run(&config)?;
//!     eprintln!("{} file(s) combined", report.stats.succeeded);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature        | Default | Description |
//! |----------------|---------|-------------|
//! | `cli`          | on      | Enables the `pdfstack` binary (clap + anyhow + tracing-subscriber + indicatif) |
//! | `fetch-engine` | on      | Downloads pdfium on first use when no local copy is found |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod batch;
pub mod config;
pub mod engine;
pub mod error;
pub mod pipeline;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use batch::{
    inspect, inspect_with, process_file, run, run_batch, BatchReport, BatchStats, FileOutcome,
    InspectRow,
};
pub use config::{BatchConfig, BatchConfigBuilder, FailurePolicy, Fill, Region};
pub use error::{ErrorKind, FileError, PdfStackError};
pub use pipeline::compose::compose;
pub use pipeline::render::{PageInfo, PageRenderer, PdfiumRenderer};
pub use progress::{BatchProgressCallback, NoopProgressCallback, ProgressCallback};
