//! Pipeline stages for one PDF.
//!
//! Each submodule implements exactly one step, so each can be tested on its
//! own and the renderer can be swapped without touching the rest.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ render ──▶ compose ──▶ write
//! (*.pdf)   (pdfium)   (crop+stack) (PNG)
//! ```
//!
//! 1. [`input`]   — pick `*.pdf` files from the input directory and name outputs
//! 2. [`render`]  — rasterise page 1 to an RGB image
//! 3. [`compose`] — crop the configured regions and stack them vertically
//! 4. [`write`]   — atomically write the combined PNG

pub mod compose;
pub mod input;
pub mod render;
pub mod write;
