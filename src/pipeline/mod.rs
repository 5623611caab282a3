//! Pipeline stages for PDF-to-spreadsheet conversion.
//!
//! Each submodule implements exactly one step, so each is testable on its
//! own and the extraction engine can be swapped without touching the rest.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ extract ──▶ postprocess ──▶ table::concat ──▶ write
//! (scan)    (pdfium)    (cell cleanup)   (stack tables)    (csv/xlsx)
//! ```
//!
//! 1. [`input`]      : list `*.pdf` in a directory, validate a single path,
//!    derive output paths
//! 2. [`extract`]    : the [`extract::TableExtractor`] seam and its pdfium
//!    implementation; blocking, so callers use `spawn_blocking`
//! 3. [`postprocess`]: deterministic cell and header cleanup
//! 4. [`write`]      : atomic CSV/XLSX output

pub mod extract;
pub mod input;
pub mod postprocess;
pub mod write;
