//! # pdf2sheet
//!
//! Convert the tables inside PDF documents into XLSX or CSV spreadsheets.
//!
//! Two front doors share one pipeline:
//!
//! * **Batch**: [`convert_dir`] scans a directory for `*.pdf`, extracts every
//!   table on every page of each file, stacks them, and writes one
//!   spreadsheet per PDF into an output directory. A failing file is
//!   recorded and skipped; the batch carries on.
//! * **Interactive**: [`InteractiveSession`] converts one user-chosen PDF,
//!   taking the first table of each page, and writes the spreadsheet next to
//!   the source. Feedback goes through the [`Dialogs`] trait.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input    validate %PDF magic, derive output path
//!  ├─ 2. Extract  pdfium text layout → rows → aligned columns (spawn_blocking)
//!  ├─ 3. Clean    invisible chars, whitespace, blank rows, header names
//!  ├─ 4. Concat   stack tables, align columns by header name
//!  └─ 5. Write    CSV or XLSX, no index column, atomic rename
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf2sheet::{convert_dir, BatchConfig, OutputFormat};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = BatchConfig::builder()
//!         .input_dir("statements/")
//!         .output_dir("sheets/")
//!         .format(OutputFormat::Csv)
//!         .build()?;
//!     let report = convert_dir(&config).await?;
//!     eprintln!("{} of {} converted", report.stats.converted, report.stats.pdf_files);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf2sheet` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! ## PDFium
//!
//! The default engine needs a pdfium shared library at run time. It is
//! looked up via `PDFIUM_LIB_PATH`, then next to the executable, then on the
//! system library path. Library users can bypass it entirely by supplying
//! their own [`TableExtractor`].

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod interactive;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod table;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{BatchConfig, BatchConfigBuilder, ExtractionOptions, OutputFormat, PageSelection};
pub use convert::{convert_dir, convert_dir_sync, convert_file, inspect};
pub use error::{FileError, Pdf2SheetError};
pub use interactive::{Dialogs, InteractiveSession, SessionState};
pub use output::{BatchReport, BatchStats, FileConversion, FileOutcome, FileStatus};
pub use pipeline::extract::{ExtractionMode, PdfiumTableExtractor, TableExtractor};
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback};
pub use table::{CombinedTable, Table};
