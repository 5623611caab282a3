//! Error types for the pdf2sheet library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`Pdf2SheetError`]: **Fatal for the current unit**: a directory cannot
//!   be read, a PDF cannot be opened, an output file cannot be written.
//!   Returned as `Err(Pdf2SheetError)` from the `convert*` functions and from
//!   [`crate::interactive::InteractiveSession::convert`].
//!
//! * [`FileError`]: **Non-fatal**: one PDF in a batch failed or was skipped
//!   but the rest of the directory is fine. Stored inside
//!   [`crate::output::FileOutcome`] so callers can inspect partial success
//!   rather than losing the whole batch to one bad file.

use std::path::PathBuf;
use thiserror::Error;

/// All typed errors returned by the pdf2sheet library.
#[derive(Debug, Error)]
pub enum Pdf2SheetError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    /// The input directory of a batch run could not be listed.
    #[error("Cannot read input directory '{path}': {source}")]
    DirectoryUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Interactive conversion was requested before a file was chosen.
    #[error("No PDF file selected")]
    NoFileSelected,

    // ── PDF errors ────────────────────────────────────────────────────────
    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{path}' is corrupt: {detail}\nTry repairing with: qpdf --decrypt input.pdf output.pdf")]
    CorruptPdf { path: PathBuf, detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF '{path}' is encrypted and requires a password.\nProvide it with --password <PASSWORD>.")]
    PasswordRequired { path: PathBuf },

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF '{path}'")]
    WrongPassword { path: PathBuf },

    /// The extraction engine failed on a specific page.
    #[error("Table extraction failed for page {page} of '{path}': {detail}")]
    ExtractionFailed {
        path: PathBuf,
        page: usize,
        detail: String,
    },

    /// The document was read but no table was detected on any page.
    #[error("No tables found in '{path}'")]
    NoTablesFound { path: PathBuf },

    // ── Output errors ─────────────────────────────────────────────────────
    /// The configured output format is not one of `xlsx` / `csv`.
    #[error("Invalid output format: '{format}' (expected 'xlsx' or 'csv')")]
    UnsupportedFormat { format: String },

    /// The output directory could not be created.
    #[error("Failed to create output directory '{path}': {source}")]
    OutputDirCreateFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The derived output path is the input file itself.
    #[error("Refusing to overwrite the source file '{path}'\nChoose a different output format or rename the file to *.pdf.")]
    OutputIsSource { path: PathBuf },

    /// An output file already exists and overwriting is disabled.
    #[error("Output file '{path}' already exists")]
    OutputExists { path: PathBuf },

    /// Another PDF of the same batch already wrote this output name.
    #[error("'{path}' maps to output '{output}', already written from '{first}' in this run")]
    OutputCollision {
        path: PathBuf,
        output: PathBuf,
        first: PathBuf,
    },

    /// Could not create or write the output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The XLSX encoder rejected the workbook.
    #[error("Failed to build spreadsheet '{path}': {detail}")]
    SpreadsheetWriteFailed { path: PathBuf, detail: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Pdfium binding errors ─────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
You can:\n\
  • Set PDFIUM_LIB_PATH=/path/to/libpdfium to use an existing copy.\n\
  • Place libpdfium next to the pdf2sheet executable.\n\
  • Install pdfium system-wide so the dynamic loader can find it.\n"
    )]
    PdfiumBindingFailed(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal outcome for a single file of a batch.
///
/// Stored alongside [`crate::output::FileOutcome`]. The batch continues
/// regardless of how many files end up here.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
pub enum FileError {
    /// No table was detected; nothing was written.
    #[error("{path}: no tables found")]
    NoTablesFound { path: PathBuf },

    /// The output already existed and overwriting was disabled.
    #[error("{path}: output '{output}' already exists")]
    OutputExists { path: PathBuf, output: PathBuf },

    /// An earlier PDF of the same run already produced this output name.
    #[error("{path}: output '{output}' was already written from '{first}'")]
    OutputCollision {
        path: PathBuf,
        output: PathBuf,
        first: PathBuf,
    },

    /// Extraction or writing failed.
    #[error("{path}: {detail}")]
    ConversionFailed { path: PathBuf, detail: String },
}

impl FileError {
    /// Classify a conversion error for the batch report.
    pub fn from_error(pdf_path: PathBuf, err: &Pdf2SheetError) -> Self {
        match err {
            Pdf2SheetError::NoTablesFound { .. } => FileError::NoTablesFound { path: pdf_path },
            Pdf2SheetError::OutputExists { path } => FileError::OutputExists {
                path: pdf_path,
                output: path.clone(),
            },
            Pdf2SheetError::OutputCollision { output, first, .. } => FileError::OutputCollision {
                path: pdf_path,
                output: output.clone(),
                first: first.clone(),
            },
            other => FileError::ConversionFailed {
                path: pdf_path,
                detail: other.to_string(),
            },
        }
    }

    /// Whether this outcome is a skip-with-notice rather than a failure.
    pub fn is_skip(&self) -> bool {
        matches!(
            self,
            FileError::NoTablesFound { .. } | FileError::OutputExists { .. }
        )
    }
}
