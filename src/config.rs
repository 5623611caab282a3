//! Configuration types for PDF-to-spreadsheet conversion.
//!
//! Batch behaviour is controlled through [`BatchConfig`], built via its
//! [`BatchConfigBuilder`] and validated once in [`BatchConfigBuilder::build`].
//! Entry points receive the config explicitly; nothing is read from ambient
//! module state.

use crate::error::Pdf2SheetError;
use crate::pipeline::extract::{PdfiumTableExtractor, TableExtractor};
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

/// Default log file for batch runs, relative to the working directory.
pub const DEFAULT_LOG_FILE: &str = "pdf_conversion.log";

/// Configuration for a batch (directory) conversion.
///
/// # Example
/// ```rust,no_run
/// use pdf2sheet::{BatchConfig, OutputFormat};
///
/// let config = BatchConfig::builder()
///     .input_dir("invoices/")
///     .output_dir("sheets/")
///     .format(OutputFormat::Csv)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct BatchConfig {
    /// Directory scanned for `*.pdf` files (case-insensitive, non-recursive).
    pub input_dir: PathBuf,

    /// Directory receiving `<basename>.<format>` files. Created if absent.
    pub output_dir: PathBuf,

    /// Output spreadsheet format. Default: [`OutputFormat::Xlsx`].
    pub format: OutputFormat,

    /// Append-only log file. `None` disables file logging. Default:
    /// [`DEFAULT_LOG_FILE`].
    ///
    /// The library only logs through `tracing`; the binary installs the file
    /// layer from this value.
    pub log_file: Option<PathBuf>,

    /// Replace output files that already exist. Default: true.
    pub overwrite: bool,

    /// Extraction engine tuning, page selection and password.
    pub extraction: ExtractionOptions,

    /// Pre-constructed extraction engine. Takes precedence over the default
    /// pdfium engine built from `extraction`.
    pub extractor: Option<Arc<dyn TableExtractor>>,

    /// Optional per-file progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl fmt::Debug for BatchConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchConfig")
            .field("input_dir", &self.input_dir)
            .field("output_dir", &self.output_dir)
            .field("format", &self.format)
            .field("log_file", &self.log_file)
            .field("overwrite", &self.overwrite)
            .field("extraction", &self.extraction)
            .field("extractor", &self.extractor.as_ref().map(|_| "<dyn TableExtractor>"))
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn ConversionProgressCallback>"),
            )
            .finish()
    }
}

impl BatchConfig {
    /// Create a new builder for `BatchConfig`.
    pub fn builder() -> BatchConfigBuilder {
        BatchConfigBuilder {
            input_dir: None,
            output_dir: None,
            format: OutputFormat::default(),
            log_file: Some(PathBuf::from(DEFAULT_LOG_FILE)),
            overwrite: true,
            extraction: ExtractionOptions::default(),
            extractor: None,
            progress_callback: None,
        }
    }

    /// The engine used for this run: the injected one, or pdfium.
    pub fn table_extractor(&self) -> Arc<dyn TableExtractor> {
        match self.extractor {
            Some(ref extractor) => Arc::clone(extractor),
            None => Arc::new(PdfiumTableExtractor::new(self.extraction.clone())),
        }
    }
}

/// Builder for [`BatchConfig`].
pub struct BatchConfigBuilder {
    input_dir: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    format: OutputFormat,
    log_file: Option<PathBuf>,
    overwrite: bool,
    extraction: ExtractionOptions,
    extractor: Option<Arc<dyn TableExtractor>>,
    progress_callback: Option<ProgressCallback>,
}

impl BatchConfigBuilder {
    pub fn input_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.input_dir = Some(dir.into());
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    pub fn format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    pub fn log_file(mut self, path: Option<PathBuf>) -> Self {
        self.log_file = path;
        self
    }

    pub fn overwrite(mut self, v: bool) -> Self {
        self.overwrite = v;
        self
    }

    pub fn pages(mut self, selection: PageSelection) -> Self {
        self.extraction.pages = selection;
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.extraction.password = Some(pwd.into());
        self
    }

    pub fn extraction(mut self, options: ExtractionOptions) -> Self {
        self.extraction = options;
        self
    }

    pub fn extractor(mut self, extractor: Arc<dyn TableExtractor>) -> Self {
        self.extractor = Some(extractor);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    ///
    /// The input directory must exist and be a directory; the output
    /// directory may be missing (it is created on the first run) but must
    /// differ from the input directory.
    pub fn build(self) -> Result<BatchConfig, Pdf2SheetError> {
        let input_dir = match self.input_dir {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => return Err(Pdf2SheetError::InvalidConfig("input_dir is required".into())),
        };
        let output_dir = match self.output_dir {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => return Err(Pdf2SheetError::InvalidConfig("output_dir is required".into())),
        };
        if !input_dir.is_dir() {
            return Err(Pdf2SheetError::InvalidConfig(format!(
                "input_dir '{}' is not a directory",
                input_dir.display()
            )));
        }
        if input_dir == output_dir {
            return Err(Pdf2SheetError::InvalidConfig(
                "output_dir must differ from input_dir".into(),
            ));
        }
        self.extraction.validate()?;

        Ok(BatchConfig {
            input_dir,
            output_dir,
            format: self.format,
            log_file: self.log_file,
            overwrite: self.overwrite,
            extraction: self.extraction,
            extractor: self.extractor,
            progress_callback: self.progress_callback,
        })
    }
}

// ── Extraction options ───────────────────────────────────────────────────

/// Tuning for the pdfium table engine. Distances are in PDF points.
#[derive(Clone, Serialize, Deserialize)]
pub struct ExtractionOptions {
    /// Fragments whose tops differ by at most this much share a row. Default: 3.0.
    pub row_tolerance: f32,

    /// Fragments whose left edges differ by at most this much share a column. Default: 6.0.
    pub column_tolerance: f32,

    /// A horizontal gap wider than `word_gap_factor × glyph height` starts a
    /// new fragment (cell). Default: 0.8.
    pub word_gap_factor: f32,

    /// Minimum consecutive aligned rows (header included) for a table. Default: 2.
    pub min_rows: usize,

    /// Minimum fragments per row for it to count as a table row. Default: 2.
    pub min_cols: usize,

    /// Page selection. Default: all pages.
    pub pages: PageSelection,

    /// PDF user password for encrypted documents.
    #[serde(skip_serializing)]
    pub password: Option<String>,
}

impl Default for ExtractionOptions {
    fn default() -> Self {
        Self {
            row_tolerance: 3.0,
            column_tolerance: 6.0,
            word_gap_factor: 0.8,
            min_rows: 2,
            min_cols: 2,
            pages: PageSelection::default(),
            password: None,
        }
    }
}

impl fmt::Debug for ExtractionOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractionOptions")
            .field("row_tolerance", &self.row_tolerance)
            .field("column_tolerance", &self.column_tolerance)
            .field("word_gap_factor", &self.word_gap_factor)
            .field("min_rows", &self.min_rows)
            .field("min_cols", &self.min_cols)
            .field("pages", &self.pages)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl ExtractionOptions {
    pub fn validate(&self) -> Result<(), Pdf2SheetError> {
        if !(self.row_tolerance > 0.0) || !(self.column_tolerance > 0.0) {
            return Err(Pdf2SheetError::InvalidConfig(
                "row and column tolerances must be positive".into(),
            ));
        }
        if !(self.word_gap_factor > 0.0) {
            return Err(Pdf2SheetError::InvalidConfig(
                "word_gap_factor must be positive".into(),
            ));
        }
        if self.min_rows < 2 {
            return Err(Pdf2SheetError::InvalidConfig(format!(
                "min_rows must be ≥ 2 (a header plus one data row), got {}",
                self.min_rows
            )));
        }
        if self.min_cols < 1 {
            return Err(Pdf2SheetError::InvalidConfig("min_cols must be ≥ 1".into()));
        }
        Ok(())
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Spreadsheet format written for each converted document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Office Open XML workbook, one sheet, no index column. (default)
    #[default]
    Xlsx,
    /// Comma-separated values with a header row, no index column.
    Csv,
}

impl OutputFormat {
    /// File extension without the leading dot.
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Xlsx => "xlsx",
            OutputFormat::Csv => "csv",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for OutputFormat {
    type Err = Pdf2SheetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "xlsx" => Ok(OutputFormat::Xlsx),
            "csv" => Ok(OutputFormat::Csv),
            _ => Err(Pdf2SheetError::UnsupportedFormat {
                format: s.to_string(),
            }),
        }
    }
}

/// Specifies which pages of the PDF to scan for tables.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageSelection {
    /// Scan all pages (default).
    #[default]
    All,
    /// A single page (1-indexed).
    Single(usize),
    /// A contiguous range of pages (1-indexed, inclusive).
    Range(usize, usize),
    /// Specific pages (1-indexed, deduplicated).
    Set(Vec<usize>),
}

impl PageSelection {
    /// Expand the selection into a sorted, deduplicated list of 0-indexed page numbers.
    pub fn to_indices(&self, total_pages: usize) -> Vec<usize> {
        let mut indices: Vec<usize> = match self {
            PageSelection::All => (0..total_pages).collect(),
            PageSelection::Single(p) => {
                if *p >= 1 && *p <= total_pages {
                    vec![p - 1]
                } else {
                    vec![]
                }
            }
            PageSelection::Range(start, end) => {
                let s = (*start).max(1) - 1;
                let e = (*end).min(total_pages);
                (s..e).collect()
            }
            PageSelection::Set(pages) => pages
                .iter()
                .filter(|&&p| p >= 1 && p <= total_pages)
                .map(|p| p - 1)
                .collect(),
        };
        indices.sort_unstable();
        indices.dedup();
        indices
    }
}
