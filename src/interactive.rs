//! Interactive single-file conversion.
//!
//! An [`InteractiveSession`] holds the user's choices (a PDF and a target
//! format) and converts on request. All user-facing feedback goes through
//! the [`Dialogs`] trait, so the same session drives a terminal prompt, a
//! native dialog toolkit, or a scripted test double.
//!
//! ```text
//! NoFile ──select──▶ FileSelected ──convert──▶ Converted(path)
//!    ▲                    │  ▲                       │
//!    └── (re-select) ─────┴──┴───────────────────────┘
//! ```
//!
//! Unlike the batch converter, only the first (top-most) table of each page
//! is taken, and the output is written next to the source PDF.

use crate::config::{ExtractionOptions, OutputFormat};
use crate::convert::{extract_tables, write_output};
use crate::error::Pdf2SheetError;
use crate::output::FileConversion;
use crate::pipeline::extract::{ExtractionMode, PdfiumTableExtractor, TableExtractor};
use crate::pipeline::input;
use crate::table;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};

/// User-facing feedback and file picking.
pub trait Dialogs {
    /// Ask the user for a PDF file. `None` means the user cancelled.
    fn pick_pdf(&self) -> Option<PathBuf>;

    fn info(&self, title: &str, message: &str);

    fn warning(&self, title: &str, message: &str);

    fn error(&self, title: &str, message: &str);
}

/// Where the session stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    NoFile,
    FileSelected(PathBuf),
    /// Last conversion succeeded; holds the source and the written output.
    Converted { source: PathBuf, output: PathBuf },
}

/// One user's interactive conversion session.
pub struct InteractiveSession {
    state: SessionState,
    format: OutputFormat,
    extractor: Arc<dyn TableExtractor>,
}

impl InteractiveSession {
    /// A session backed by the pdfium engine.
    pub fn new(options: ExtractionOptions) -> Self {
        Self::with_extractor(Arc::new(PdfiumTableExtractor::new(options)))
    }

    pub fn with_extractor(extractor: Arc<dyn TableExtractor>) -> Self {
        Self {
            state: SessionState::NoFile,
            format: OutputFormat::default(),
            extractor,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    pub fn set_format(&mut self, format: OutputFormat) {
        self.format = format;
    }

    /// The file a conversion would read, if any.
    pub fn selected_file(&self) -> Option<&Path> {
        match &self.state {
            SessionState::NoFile => None,
            SessionState::FileSelected(p) => Some(p),
            SessionState::Converted { source, .. } => Some(source),
        }
    }

    /// Store a chosen path. Allowed in any state.
    pub fn select_file(&mut self, path: impl Into<PathBuf>) {
        let path = path.into();
        info!("Selected {}", path.display());
        self.state = SessionState::FileSelected(path);
    }

    /// Open the picker; a cancelled pick leaves the state unchanged.
    pub fn choose_file(&mut self, dialogs: &dyn Dialogs) -> Option<&Path> {
        if let Some(path) = dialogs.pick_pdf() {
            self.select_file(path);
        }
        self.selected_file()
    }

    /// Convert the selected file, reporting every outcome through `dialogs`.
    pub async fn convert(&mut self, dialogs: &dyn Dialogs) -> Result<FileConversion, Pdf2SheetError> {
        let Some(source) = self.selected_file().map(Path::to_path_buf) else {
            dialogs.warning("No file", "Please select a PDF file first.");
            return Err(Pdf2SheetError::NoFileSelected);
        };

        match self.run(&source, dialogs).await {
            Ok(conversion) => {
                dialogs.info(
                    "Success",
                    &format!("File converted successfully:\n{}", conversion.output_path.display()),
                );
                self.state = SessionState::Converted {
                    source,
                    output: conversion.output_path.clone(),
                };
                Ok(conversion)
            }
            Err(e @ Pdf2SheetError::NoTablesFound { .. }) => {
                dialogs.warning("No tables", "No tables found in the selected PDF.");
                Err(e)
            }
            Err(e) => {
                error!("Conversion of {} failed: {}", source.display(), e);
                dialogs.error("Error", &format!("Conversion failed:\n{e}"));
                Err(e)
            }
        }
    }

    async fn run(
        &self,
        source: &Path,
        dialogs: &dyn Dialogs,
    ) -> Result<FileConversion, Pdf2SheetError> {
        let output_path = input::sibling_output_path(source, self.format);
        let same_extension = source
            .extension()
            .map(|e| e.eq_ignore_ascii_case(self.format.extension()))
            .unwrap_or(false);
        if output_path == source || same_extension {
            return Err(Pdf2SheetError::OutputIsSource {
                path: source.to_path_buf(),
            });
        }

        let tables = extract_tables(
            source,
            Arc::clone(&self.extractor),
            ExtractionMode::FirstTablePerPage,
        )
        .await?;
        if tables.is_empty() {
            warn!("No tables found in {}", source.display());
            return Err(Pdf2SheetError::NoTablesFound {
                path: source.to_path_buf(),
            });
        }

        let combined = table::concat(&tables);
        if combined.has_mismatched_columns() {
            let message = format!(
                "{} of {} tables had columns differing from the first table; \
                 columns were aligned by name and missing cells left empty.",
                combined.mismatched_tables.len(),
                combined.source_tables
            );
            warn!("{}: {}", source.display(), message);
            dialogs.info("Columns aligned", &message);
        }

        let conversion = FileConversion {
            pdf_path: source.to_path_buf(),
            output_path: output_path.clone(),
            tables: combined.source_tables,
            rows: combined.row_count(),
            mismatched_tables: combined.mismatched_tables.clone(),
        };
        write_output(combined, self.format, output_path).await?;

        info!(
            "Converted {} to {}",
            source.display(),
            conversion.output_path.display()
        );
        Ok(conversion)
    }
}
