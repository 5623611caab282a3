//! Batch and single-file conversion entry points.
//!
//! Files are converted strictly one after another: extraction and writing
//! of one PDF complete before the next starts. The extraction engine and
//! the spreadsheet encoders are blocking, so each call runs inside
//! `spawn_blocking` and is awaited immediately.
//!
//! Failure policy is explicit: directory-level problems return `Err` and
//! end the run, while per-file problems become a [`FileOutcome`] and the
//! loop moves on to the next PDF.

use crate::config::{BatchConfig, OutputFormat};
use crate::error::{FileError, Pdf2SheetError};
use crate::output::{BatchReport, BatchStats, FileConversion, FileOutcome, FileStatus};
use crate::pipeline::extract::{ExtractionMode, TableExtractor};
use crate::pipeline::{input, postprocess, write};
use crate::table::{self, CombinedTable, Table};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Convert every PDF in `config.input_dir`.
///
/// # Returns
/// `Ok(BatchReport)` once every PDF has been attempted, even if some were
/// skipped or failed (check `report.stats`).
///
/// # Errors
/// Returns `Err(Pdf2SheetError)` only for directory-level failures:
/// - the output directory cannot be created
/// - the input directory cannot be listed
pub async fn convert_dir(config: &BatchConfig) -> Result<BatchReport, Pdf2SheetError> {
    let total_start = Instant::now();
    info!(
        "Starting batch: {} → {} ({})",
        config.input_dir.display(),
        config.output_dir.display(),
        config.format
    );

    // ── Step 1: Ensure output directory ──────────────────────────────────
    tokio::fs::create_dir_all(&config.output_dir)
        .await
        .map_err(|e| Pdf2SheetError::OutputDirCreateFailed {
            path: config.output_dir.clone(),
            source: e,
        })?;

    // ── Step 2: Scan input directory ─────────────────────────────────────
    let scan = input::scan_pdf_dir(&config.input_dir)?;
    let mut report = BatchReport {
        files: Vec::with_capacity(scan.pdfs.len()),
        stats: BatchStats {
            pdf_files: scan.pdfs.len(),
            ignored_entries: scan.ignored,
            ..BatchStats::default()
        },
    };

    if scan.pdfs.is_empty() {
        info!("No PDF files found for processing.");
        report.stats.total_duration_ms = total_start.elapsed().as_millis() as u64;
        return Ok(report);
    }
    debug!(
        "Found {} PDF files ({} other entries ignored)",
        scan.pdfs.len(),
        scan.ignored
    );

    // ── Step 3: Convert each file ────────────────────────────────────────
    let extractor = config.table_extractor();
    let total = scan.pdfs.len();
    // Output names claimed by converted files, compared case-insensitively
    let mut written: HashMap<String, PathBuf> = HashMap::new();
    if let Some(ref cb) = config.progress_callback {
        cb.on_batch_start(total);
    }

    for (i, pdf_path) in scan.pdfs.into_iter().enumerate() {
        let index = i + 1;
        if let Some(ref cb) = config.progress_callback {
            cb.on_file_start(index, total, &pdf_path);
        }

        let file_start = Instant::now();
        let output_path = input::output_path_in(&config.output_dir, &pdf_path, config.format);
        let output_key = output_path.to_string_lossy().to_lowercase();
        let result = match written.get(&output_key) {
            Some(first) => Err(Pdf2SheetError::OutputCollision {
                path: pdf_path.clone(),
                output: output_path,
                first: first.clone(),
            }),
            None => convert_one(&pdf_path, config, &extractor).await,
        };
        if result.is_ok() {
            written.insert(output_key, pdf_path.clone());
        }
        let duration_ms = file_start.elapsed().as_millis() as u64;

        let outcome = match result {
            Ok(conversion) => {
                if let Some(ref cb) = config.progress_callback {
                    cb.on_file_complete(index, total, &pdf_path, conversion.rows);
                }
                FileOutcome::converted(conversion, duration_ms)
            }
            Err(e) => {
                let file_error = FileError::from_error(pdf_path.clone(), &e);
                if file_error.is_skip() {
                    if let Some(ref cb) = config.progress_callback {
                        cb.on_file_skipped(index, total, &pdf_path, &file_error.to_string());
                    }
                } else {
                    error!("Failed to convert {}: {}", pdf_path.display(), e);
                    if let Some(ref cb) = config.progress_callback {
                        cb.on_file_error(index, total, &pdf_path, &e.to_string());
                    }
                }
                FileOutcome::not_converted(pdf_path, file_error, duration_ms)
            }
        };
        report.files.push(outcome);
    }

    // ── Step 4: Stats ────────────────────────────────────────────────────
    let stats = &mut report.stats;
    stats.converted = report.files.iter().filter(|f| f.status == FileStatus::Converted).count();
    stats.skipped = report.files.iter().filter(|f| f.status == FileStatus::Skipped).count();
    stats.failed = report.files.iter().filter(|f| f.status == FileStatus::Failed).count();
    stats.total_rows = report.files.iter().map(|f| f.rows).sum();
    stats.total_duration_ms = total_start.elapsed().as_millis() as u64;

    info!(
        "Batch complete: {}/{} converted, {} skipped, {} failed, {}ms",
        stats.converted, total, stats.skipped, stats.failed, stats.total_duration_ms
    );
    if let Some(ref cb) = config.progress_callback {
        cb.on_batch_complete(total, stats.converted);
    }

    Ok(report)
}

/// Synchronous wrapper around [`convert_dir`].
///
/// Creates a temporary tokio runtime internally.
pub fn convert_dir_sync(config: &BatchConfig) -> Result<BatchReport, Pdf2SheetError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| Pdf2SheetError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(convert_dir(config))
}

/// Convert a single PDF into `config.output_dir` using the batch rules.
///
/// # Errors
/// - [`Pdf2SheetError::NoTablesFound`] when nothing was detected (no file written)
/// - [`Pdf2SheetError::OutputExists`] when overwriting is disabled
/// - any input, extraction or write error
pub async fn convert_file(
    pdf_path: impl AsRef<Path>,
    config: &BatchConfig,
) -> Result<FileConversion, Pdf2SheetError> {
    let extractor = config.table_extractor();
    convert_one(pdf_path.as_ref(), config, &extractor).await
}

/// Detect tables without writing anything.
pub async fn inspect(
    pdf_path: impl AsRef<Path>,
    extractor: Arc<dyn TableExtractor>,
) -> Result<Vec<Table>, Pdf2SheetError> {
    extract_tables(pdf_path.as_ref(), extractor, ExtractionMode::AllTables).await
}

// ── Internal helpers ─────────────────────────────────────────────────────

async fn convert_one(
    pdf_path: &Path,
    config: &BatchConfig,
    extractor: &Arc<dyn TableExtractor>,
) -> Result<FileConversion, Pdf2SheetError> {
    let output_path = input::output_path_in(&config.output_dir, pdf_path, config.format);
    if !config.overwrite && output_path.exists() {
        info!("Skipping {}: {} already exists", pdf_path.display(), output_path.display());
        return Err(Pdf2SheetError::OutputExists { path: output_path });
    }

    let tables = extract_tables(pdf_path, Arc::clone(extractor), ExtractionMode::AllTables).await?;
    if tables.is_empty() {
        warn!("No tables found in {}. Skipping...", pdf_path.display());
        return Err(Pdf2SheetError::NoTablesFound {
            path: pdf_path.to_path_buf(),
        });
    }

    let combined = table::concat(&tables);
    if combined.has_mismatched_columns() {
        warn!(
            "{}: {} of {} tables have columns differing from the first table; columns were aligned by name",
            pdf_path.display(),
            combined.mismatched_tables.len(),
            combined.source_tables
        );
    }

    let conversion = FileConversion {
        pdf_path: pdf_path.to_path_buf(),
        output_path: output_path.clone(),
        tables: combined.source_tables,
        rows: combined.row_count(),
        mismatched_tables: combined.mismatched_tables.clone(),
    };
    write_output(combined, config.format, output_path).await?;

    info!(
        "Successfully converted {} to {}",
        pdf_path.display(),
        conversion.output_path.display()
    );
    Ok(conversion)
}

/// Validate the path, run the engine off the async workers, and clean the
/// result. Tables left without data rows after cleanup are dropped.
pub(crate) async fn extract_tables(
    pdf_path: &Path,
    extractor: Arc<dyn TableExtractor>,
    mode: ExtractionMode,
) -> Result<Vec<Table>, Pdf2SheetError> {
    let path = input::resolve_local(pdf_path)?;

    let raw = tokio::task::spawn_blocking(move || extractor.extract(&path, mode))
        .await
        .map_err(|e| Pdf2SheetError::Internal(format!("Extraction task panicked: {}", e)))??;

    let extracted = raw.len();
    let tables: Vec<Table> = raw
        .into_iter()
        .map(postprocess::clean_table)
        .filter(|t| !t.is_empty())
        .collect();
    debug!(
        "{}: {} tables extracted, {} kept after cleanup",
        pdf_path.display(),
        extracted,
        tables.len()
    );
    Ok(tables)
}

pub(crate) async fn write_output(
    combined: CombinedTable,
    format: OutputFormat,
    output_path: PathBuf,
) -> Result<(), Pdf2SheetError> {
    tokio::task::spawn_blocking(move || write::write_table(&combined, format, &output_path))
        .await
        .map_err(|e| Pdf2SheetError::Internal(format!("Write task panicked: {}", e)))?
}
