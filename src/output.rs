//! Result types returned by the conversion entry points.

use crate::error::FileError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// What happened to one PDF of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    /// An output file was written.
    Converted,
    /// Nothing to write (no tables, or output kept because overwrite is off).
    Skipped,
    /// Extraction or writing failed.
    Failed,
}

/// A successful single-document conversion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileConversion {
    pub pdf_path: PathBuf,
    pub output_path: PathBuf,
    /// Tables concatenated into the output.
    pub tables: usize,
    /// Data rows written (header excluded).
    pub rows: usize,
    /// Positions of tables whose columns differed from the first table's.
    pub mismatched_tables: Vec<usize>,
}

/// Per-file entry of a [`BatchReport`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileOutcome {
    pub pdf_path: PathBuf,
    pub status: FileStatus,
    /// Set when `status` is `Converted`.
    pub output_path: Option<PathBuf>,
    pub tables: usize,
    pub rows: usize,
    /// Set when `status` is `Skipped` or `Failed`.
    pub error: Option<FileError>,
    pub duration_ms: u64,
}

impl FileOutcome {
    pub(crate) fn converted(conversion: FileConversion, duration_ms: u64) -> Self {
        Self {
            pdf_path: conversion.pdf_path,
            status: FileStatus::Converted,
            output_path: Some(conversion.output_path),
            tables: conversion.tables,
            rows: conversion.rows,
            error: None,
            duration_ms,
        }
    }

    pub(crate) fn not_converted(pdf_path: PathBuf, error: FileError, duration_ms: u64) -> Self {
        let status = if error.is_skip() {
            FileStatus::Skipped
        } else {
            FileStatus::Failed
        };
        Self {
            pdf_path,
            status,
            output_path: None,
            tables: 0,
            rows: 0,
            error: Some(error),
            duration_ms,
        }
    }
}

/// Aggregate numbers for a batch run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchStats {
    /// PDF entries found in the input directory.
    pub pdf_files: usize,
    /// Directory entries that were not PDFs.
    pub ignored_entries: usize,
    pub converted: usize,
    pub skipped: usize,
    pub failed: usize,
    /// Data rows written across all outputs.
    pub total_rows: usize,
    pub total_duration_ms: u64,
}

/// Everything a batch run produced.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchReport {
    pub files: Vec<FileOutcome>,
    pub stats: BatchStats,
}

impl BatchReport {
    /// Outcomes with the given status, in processing order.
    pub fn with_status(&self, status: FileStatus) -> impl Iterator<Item = &FileOutcome> {
        self.files.iter().filter(move |f| f.status == status)
    }
}
