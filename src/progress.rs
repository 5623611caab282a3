//! Progress-callback trait for per-file batch events.
//!
//! Inject an [`Arc<dyn ConversionProgressCallback>`] via
//! [`crate::config::BatchConfigBuilder::progress_callback`] to receive events
//! as the batch processes each PDF. The CLI forwards them to a terminal
//! progress bar; library users can forward them anywhere.
//!
//! # Example
//!
//! ```rust
//! use pdf2sheet::ConversionProgressCallback;
//! use std::path::Path;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! struct CountingCallback {
//!     rows: AtomicUsize,
//! }
//!
//! impl ConversionProgressCallback for CountingCallback {
//!     fn on_file_complete(&self, _index: usize, _total: usize, _path: &Path, rows: usize) {
//!         self.rows.fetch_add(rows, Ordering::SeqCst);
//!     }
//! }
//! ```

use std::path::Path;
use std::sync::Arc;

/// Called by the batch converter as it processes each file.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. `index` is 1-based.
pub trait ConversionProgressCallback: Send + Sync {
    /// Called once after the directory scan, before any file is converted.
    fn on_batch_start(&self, total_files: usize) {
        let _ = total_files;
    }

    /// Called just before extraction starts for a file.
    fn on_file_start(&self, index: usize, total_files: usize, path: &Path) {
        let _ = (index, total_files, path);
    }

    /// Called when an output file was written.
    ///
    /// * `rows`: data rows written (header excluded)
    fn on_file_complete(&self, index: usize, total_files: usize, path: &Path, rows: usize) {
        let _ = (index, total_files, path, rows);
    }

    /// Called when a file produced nothing to write (e.g. no tables).
    fn on_file_skipped(&self, index: usize, total_files: usize, path: &Path, reason: &str) {
        let _ = (index, total_files, path, reason);
    }

    /// Called when extraction or writing failed for a file.
    fn on_file_error(&self, index: usize, total_files: usize, path: &Path, error: &str) {
        let _ = (index, total_files, path, error);
    }

    /// Called once after every file has been attempted.
    fn on_batch_complete(&self, total_files: usize, converted: usize) {
        let _ = (total_files, converted);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ConversionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::BatchConfig`].
pub type ProgressCallback = Arc<dyn ConversionProgressCallback>;
