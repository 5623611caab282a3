//! Input resolution: find PDFs in a directory, validate a single PDF path,
//! and derive output paths.
//!
//! We validate the PDF magic bytes (`%PDF`) before handing a file to the
//! extraction engine so callers get a meaningful error rather than a pdfium
//! load failure.

use crate::config::OutputFormat;
use crate::error::Pdf2SheetError;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Result of scanning an input directory.
#[derive(Debug, Default)]
pub struct DirScan {
    /// PDF files, sorted by file name.
    pub pdfs: Vec<PathBuf>,
    /// Entries that were skipped (other extensions, sub-directories).
    pub ignored: usize,
}

/// Whether a file name ends in `.pdf`, ignoring ASCII case.
pub fn is_pdf_name(name: &str) -> bool {
    name.len() >= 4
        && name.is_char_boundary(name.len() - 4)
        && name[name.len() - 4..].eq_ignore_ascii_case(".pdf")
}

/// List the PDF files directly inside `dir`.
pub fn scan_pdf_dir(dir: &Path) -> Result<DirScan, Pdf2SheetError> {
    let entries = std::fs::read_dir(dir).map_err(|e| Pdf2SheetError::DirectoryUnreadable {
        path: dir.to_path_buf(),
        source: e,
    })?;

    let mut scan = DirScan::default();
    for entry in entries {
        let entry = entry.map_err(|e| Pdf2SheetError::DirectoryUnreadable {
            path: dir.to_path_buf(),
            source: e,
        })?;
        let path = entry.path();
        let name = entry.file_name();
        let is_pdf = name.to_str().map(is_pdf_name).unwrap_or(false);
        if is_pdf && path.is_file() {
            scan.pdfs.push(path);
        } else {
            debug!("Ignoring non-PDF entry: {}", path.display());
            scan.ignored += 1;
        }
    }
    scan.pdfs.sort();
    Ok(scan)
}

/// Validate a local PDF path: existence, read permission and magic bytes.
pub fn resolve_local(path: &Path) -> Result<PathBuf, Pdf2SheetError> {
    let path = path.to_path_buf();

    if !path.exists() {
        return Err(Pdf2SheetError::FileNotFound { path });
    }

    match std::fs::File::open(&path) {
        Ok(mut f) => {
            use std::io::Read;
            let mut magic = [0u8; 4];
            if f.read_exact(&mut magic).is_ok() && &magic != b"%PDF" {
                return Err(Pdf2SheetError::NotAPdf { path, magic });
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(Pdf2SheetError::PermissionDenied { path });
        }
        Err(_) => {
            return Err(Pdf2SheetError::FileNotFound { path });
        }
    }

    debug!("Resolved local PDF: {}", path.display());
    Ok(path)
}

/// `output_dir/<basename>.<ext>` for a batch conversion.
pub fn output_path_in(output_dir: &Path, pdf_path: &Path, format: OutputFormat) -> PathBuf {
    let stem = pdf_path
        .file_stem()
        .map(|s| s.to_os_string())
        .unwrap_or_else(|| "output".into());
    let mut name = stem;
    name.push(".");
    name.push(format.extension());
    output_dir.join(name)
}

/// The source path with only its extension replaced.
pub fn sibling_output_path(pdf_path: &Path, format: OutputFormat) -> PathBuf {
    pdf_path.with_extension(format.extension())
}
