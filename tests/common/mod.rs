//! Shared helpers for integration tests: a scripted table extractor and
//! fixture builders. No pdfium library is needed.

#![allow(dead_code)]

use pdf2sheet::{ExtractionMode, Pdf2SheetError, Table, TableExtractor};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// What the fake engine returns for one file name.
#[derive(Clone)]
pub enum Script {
    Tables(Vec<Table>),
    Corrupt(String),
}

/// Returns canned tables keyed by file name and records every call.
#[derive(Default)]
pub struct FakeExtractor {
    scripts: HashMap<String, Script>,
    calls: Mutex<Vec<(PathBuf, ExtractionMode)>>,
}

impl FakeExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, file_name: &str, script: Script) -> Self {
        self.scripts.insert(file_name.to_string(), script);
        self
    }

    pub fn calls(&self) -> Vec<(PathBuf, ExtractionMode)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn into_arc(self) -> Arc<Self> {
        Arc::new(self)
    }
}

impl TableExtractor for FakeExtractor {
    fn extract(&self, path: &Path, mode: ExtractionMode) -> Result<Vec<Table>, Pdf2SheetError> {
        self.calls.lock().unwrap().push((path.to_path_buf(), mode));
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        match self.scripts.get(&name) {
            Some(Script::Tables(tables)) => Ok(tables.clone()),
            Some(Script::Corrupt(detail)) => Err(Pdf2SheetError::CorruptPdf {
                path: path.to_path_buf(),
                detail: detail.clone(),
            }),
            None => Ok(Vec::new()),
        }
    }
}

pub fn strings(cells: &[&str]) -> Vec<String> {
    cells.iter().map(|s| s.to_string()).collect()
}

pub fn table(page: usize, headers: &[&str], rows: &[&[&str]]) -> Table {
    Table::new(
        page,
        strings(headers),
        rows.iter().map(|r| strings(r)).collect(),
    )
}

/// A file that passes the `%PDF` magic-byte check.
pub fn write_fake_pdf(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, b"%PDF-1.7\n%fake\n").unwrap();
    path
}
