//! Tabular data model: extracted [`Table`]s and their [`CombinedTable`].
//!
//! Concatenation aligns columns by header name, the way a dataframe concat
//! does: the combined header is the union of all headers in order of first
//! appearance, and a cell that a source table does not have is left empty.
//! Tables whose header differs from the first table's are recorded in
//! [`CombinedTable::mismatched_tables`] so callers can report the shape
//! mismatch instead of papering over it.

use crate::pipeline::postprocess;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One table as produced by the extraction engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    /// 1-indexed page the table was found on.
    pub page: usize,
    /// Column names (the first extracted row).
    pub headers: Vec<String>,
    /// Data rows, each exactly `headers.len()` cells wide.
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Build a table, padding or truncating every row to the header width.
    pub fn new(page: usize, headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let width = headers.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, String::new());
                row
            })
            .collect();
        Self {
            page,
            headers,
            rows,
        }
    }

    /// Split a raw grid into header (first row) and data rows.
    ///
    /// Returns `None` for an empty grid.
    pub fn from_grid(page: usize, mut grid: Vec<Vec<String>>) -> Option<Self> {
        if grid.is_empty() {
            return None;
        }
        let headers = grid.remove(0);
        Some(Self::new(page, headers, grid))
    }

    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// A table without columns or without data rows carries nothing to write.
    pub fn is_empty(&self) -> bool {
        self.headers.is_empty() || self.rows.is_empty()
    }
}

/// All tables of one document stacked vertically.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombinedTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    /// Number of source tables that were concatenated.
    pub source_tables: usize,
    /// Positions (0-based, in extraction order) of tables whose header
    /// differs from the first table's header.
    pub mismatched_tables: Vec<usize>,
}

impl CombinedTable {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn has_mismatched_columns(&self) -> bool {
        !self.mismatched_tables.is_empty()
    }
}

/// Concatenate tables row-wise in the given order.
///
/// Repeated names inside one table are first suffixed `.1`, `.2`, … so
/// every source column keeps its own output column.
pub fn concat(tables: &[Table]) -> CombinedTable {
    if tables.is_empty() {
        return CombinedTable::default();
    }

    let names: Vec<Vec<String>> = tables
        .iter()
        .map(|t| postprocess::dedupe_headers(t.headers.clone()))
        .collect();

    let mut headers: Vec<String> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();
    for table_names in &names {
        for name in table_names {
            if !positions.contains_key(name) {
                positions.insert(name.clone(), headers.len());
                headers.push(name.clone());
            }
        }
    }

    let mismatched_tables = names
        .iter()
        .enumerate()
        .skip(1)
        .filter(|(_, n)| **n != names[0])
        .map(|(i, _)| i)
        .collect();

    let total_rows = tables.iter().map(Table::row_count).sum();
    let mut rows = Vec::with_capacity(total_rows);
    for (table, table_names) in tables.iter().zip(&names) {
        let targets: Vec<usize> = table_names.iter().map(|h| positions[h]).collect();
        for row in &table.rows {
            let mut out = vec![String::new(); headers.len()];
            for (cell, &target) in row.iter().zip(&targets) {
                out[target] = cell.clone();
            }
            rows.push(out);
        }
    }

    CombinedTable {
        headers,
        rows,
        source_tables: tables.len(),
        mismatched_tables,
    }
}
