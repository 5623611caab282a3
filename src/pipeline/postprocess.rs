//! Post-processing: deterministic cleanup of extracted table cells.
//!
//! Text pulled out of a PDF page carries artefacts of the layout engine:
//! zero-width characters, soft hyphens, runs of spaces where glyphs were
//! spread out, and blank rows where a ruling line sat. Header names can be
//! empty or repeated, which breaks name-based concatenation. Each rule below
//! is a small pure function and is tested on its own.
//!
//! ## Rule Order
//!
//! Cells are cleaned before blank-row detection, and headers are named
//! before they are de-duplicated, so `Unnamed: N` never collides with a
//! cleaned real header.

use crate::table::Table;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

/// Apply all cleanup rules to one extracted table.
///
/// 1. Strip invisible Unicode from every cell and header
/// 2. Collapse whitespace runs to one space and trim
/// 3. Drop data rows whose cells are all empty
/// 4. Name empty headers `Unnamed: N` (0-based column position)
/// 5. Suffix repeated header names with `.1`, `.2`, …
pub fn clean_table(table: Table) -> Table {
    let headers: Vec<String> = table.headers.iter().map(|h| clean_cell(h)).collect();
    let rows = table
        .rows
        .iter()
        .map(|row| row.iter().map(|c| clean_cell(c)).collect::<Vec<_>>())
        .filter(|row| !is_blank_row(row))
        .collect();
    let headers = dedupe_headers(name_unnamed_headers(headers));
    Table::new(table.page, headers, rows)
}

/// Rules 1 and 2 for a single cell.
pub fn clean_cell(input: &str) -> String {
    collapse_whitespace(&remove_invisible_chars(input))
}

// ── Rule 1: Strip invisible Unicode ──────────────────────────────────────────

static RE_INVISIBLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\u{200B}\u{200C}\u{200D}\u{2060}\u{FEFF}\u{00AD}]").unwrap());

fn remove_invisible_chars(input: &str) -> String {
    RE_INVISIBLE.replace_all(input, "").to_string()
}

// ── Rule 2: Collapse whitespace ──────────────────────────────────────────────

static RE_WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

fn collapse_whitespace(input: &str) -> String {
    RE_WHITESPACE.replace_all(input.trim(), " ").to_string()
}

// ── Rule 3: Blank rows ───────────────────────────────────────────────────────

fn is_blank_row(row: &[String]) -> bool {
    row.iter().all(|c| c.is_empty())
}

// ── Rule 4: Unnamed headers ──────────────────────────────────────────────────

fn name_unnamed_headers(headers: Vec<String>) -> Vec<String> {
    headers
        .into_iter()
        .enumerate()
        .map(|(i, h)| if h.is_empty() { format!("Unnamed: {i}") } else { h })
        .collect()
}

// ── Rule 5: Duplicate headers ────────────────────────────────────────────────

/// Suffix repeated names with `.1`, `.2`, … skipping names already taken.
pub fn dedupe_headers(headers: Vec<String>) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut taken: Vec<String> = Vec::with_capacity(headers.len());
    for h in &headers {
        let count = seen.entry(h.clone()).or_insert(0);
        let mut name = if *count == 0 {
            h.clone()
        } else {
            format!("{h}.{count}")
        };
        *count += 1;
        // "a", "a.1", "a" must not produce a second "a.1"
        while taken.contains(&name) {
            let c = seen.entry(h.clone()).or_insert(0);
            name = format!("{h}.{c}");
            *c += 1;
        }
        taken.push(name);
    }
    taken
}
