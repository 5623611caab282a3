//! Table extraction: the seam between orchestration and the PDF engine.
//!
//! [`TableExtractor`] is what the converters call; they never look inside a
//! page themselves. The default implementation, [`PdfiumTableExtractor`],
//! reads positioned characters through `pdfium-render` and groups them into
//! a grid:
//!
//! ```text
//! glyphs ──▶ fragments ──▶ rows ──▶ regions ──▶ columns ──▶ Table
//!         (gap split)   (same top) (≥ min_cols  (left-edge
//!                                   per row)     clusters)
//! ```
//!
//! The geometry stages are plain functions over [`Glyph`]s so they can be
//! tested without a pdfium library.
//!
//! pdfium keeps thread-local state and blocks, so callers run
//! [`TableExtractor::extract`] inside `tokio::task::spawn_blocking`.

use crate::config::ExtractionOptions;
use crate::error::Pdf2SheetError;
use crate::table::Table;
use pdfium_render::prelude::*;
use std::cmp::Ordering;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// How many tables to keep per page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionMode {
    /// Every detected table on every page (batch variant).
    AllTables,
    /// At most the top-most table of each page (interactive variant).
    FirstTablePerPage,
}

/// A table-extraction engine.
///
/// Implementations return tables in page order, and top-to-bottom within a
/// page. The first row of each detected grid is the header.
pub trait TableExtractor: Send + Sync {
    fn extract(&self, pdf_path: &Path, mode: ExtractionMode) -> Result<Vec<Table>, Pdf2SheetError>;
}

// ── Geometry ─────────────────────────────────────────────────────────────

/// One positioned character, in PDF user space (y grows upwards).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Glyph {
    pub ch: char,
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
}

/// A run of glyphs on one line with no column-sized gap inside.
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    pub text: String,
    pub left: f32,
    pub right: f32,
    pub top: f32,
}

/// Split a page's glyph stream into fragments.
///
/// A new fragment starts when the baseline jumps by more than
/// `row_tolerance`, when the glyph sits left of the previous one (a new
/// line), or when the horizontal gap exceeds `word_gap_factor × height`.
/// Whitespace glyphs never start a fragment; they become a single space
/// when the next glyph continues the same fragment.
pub fn build_fragments(glyphs: &[Glyph], options: &ExtractionOptions) -> Vec<Fragment> {
    let mut fragments = Vec::new();
    let mut current: Option<Fragment> = None;
    let mut pending_space = false;

    for g in glyphs {
        if g.ch.is_control() {
            pending_space = true;
            continue;
        }
        if g.ch.is_whitespace() {
            pending_space = true;
            continue;
        }

        let height = (g.top - g.bottom).abs().max(1.0);
        let continues = match current {
            Some(ref f) => {
                let gap = g.left - f.right;
                (g.top - f.top).abs() <= options.row_tolerance
                    && gap >= -height * 0.5
                    && gap <= options.word_gap_factor * height
            }
            None => false,
        };

        if continues {
            if let Some(ref mut f) = current {
                if pending_space {
                    f.text.push(' ');
                }
                f.text.push(g.ch);
                f.right = f.right.max(g.right);
            }
        } else {
            if let Some(f) = current.take() {
                fragments.push(f);
            }
            current = Some(Fragment {
                text: g.ch.to_string(),
                left: g.left,
                right: g.right,
                top: g.top,
            });
        }
        pending_space = false;
    }

    if let Some(f) = current {
        fragments.push(f);
    }
    fragments
}

fn cmp_f32(a: f32, b: f32) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

/// Group fragments into visual rows, top of page first, each row sorted
/// left to right.
pub fn group_rows(mut fragments: Vec<Fragment>, row_tolerance: f32) -> Vec<Vec<Fragment>> {
    fragments.sort_by(|a, b| cmp_f32(b.top, a.top).then(cmp_f32(a.left, b.left)));

    let mut rows: Vec<Vec<Fragment>> = Vec::new();
    let mut row_top = f32::NAN;
    for f in fragments {
        if rows.is_empty() || (row_top - f.top).abs() > row_tolerance {
            row_top = f.top;
            rows.push(vec![f]);
        } else if let Some(row) = rows.last_mut() {
            row.push(f);
        }
    }
    for row in &mut rows {
        row.sort_by(|a, b| cmp_f32(a.left, b.left));
    }
    rows
}

/// Runs of consecutive rows that each have at least `min_cols` fragments.
/// Runs shorter than `min_rows` are discarded.
pub fn find_regions(
    rows: Vec<Vec<Fragment>>,
    min_cols: usize,
    min_rows: usize,
) -> Vec<Vec<Vec<Fragment>>> {
    let mut regions = Vec::new();
    let mut current: Vec<Vec<Fragment>> = Vec::new();

    for row in rows {
        if row.len() >= min_cols {
            current.push(row);
        } else {
            if current.len() >= min_rows {
                regions.push(std::mem::take(&mut current));
            }
            current.clear();
        }
    }
    if current.len() >= min_rows {
        regions.push(current);
    }
    regions
}

/// Cluster the left edges of a region into column anchors.
fn column_anchors(region: &[Vec<Fragment>], column_tolerance: f32) -> Vec<f32> {
    let mut lefts: Vec<f32> = region.iter().flatten().map(|f| f.left).collect();
    lefts.sort_by(|a, b| cmp_f32(*a, *b));

    let mut anchors: Vec<f32> = Vec::new();
    let mut last: Option<f32> = None;
    for x in lefts {
        match last {
            Some(prev) if x - prev <= column_tolerance => {}
            _ => anchors.push(x),
        }
        last = Some(x);
    }
    anchors
}

/// Lay a region out on its column anchors and split off the header row.
pub fn region_to_table(
    region: &[Vec<Fragment>],
    page: usize,
    options: &ExtractionOptions,
) -> Option<Table> {
    let anchors = column_anchors(region, options.column_tolerance);
    if anchors.len() < options.min_cols {
        return None;
    }

    let mut grid = vec![vec![String::new(); anchors.len()]; region.len()];
    for (r, row) in region.iter().enumerate() {
        for f in row {
            let col = anchors
                .iter()
                .enumerate()
                .min_by(|(_, a), (_, b)| cmp_f32((f.left - **a).abs(), (f.left - **b).abs()))
                .map(|(i, _)| i)
                .unwrap_or(0);
            let cell = &mut grid[r][col];
            if !cell.is_empty() {
                cell.push(' ');
            }
            cell.push_str(&f.text);
        }
    }

    Table::from_grid(page, grid)
}

/// Run the full geometry pipeline for one page.
pub fn tables_from_glyphs(
    glyphs: &[Glyph],
    page: usize,
    options: &ExtractionOptions,
) -> Vec<Table> {
    let fragments = build_fragments(glyphs, options);
    let rows = group_rows(fragments, options.row_tolerance);
    find_regions(rows, options.min_cols, options.min_rows)
        .iter()
        .filter_map(|region| region_to_table(region, page, options))
        .collect()
}

// ── pdfium engine ────────────────────────────────────────────────────────

/// Table extraction backed by the pdfium library.
#[derive(Debug, Clone, Default)]
pub struct PdfiumTableExtractor {
    options: ExtractionOptions,
}

impl PdfiumTableExtractor {
    pub fn new(options: ExtractionOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ExtractionOptions {
        &self.options
    }
}

impl TableExtractor for PdfiumTableExtractor {
    fn extract(&self, pdf_path: &Path, mode: ExtractionMode) -> Result<Vec<Table>, Pdf2SheetError> {
        let pdfium = bind_pdfium()?;
        let password = self.options.password.as_deref();

        let document = pdfium
            .load_pdf_from_file(pdf_path, password)
            .map_err(|e| map_load_error(pdf_path, password.is_some(), e))?;

        let pages = document.pages();
        let total_pages = pages.len() as usize;
        let page_indices = self.options.pages.to_indices(total_pages);
        info!(
            "Scanning {} of {} pages in {}",
            page_indices.len(),
            total_pages,
            pdf_path.display()
        );

        let mut tables = Vec::new();
        for idx in page_indices {
            let page_num = idx + 1;
            let page = pages
                .get(idx as u16)
                .map_err(|e| extraction_failed(pdf_path, page_num, e))?;
            let glyphs = page_glyphs(&page).map_err(|e| extraction_failed(pdf_path, page_num, e))?;

            let mut found = tables_from_glyphs(&glyphs, page_num, &self.options);
            debug!("Page {}: {} glyphs, {} tables", page_num, glyphs.len(), found.len());

            match mode {
                ExtractionMode::AllTables => tables.append(&mut found),
                ExtractionMode::FirstTablePerPage => {
                    if let Some(first) = found.into_iter().next() {
                        tables.push(first);
                    }
                }
            }
        }

        Ok(tables)
    }
}

/// Read every character of a page with its loose bounding box.
fn page_glyphs(page: &PdfPage) -> Result<Vec<Glyph>, PdfiumError> {
    let text = page.text()?;
    let mut glyphs = Vec::new();
    for ch in text.chars().iter() {
        let Some(c) = ch.unicode_char() else {
            continue;
        };
        let Ok(bounds) = ch.loose_bounds() else {
            continue;
        };
        glyphs.push(Glyph {
            ch: c,
            left: bounds.left().value,
            right: bounds.right().value,
            top: bounds.top().value,
            bottom: bounds.bottom().value,
        });
    }
    Ok(glyphs)
}

/// Bind to pdfium: `PDFIUM_LIB_PATH`, then next to the executable, then
/// the system library.
fn bind_pdfium() -> Result<Pdfium, Pdf2SheetError> {
    if let Ok(path) = std::env::var("PDFIUM_LIB_PATH") {
        if !path.is_empty() {
            let bindings = Pdfium::bind_to_library(&path).map_err(|e| {
                Pdf2SheetError::PdfiumBindingFailed(format!("PDFIUM_LIB_PATH={path}: {e:?}"))
            })?;
            return Ok(Pdfium::new(bindings));
        }
    }

    let exe_dir: Option<PathBuf> = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(Path::to_path_buf));
    let local = exe_dir
        .map(|dir| Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(&dir)));

    let bindings = match local {
        Some(Ok(bindings)) => bindings,
        _ => Pdfium::bind_to_system_library()
            .map_err(|e| Pdf2SheetError::PdfiumBindingFailed(format!("{e:?}")))?,
    };
    Ok(Pdfium::new(bindings))
}

fn map_load_error(path: &Path, had_password: bool, e: PdfiumError) -> Pdf2SheetError {
    let err_str = format!("{:?}", e);
    if err_str.contains("Password") || err_str.contains("password") {
        if had_password {
            Pdf2SheetError::WrongPassword {
                path: path.to_path_buf(),
            }
        } else {
            Pdf2SheetError::PasswordRequired {
                path: path.to_path_buf(),
            }
        }
    } else {
        warn!("pdfium could not open {}: {}", path.display(), err_str);
        Pdf2SheetError::CorruptPdf {
            path: path.to_path_buf(),
            detail: err_str,
        }
    }
}

fn extraction_failed(path: &Path, page: usize, e: PdfiumError) -> Pdf2SheetError {
    Pdf2SheetError::ExtractionFailed {
        path: path.to_path_buf(),
        page,
        detail: format!("{:?}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const H: f32 = 10.0;
    const W: f32 = 5.0;

    /// Lay out a line of text at `top`, starting at `left`, one glyph per char.
    fn line(text: &str, left: f32, top: f32) -> Vec<Glyph> {
        text.chars()
            .enumerate()
            .map(|(i, ch)| {
                let l = left + i as f32 * W;
                Glyph {
                    ch,
                    left: l,
                    right: l + W,
                    top,
                    bottom: top - H,
                }
            })
            .collect()
    }

    fn row(cells: &[(&str, f32)], top: f32) -> Vec<Glyph> {
        let mut glyphs = Vec::new();
        for (text, left) in cells {
            glyphs.extend(line(text, *left, top));
        }
        glyphs.push(Glyph {
            ch: '\n',
            left: 0.0,
            right: 0.0,
            top,
            bottom: top,
        });
        glyphs
    }

    #[test]
    fn fragments_split_on_wide_gaps_only() {
        let glyphs = row(&[("New York", 10.0), ("42", 150.0)], 700.0);
        let frags = build_fragments(&glyphs, &ExtractionOptions::default());
        let texts: Vec<_> = frags.iter().map(|f| f.text.as_str()).collect();
        assert_eq!(texts, vec!["New York", "42"]);
        assert_eq!(frags[1].left, 150.0);
    }

    #[test]
    fn rows_are_grouped_top_down() {
        let mut glyphs = row(&[("b1", 10.0), ("b2", 100.0)], 680.0);
        glyphs.extend(row(&[("a1", 10.0), ("a2", 100.0)], 700.0));
        let frags = build_fragments(&glyphs, &ExtractionOptions::default());
        let rows = group_rows(frags, 3.0);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0][0].text, "a1");
        assert_eq!(rows[1][1].text, "b2");
    }

    #[test]
    fn prose_line_breaks_a_region() {
        let mut glyphs = Vec::new();
        glyphs.extend(row(&[("Name", 10.0), ("Qty", 100.0)], 700.0));
        glyphs.extend(row(&[("apple", 10.0), ("3", 100.0)], 685.0));
        glyphs.extend(row(&[("Some paragraph text", 10.0)], 660.0));
        glyphs.extend(row(&[("City", 10.0), ("Pop", 100.0)], 640.0));
        glyphs.extend(row(&[("Oslo", 10.0), ("700k", 100.0)], 625.0));
        glyphs.extend(row(&[("Rome", 10.0), ("2.8M", 100.0)], 610.0));

        let tables = tables_from_glyphs(&glyphs, 4, &ExtractionOptions::default());
        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0].headers, vec!["Name", "Qty"]);
        assert_eq!(tables[0].rows, vec![vec!["apple".to_string(), "3".to_string()]]);
        assert_eq!(tables[1].headers, vec!["City", "Pop"]);
        assert_eq!(tables[1].row_count(), 2);
        assert_eq!(tables[1].page, 4);
    }

    #[test]
    fn sparse_cells_land_in_their_column() {
        let mut glyphs = Vec::new();
        glyphs.extend(row(&[("A", 10.0), ("B", 100.0), ("C", 200.0)], 700.0));
        glyphs.extend(row(&[("1", 10.0), ("3", 200.0)], 685.0));
        glyphs.extend(row(&[("4", 12.0), ("5", 101.0), ("6", 199.0)], 670.0));

        let tables = tables_from_glyphs(&glyphs, 1, &ExtractionOptions::default());
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].rows[0], vec!["1", "", "3"]);
        assert_eq!(tables[0].rows[1], vec!["4", "5", "6"]);
    }

    #[test]
    fn single_row_is_not_a_table() {
        let glyphs = row(&[("A", 10.0), ("B", 100.0)], 700.0);
        assert!(tables_from_glyphs(&glyphs, 1, &ExtractionOptions::default()).is_empty());
    }

    #[test]
    fn empty_page_has_no_tables() {
        assert!(tables_from_glyphs(&[], 1, &ExtractionOptions::default()).is_empty());
    }
}
