//! Table detection from positioned text runs.
//!
//! pdfium exposes text as runs with bounding boxes but has no notion of a
//! table. This module rebuilds tabular regions in three passes:
//!
//! 1. **Lines**: runs whose vertical centres lie within `line_tolerance`
//!    are grouped into one line, top of page first.
//! 2. **Cells**: runs on a line separated by less than `cell_gap` are joined
//!    into one cell, so multi-word headers like `Subject Code` stay whole.
//! 3. **Regions**: a line with at least `min_columns` cells opens a table and
//!    becomes its header. Following lines join while at least half of their
//!    cells sit under a header cell, they have no more cells than the header
//!    and the vertical gap stays within three header heights. A wider line
//!    opens a new table instead, so a two-column summary line printed just
//!    above the grade header does not swallow it. Each cell is placed in the
//!    header column it overlaps most.
//!
//! Coordinates are PDF points with the origin at the bottom-left corner.
//! A single-cell line always closes the current region.

use crate::config::LayoutConfig;
use crate::pipeline::table::TableGrid;

/// A run of text with its bounding box.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub text: String,
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
}

impl TextRun {
    pub fn new(text: impl Into<String>, left: f32, bottom: f32, right: f32, top: f32) -> Self {
        Self {
            text: text.into(),
            left,
            right,
            top,
            bottom,
        }
    }

    fn mid_y(&self) -> f32 {
        (self.top + self.bottom) / 2.0
    }

    fn height(&self) -> f32 {
        (self.top - self.bottom).abs()
    }
}

#[derive(Debug, Clone)]
struct Cell {
    text: String,
    left: f32,
    right: f32,
}

impl Cell {
    fn overlap(&self, left: f32, right: f32) -> f32 {
        (self.right.min(right) - self.left.max(left)).max(0.0)
    }
}

#[derive(Debug)]
struct Line {
    mid_y: f32,
    height: f32,
    cells: Vec<Cell>,
}

/// An open table: header spans plus the rows collected so far.
struct Region {
    columns: Vec<(f32, f32)>,
    header_height: f32,
    last_mid_y: f32,
    rows: TableGrid,
}

impl Region {
    fn open(line: Line) -> Self {
        Self {
            columns: line.cells.iter().map(|c| (c.left, c.right)).collect(),
            header_height: line.height.max(1.0),
            last_mid_y: line.mid_y,
            rows: vec![line.cells.into_iter().map(|c| c.text).collect()],
        }
    }

    fn accepts(&self, line: &Line, slack: f32) -> bool {
        if line.cells.len() < 2 || line.cells.len() > self.columns.len() {
            return false;
        }
        if (self.last_mid_y - line.mid_y).abs() > self.header_height * 3.0 {
            return false;
        }
        let aligned = line
            .cells
            .iter()
            .filter(|cell| {
                self.columns
                    .iter()
                    .any(|&(l, r)| cell.overlap(l - slack, r + slack) > 0.0)
            })
            .count();
        aligned * 2 >= line.cells.len()
    }

    fn push(&mut self, line: Line) {
        let mut row = vec![String::new(); self.columns.len()];
        for cell in line.cells {
            let col = self.column_for(&cell);
            if !row[col].is_empty() {
                row[col].push(' ');
            }
            row[col].push_str(&cell.text);
        }
        self.last_mid_y = line.mid_y;
        self.rows.push(row);
    }

    /// Column bands split the gaps between header cells at their midpoints;
    /// the outer bands are unbounded.
    fn column_for(&self, cell: &Cell) -> usize {
        let n = self.columns.len();
        let mut best = (0, f32::MIN);
        for i in 0..n {
            let band_left = if i == 0 {
                f32::MIN
            } else {
                (self.columns[i - 1].1 + self.columns[i].0) / 2.0
            };
            let band_right = if i + 1 == n {
                f32::MAX
            } else {
                (self.columns[i].1 + self.columns[i + 1].0) / 2.0
            };
            let ov = cell.overlap(band_left, band_right);
            if ov > best.1 {
                best = (i, ov);
            }
        }
        best.0
    }
}

/// Detect tabular regions on one page.
///
/// Returns tables in top-to-bottom order, each as rows of cell strings with
/// the header row first.
pub fn detect_tables(runs: &[TextRun], layout: &LayoutConfig) -> Vec<TableGrid> {
    let lines = build_lines(runs, layout);
    let slack = layout.cell_gap / 2.0;

    let mut tables = Vec::new();
    let mut current: Option<Region> = None;

    for line in lines {
        if let Some(region) = current.as_mut() {
            if region.accepts(&line, slack) {
                region.push(line);
                continue;
            }
        }
        if let Some(region) = current.take() {
            tables.push(region.rows);
        }
        if line.cells.len() >= layout.min_columns {
            current = Some(Region::open(line));
        }
    }
    if let Some(region) = current {
        tables.push(region.rows);
    }

    tables
}

fn build_lines(runs: &[TextRun], layout: &LayoutConfig) -> Vec<Line> {
    let mut sorted: Vec<&TextRun> = runs.iter().filter(|r| !r.text.trim().is_empty()).collect();
    sorted.sort_by(|a, b| {
        b.mid_y()
            .total_cmp(&a.mid_y())
            .then_with(|| a.left.total_cmp(&b.left))
    });

    let mut grouped: Vec<(f32, f32, Vec<&TextRun>)> = Vec::new();
    for run in sorted {
        if let Some((mid_y, height, members)) = grouped.last_mut() {
            if (*mid_y - run.mid_y()).abs() <= layout.line_tolerance {
                *height = height.max(run.height());
                members.push(run);
                continue;
            }
        }
        grouped.push((run.mid_y(), run.height(), vec![run]));
    }

    grouped
        .into_iter()
        .map(|(mid_y, height, mut members)| {
            members.sort_by(|a, b| a.left.total_cmp(&b.left));
            Line {
                mid_y,
                height,
                cells: merge_cells(&members, layout.cell_gap),
            }
        })
        .collect()
}

fn merge_cells(runs: &[&TextRun], cell_gap: f32) -> Vec<Cell> {
    let mut cells: Vec<Cell> = Vec::new();
    for run in runs {
        let text = run.text.trim();
        if let Some(last) = cells.last_mut() {
            if run.left - last.right < cell_gap {
                last.text.push(' ');
                last.text.push_str(text);
                last.right = last.right.max(run.right);
                continue;
            }
        }
        cells.push(Cell {
            text: text.to_string(),
            left: run.left,
            right: run.right,
        });
    }
    cells
}
