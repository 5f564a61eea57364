//! Grade-table extraction: turn a page's tabular regions into subject rows.
//!
//! A page may carry several tables (address blocks, legends, the grade
//! table). The grade table is recognised by its header row, which must
//! contain both the subject-code and the credits label. Each data row is
//! then parsed on its own; a row with an empty code or grade, or with a
//! numeric cell that does not parse, is dropped without affecting its
//! siblings.

use crate::config::TableHeaders;
use crate::record::SubjectRecord;
use tracing::debug;

/// A tabular region as rows of cell strings; the first row is the header.
pub type TableGrid = Vec<Vec<String>>;

/// Subjects read from one grade table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableExtraction {
    pub subjects: Vec<SubjectRecord>,
    /// Data rows rejected by the row-level checks.
    pub dropped_rows: usize,
}

/// Column positions resolved from a qualifying header row.
#[derive(Debug, Clone, Copy)]
struct Columns {
    subject_code: usize,
    subject_name: Option<usize>,
    credits: usize,
    grade: Option<usize>,
    grade_point: Option<usize>,
    credit_points: Option<usize>,
}

impl Columns {
    fn resolve(header: &[String], labels: &TableHeaders) -> Option<Self> {
        let find = |label: &str| header.iter().position(|cell| cell.trim() == label.trim());
        Some(Self {
            subject_code: find(&labels.subject_code)?,
            credits: find(&labels.credits)?,
            subject_name: find(&labels.subject_name),
            grade: find(&labels.grade),
            grade_point: find(&labels.grade_point),
            credit_points: find(&labels.credit_points),
        })
    }
}

/// Whether `table`'s header row carries both required labels.
pub fn is_grade_table(table: &[Vec<String>], labels: &TableHeaders) -> bool {
    table
        .first()
        .is_some_and(|header| Columns::resolve(header, labels).is_some())
}

/// Extract subjects from the first qualifying table; later tables are ignored.
///
/// Returns `None` when no table qualifies.
pub fn extract_subjects(tables: &[TableGrid], labels: &TableHeaders) -> Option<TableExtraction> {
    tables
        .iter()
        .find(|t| is_grade_table(t, labels))
        .map(|t| parse_grade_table(t, labels))
}

/// Parse every data row of a table already known to qualify.
pub fn parse_grade_table(table: &[Vec<String>], labels: &TableHeaders) -> TableExtraction {
    let Some((header, rows)) = table.split_first() else {
        return TableExtraction::default();
    };
    let Some(cols) = Columns::resolve(header, labels) else {
        return TableExtraction::default();
    };

    let mut out = TableExtraction::default();
    for (i, row) in rows.iter().enumerate() {
        match parse_row(row, &cols) {
            Some(subject) => out.subjects.push(subject),
            None => {
                debug!("Dropping grade-table row {}: {:?}", i + 1, row);
                out.dropped_rows += 1;
            }
        }
    }
    out
}

fn parse_row(row: &[String], cols: &Columns) -> Option<SubjectRecord> {
    let cell = |idx: Option<usize>| idx.and_then(|i| row.get(i)).map(|s| s.trim()).unwrap_or("");

    let subject_code = cell(Some(cols.subject_code));
    let grade = cell(cols.grade);
    if subject_code.is_empty() || grade.is_empty() {
        return None;
    }

    Some(SubjectRecord {
        subject_code: subject_code.to_string(),
        subject_name: cell(cols.subject_name).to_string(),
        credits: parse_finite(cell(Some(cols.credits)))?,
        grade: grade.to_string(),
        grade_point: cell(cols.grade_point).parse::<i64>().ok()?,
        credit_points: parse_finite(cell(cols.credit_points))?,
    })
}

fn parse_finite(s: &str) -> Option<f64> {
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}
