//! Page assembly: combine summary fields and grade tables into records.
//!
//! With `records_per_page == 1` the whole page text is one summary block and
//! the first qualifying table supplies its subjects. With a larger limit the
//! text is split at each roll-number label, qualifying tables are taken in
//! page order, and the k-th block is paired with the k-th table. Blocks
//! beyond the limit or without a matching table are ignored.

use crate::config::IngestConfig;
use crate::error::PageMiss;
use crate::pipeline::fields::{extract_fields, roll_no_offsets, StudentFields};
use crate::pipeline::table::{is_grade_table, parse_grade_table, TableExtraction, TableGrid};
use crate::record::StudentRecord;

/// Text and tabular regions of one PDF page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageContent {
    /// 1-indexed page number.
    pub page_num: usize,
    pub text: String,
    pub tables: Vec<TableGrid>,
}

impl PageContent {
    pub fn new(page_num: usize, text: impl Into<String>, tables: Vec<TableGrid>) -> Self {
        Self {
            page_num,
            text: text.into(),
            tables,
        }
    }
}

/// Records produced by one page plus the grade rows it had to drop.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssembledPage {
    pub records: Vec<StudentRecord>,
    pub dropped_rows: usize,
}

/// Assemble the student records of one page.
///
/// Returns a [`PageMiss`] when the page yields nothing. With several blocks
/// per page the miss reported is the first block's.
pub fn assemble_page(page: &PageContent, config: &IngestConfig) -> Result<AssembledPage, PageMiss> {
    if config.records_per_page <= 1 {
        return assemble_block(&page.text, page.tables.iter(), page.page_num, config).map(
            |(record, dropped_rows)| AssembledPage {
                records: vec![record],
                dropped_rows,
            },
        );
    }

    let blocks = split_blocks(&page.text);
    let mut tables = page
        .tables
        .iter()
        .filter(|t| is_grade_table(t, &config.headers));

    let mut out = AssembledPage::default();
    let mut first_miss = None;
    for block in blocks.into_iter().take(config.records_per_page) {
        // Each block consumes exactly one qualifying table, matched or not.
        let table = tables.next();
        match assemble_block(block, table.into_iter(), page.page_num, config) {
            Ok((record, dropped)) => {
                out.records.push(record);
                out.dropped_rows += dropped;
            }
            Err(miss) => {
                if let PageMiss::NoSubjectRows { dropped, .. } = &miss {
                    out.dropped_rows += dropped;
                }
                if first_miss.is_none() {
                    first_miss = Some(miss);
                }
            }
        }
    }

    match (out.records.is_empty(), first_miss) {
        (true, Some(miss)) => Err(miss),
        (true, None) => Err(PageMiss::NoGradeTable {
            page: page.page_num,
        }),
        _ => Ok(out),
    }
}

fn assemble_block<'a>(
    text: &str,
    mut tables: impl Iterator<Item = &'a TableGrid>,
    page_num: usize,
    config: &IngestConfig,
) -> Result<(StudentRecord, usize), PageMiss> {
    let fields = extract_fields(text).map_err(|source| PageMiss::Fields {
        page: page_num,
        source,
    })?;

    let TableExtraction {
        subjects,
        dropped_rows,
    } = tables
        .find(|t| is_grade_table(t, &config.headers))
        .map(|t| parse_grade_table(t, &config.headers))
        .ok_or(PageMiss::NoGradeTable { page: page_num })?;

    if subjects.is_empty() {
        return Err(PageMiss::NoSubjectRows {
            page: page_num,
            dropped: dropped_rows,
        });
    }

    let StudentFields {
        roll_no,
        name,
        father_name,
        branch,
        semester,
        sgpa,
    } = fields;

    Ok((
        StudentRecord {
            roll_no,
            name,
            father_name,
            branch,
            semester,
            sgpa,
            subjects,
        },
        dropped_rows,
    ))
}

/// Split page text at each roll-number label. Text before the first label
/// stays with the first block so page headers still reach it.
fn split_blocks(text: &str) -> Vec<&str> {
    let mut offsets = roll_no_offsets(text);
    if offsets.len() <= 1 {
        return vec![text];
    }
    offsets[0] = 0;
    offsets
        .iter()
        .enumerate()
        .map(|(i, &start)| {
            let end = offsets.get(i + 1).copied().unwrap_or(text.len());
            &text[start..end]
        })
        .collect()
}
