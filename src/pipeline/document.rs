//! Document pipeline: walk pages in order and yield student records lazily.
//!
//! [`DocumentPipeline`] wraps any page source and is itself an iterator of
//! `Result<StudentRecord, GradesheetError>`. Pages that fail assembly are
//! skipped and reported; a source error is yielded once and ends the
//! sequence. The pipeline is single-pass: once exhausted it stays exhausted,
//! and re-extraction needs a fresh page source.

use crate::config::IngestConfig;
use crate::error::{GradesheetError, PageMiss};
use crate::output::{PageReport, PageStatus};
use crate::pipeline::assemble::{assemble_page, PageContent};
use crate::record::StudentRecord;
use std::collections::VecDeque;
use std::iter::FusedIterator;
use tracing::{debug, info, warn};

/// Lazy, order-preserving record sequence over a page source.
pub struct DocumentPipeline<'c, I> {
    pages: I,
    config: &'c IngestConfig,
    total_pages: usize,
    pending: VecDeque<StudentRecord>,
    reports: Vec<PageReport>,
    records_extracted: usize,
    subject_rows_dropped: usize,
    started: bool,
    done: bool,
}

impl<'c, I> DocumentPipeline<'c, I>
where
    I: Iterator<Item = Result<PageContent, GradesheetError>>,
{
    /// `total_pages` is only used for progress reporting.
    pub fn new(
        pages: impl IntoIterator<IntoIter = I>,
        total_pages: usize,
        config: &'c IngestConfig,
    ) -> Self {
        Self {
            pages: pages.into_iter(),
            config,
            total_pages,
            pending: VecDeque::new(),
            reports: Vec::new(),
            records_extracted: 0,
            subject_rows_dropped: 0,
            started: false,
            done: false,
        }
    }

    /// Reports for every page processed so far.
    pub fn reports(&self) -> &[PageReport] {
        &self.reports
    }

    pub fn into_reports(self) -> Vec<PageReport> {
        self.reports
    }

    pub fn records_extracted(&self) -> usize {
        self.records_extracted
    }

    pub fn subject_rows_dropped(&self) -> usize {
        self.subject_rows_dropped
    }

    fn process(&mut self, page: PageContent) {
        let page_num = page.page_num;
        if let Some(cb) = &self.config.progress_callback {
            cb.on_page_start(page_num, self.total_pages);
        }

        match assemble_page(&page, self.config) {
            Ok(assembled) => {
                let subjects: usize = assembled.records.iter().map(|r| r.subjects.len()).sum();
                debug!(
                    "Page {}: {} record(s), {} subjects, {} rows dropped",
                    page_num,
                    assembled.records.len(),
                    subjects,
                    assembled.dropped_rows
                );
                if let Some(cb) = &self.config.progress_callback {
                    for r in &assembled.records {
                        cb.on_page_extracted(page_num, self.total_pages, &r.roll_no, r.subjects.len());
                    }
                }
                self.subject_rows_dropped += assembled.dropped_rows;
                self.records_extracted += assembled.records.len();
                self.reports.push(PageReport {
                    page_num,
                    status: PageStatus::Extracted {
                        roll_nos: assembled.records.iter().map(|r| r.roll_no.clone()).collect(),
                        subjects,
                        dropped_rows: assembled.dropped_rows,
                    },
                });
                self.pending.extend(assembled.records);
            }
            Err(miss) => {
                debug!("Skipping {}", miss);
                if let PageMiss::NoSubjectRows { dropped, .. } = &miss {
                    self.subject_rows_dropped += dropped;
                }
                if let Some(cb) = &self.config.progress_callback {
                    cb.on_page_skipped(page_num, self.total_pages, &miss.to_string());
                }
                self.reports.push(PageReport {
                    page_num,
                    status: PageStatus::Skipped { miss },
                });
            }
        }
    }

    fn finish(&mut self) {
        self.done = true;
        let extracted = self.reports.iter().filter(|r| r.is_extracted()).count();
        info!(
            "Scanned {} pages: {} records from {} pages, {} skipped",
            self.reports.len(),
            self.records_extracted,
            extracted,
            self.reports.len() - extracted
        );
        if let Some(cb) = &self.config.progress_callback {
            cb.on_ingest_complete(self.total_pages, self.records_extracted);
        }
    }
}

impl<I> Iterator for DocumentPipeline<'_, I>
where
    I: Iterator<Item = Result<PageContent, GradesheetError>>,
{
    type Item = Result<StudentRecord, GradesheetError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(record) = self.pending.pop_front() {
                return Some(Ok(record));
            }
            if self.done {
                return None;
            }
            if !self.started {
                self.started = true;
                if let Some(cb) = &self.config.progress_callback {
                    cb.on_ingest_start(self.total_pages);
                }
            }
            match self.pages.next() {
                Some(Ok(page)) => self.process(page),
                Some(Err(e)) => {
                    warn!("Document source failed after {} pages: {}", self.reports.len(), e);
                    self.done = true;
                    return Some(Err(e));
                }
                None => self.finish(),
            }
        }
    }
}

impl<I> FusedIterator for DocumentPipeline<'_, I> where
    I: Iterator<Item = Result<PageContent, GradesheetError>>
{
}
