//! Output types returned by the ingestion entry points.

use crate::error::PageMiss;
use crate::record::{Standing, StudentRecord};
use serde::{Deserialize, Serialize};

/// What happened to one page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageReport {
    /// 1-indexed page number.
    pub page_num: usize,
    pub status: PageStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PageStatus {
    /// The page produced one or more student records.
    Extracted {
        roll_nos: Vec<String>,
        subjects: usize,
        dropped_rows: usize,
    },
    /// The page produced nothing.
    Skipped { miss: PageMiss },
}

impl PageReport {
    pub fn is_extracted(&self) -> bool {
        matches!(self.status, PageStatus::Extracted { .. })
    }
}

/// Statistics for one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IngestStats {
    /// Pages the selection asked for.
    pub total_pages: usize,
    pub pages_extracted: usize,
    pub pages_skipped: usize,
    pub records_extracted: usize,
    pub students_inserted: usize,
    /// Records whose roll number was already stored.
    pub duplicates_skipped: usize,
    pub subjects_inserted: usize,
    pub subject_rows_dropped: usize,
    pub total_duration_ms: u64,
    pub extract_duration_ms: u64,
    pub store_duration_ms: u64,
}

/// Result of a dry run: records are extracted but never stored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionOutput {
    pub records: Vec<StudentRecord>,
    pub pages: Vec<PageReport>,
    pub stats: IngestStats,
}

/// What the upsert step did with a batch of candidates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpsertReport {
    pub records_seen: usize,
    /// Roll numbers stored by this batch, in input order.
    pub inserted: Vec<String>,
    /// Roll numbers skipped because they were already stored.
    pub duplicates: Vec<String>,
    pub subjects_inserted: usize,
    /// Standings of the whole population after the ranking pass.
    pub standings: Vec<Standing>,
}

/// Result of a successful upload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IngestOutput {
    /// Candidates extracted from the document; the upload boundary reports
    /// this count.
    pub records_extracted: usize,
    pub inserted: Vec<String>,
    pub duplicates: Vec<String>,
    pub standings: Vec<Standing>,
    pub pages: Vec<PageReport>,
    pub stats: IngestStats,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{FieldError, StudentField};

    #[test]
    fn page_report_serialises_with_status_tag() {
        let report = PageReport {
            page_num: 2,
            status: PageStatus::Skipped {
                miss: PageMiss::Fields {
                    page: 2,
                    source: FieldError::Missing(StudentField::Sgpa),
                },
            },
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["status"]["status"], "skipped");
        assert!(!report.is_extracted());

        let ok = PageReport {
            page_num: 1,
            status: PageStatus::Extracted {
                roll_nos: vec!["1001".into()],
                subjects: 6,
                dropped_rows: 0,
            },
        };
        assert!(ok.is_extracted());
    }
}
