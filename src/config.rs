//! Configuration types for result-sheet ingestion.
//!
//! All extraction and ranking behaviour is controlled through
//! [`IngestConfig`], built via its [`IngestConfigBuilder`]. The defaults
//! describe the standard result-sheet template: one student summary and one
//! grade table per page.

use crate::error::GradesheetError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Configuration for an ingestion run.
///
/// Built via [`IngestConfig::builder()`] or using [`IngestConfig::default()`].
///
/// # Example
/// ```rust
/// use edgequake_gradesheet::{IngestConfig, PageSelection, TieBreak};
///
/// let config = IngestConfig::builder()
///     .pages(PageSelection::Range(1, 40))
///     .tie_break(TieBreak::RollNumber)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct IngestConfig {
    /// Page selection. Default: All pages.
    pub pages: PageSelection,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Maximum student records a single page may produce. Default: 1.
    ///
    /// With the default, the whole page text is one summary block and only the
    /// first qualifying grade table is read. Larger values split the page text
    /// at each roll-number label and pair the k-th block with the k-th
    /// qualifying table.
    pub records_per_page: usize,

    /// Column labels of the grade table.
    pub headers: TableHeaders,

    /// Table-detection tolerances, in PDF points.
    pub layout: LayoutConfig,

    /// Ordering among students with equal SGPA. Default: [`TieBreak::InsertionOrder`].
    pub tie_break: TieBreak,

    /// Optional per-page event sink.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            pages: PageSelection::default(),
            password: None,
            download_timeout_secs: 120,
            records_per_page: 1,
            headers: TableHeaders::default(),
            layout: LayoutConfig::default(),
            tie_break: TieBreak::default(),
            progress_callback: None,
        }
    }
}

impl fmt::Debug for IngestConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IngestConfig")
            .field("pages", &self.pages)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("download_timeout_secs", &self.download_timeout_secs)
            .field("records_per_page", &self.records_per_page)
            .field("headers", &self.headers)
            .field("layout", &self.layout)
            .field("tie_break", &self.tie_break)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn IngestProgressCallback>"),
            )
            .finish()
    }
}

impl IngestConfig {
    /// Create a new builder for `IngestConfig`.
    pub fn builder() -> IngestConfigBuilder {
        IngestConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`IngestConfig`].
#[derive(Debug)]
pub struct IngestConfigBuilder {
    config: IngestConfig,
}

impl IngestConfigBuilder {
    pub fn pages(mut self, selection: PageSelection) -> Self {
        self.config.pages = selection;
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn records_per_page(mut self, n: usize) -> Self {
        self.config.records_per_page = n;
        self
    }

    pub fn headers(mut self, headers: TableHeaders) -> Self {
        self.config.headers = headers;
        self
    }

    pub fn layout(mut self, layout: LayoutConfig) -> Self {
        self.config.layout = layout;
        self
    }

    pub fn tie_break(mut self, tie_break: TieBreak) -> Self {
        self.config.tie_break = tie_break;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<IngestConfig, GradesheetError> {
        let c = &self.config;
        if c.records_per_page == 0 {
            return Err(GradesheetError::InvalidConfig(
                "records_per_page must be ≥ 1".into(),
            ));
        }
        if c.headers.subject_code.trim().is_empty() || c.headers.credits.trim().is_empty() {
            return Err(GradesheetError::InvalidConfig(
                "the subject-code and credits header labels must not be empty".into(),
            ));
        }
        if !(c.layout.line_tolerance > 0.0) || !(c.layout.cell_gap > 0.0) {
            return Err(GradesheetError::InvalidConfig(format!(
                "layout tolerances must be positive, got line_tolerance={} cell_gap={}",
                c.layout.line_tolerance, c.layout.cell_gap
            )));
        }
        if c.layout.min_columns < 2 {
            return Err(GradesheetError::InvalidConfig(format!(
                "a table needs at least 2 columns, got min_columns={}",
                c.layout.min_columns
            )));
        }
        Ok(self.config)
    }
}

// ── Grade table ──────────────────────────────────────────────────────────

/// Header labels of the grade table.
///
/// A table qualifies as the grade table only when its header row contains
/// both `subject_code` and `credits`. The remaining labels locate the other
/// columns; `subject_name` is optional on the sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableHeaders {
    pub subject_code: String,
    pub subject_name: String,
    pub credits: String,
    pub grade: String,
    pub grade_point: String,
    pub credit_points: String,
}

impl Default for TableHeaders {
    fn default() -> Self {
        Self {
            subject_code: "Subject Code".into(),
            subject_name: "Subject Name".into(),
            credits: "Credits".into(),
            grade: "Grade".into(),
            grade_point: "Grade Point".into(),
            credit_points: "Credit Points".into(),
        }
    }
}

/// Tolerances used to rebuild tables from positioned text runs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Runs whose vertical centres differ by at most this much share a line. Default: 3.0.
    pub line_tolerance: f32,
    /// Runs on one line closer than this are joined into one cell. Default: 8.0.
    pub cell_gap: f32,
    /// Minimum cells a header line needs to open a table. Default: 2.
    pub min_columns: usize,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            line_tolerance: 3.0,
            cell_gap: 8.0,
            min_columns: 2,
        }
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Ordering among students whose SGPA is equal.
///
/// Both variants are deterministic across runs; ties still receive distinct
/// consecutive ranks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    /// Earlier-stored student first. (default)
    #[default]
    InsertionOrder,
    /// Lexicographically smaller roll number first.
    RollNumber,
}

/// Specifies which pages of the PDF to scan.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum PageSelection {
    /// Scan all pages (default).
    #[default]
    All,
    /// Scan a single page (1-indexed).
    Single(usize),
    /// Scan a contiguous range of pages (1-indexed, inclusive).
    Range(usize, usize),
    /// Scan specific pages (1-indexed, deduplicated).
    Set(Vec<usize>),
}

impl PageSelection {
    /// Expand the selection into a sorted, deduplicated list of 0-indexed page numbers.
    pub fn to_indices(&self, total_pages: usize) -> Vec<usize> {
        let mut indices: Vec<usize> = match self {
            PageSelection::All => (0..total_pages).collect(),
            PageSelection::Single(p) => {
                if *p >= 1 && *p <= total_pages {
                    vec![p - 1]
                } else {
                    vec![]
                }
            }
            PageSelection::Range(start, end) => {
                let s = (*start).max(1) - 1;
                let e = (*end).min(total_pages);
                (s..e).collect()
            }
            PageSelection::Set(pages) => pages
                .iter()
                .filter(|&&p| p >= 1 && p <= total_pages)
                .map(|p| p - 1)
                .collect(),
        };
        indices.sort_unstable();
        indices.dedup();
        indices
    }
}
