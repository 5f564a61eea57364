//! Error types for the edgequake-gradesheet library.
//!
//! Three error types reflect three distinct failure scopes:
//!
//! * [`GradesheetError`] (**fatal**): the run cannot produce a result at all
//!   (bad input file, wrong password, nothing extractable, storage failure).
//!   Returned as `Err(GradesheetError)` from the top-level `ingest*` functions.
//!
//! * [`PageMiss`] (**non-fatal**): one page did not yield a student record
//!   (a summary field is missing, no grade table). The page is skipped and
//!   the miss is stored in [`crate::output::PageReport`]; it never escalates.
//!
//! * [`StoreError`]: failures raised by the storage collaborator. Wrapped
//!   into [`GradesheetError::Storage`] at the boundary.
//!
//! Row-level subject parse failures have no error type: the row is dropped
//! and counted in [`crate::output::IngestStats::subject_rows_dropped`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the edgequake-gradesheet library.
///
/// Page-level misses use [`PageMiss`] and are stored in
/// [`crate::output::PageReport`] rather than propagated here.
#[derive(Debug, Error)]
pub enum GradesheetError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input string is not a valid file path or URL.
    #[error("Invalid input '{input}': not a file path or a valid HTTP/HTTPS URL")]
    InvalidInput { input: String },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    /// The upload is not a PDF (invalid file type).
    #[error("Invalid file type: '{path}' is not a PDF\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{path}' is corrupt: {detail}")]
    CorruptPdf { path: PathBuf, detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF '{path}' is encrypted and requires a password.\nProvide it with --password <PASSWORD>.")]
    PasswordRequired { path: PathBuf },

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF '{path}'")]
    WrongPassword { path: PathBuf },

    /// Selected page numbers exceed the actual page count.
    #[error("Page {page} is out of range (document has {total} pages)")]
    PageOutOfRange { page: usize, total: usize },

    /// The document source failed part-way through; remaining pages are abandoned.
    #[error("Failed to read page {page}: {detail}")]
    PageReadFailed { page: usize, detail: String },

    // ── Extraction outcome ────────────────────────────────────────────────
    /// No page of the document produced a student record.
    #[error("Could not extract any student data from the PDF ({pages} pages scanned)")]
    NoRecordsFound { pages: usize },

    // ── Query errors ──────────────────────────────────────────────────────
    /// Semesters are numbered from 1.
    #[error("Semester {0} does not exist (semesters start at 1)")]
    InvalidSemester(u32),

    /// The semester exists but no subject rows are stored for it.
    #[error("No data found for semester {semester}")]
    NoSubjectData { semester: u32 },

    /// No persisted student carries this roll number.
    #[error("Student not found: roll number '{roll_no}'")]
    StudentNotFound { roll_no: String },

    /// The student population is empty.
    #[error("Topper data not available yet: no students stored")]
    NoTopper,

    // ── Storage errors ────────────────────────────────────────────────────
    /// The storage collaborator failed; prior commits in the batch are kept.
    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Pdfium binding errors ─────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
Place libpdfium next to the binary, install it system-wide, or\n\
set PDFIUM_LIB_PATH=/path/to/libpdfium.\n"
    )]
    PdfiumBindingFailed(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Errors raised by a [`crate::store::StudentStore`] implementation.
#[derive(Debug, Error)]
pub enum StoreError {
    /// SQLite rejected a statement or the connection failed.
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// The database directory could not be created.
    #[error("cannot create database directory '{path}': {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A stored value violates the data model (e.g. semester 0).
    #[error("corrupt row in '{table}': {detail}")]
    CorruptRow { table: &'static str, detail: String },

    /// A write referenced a student id that is not stored.
    #[error("no student with id {0}")]
    UnknownStudent(i64),
}

/// The six labelled scalar fields of a student summary block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StudentField {
    RollNo,
    Name,
    FatherName,
    Branch,
    Semester,
    Sgpa,
}

impl StudentField {
    /// Label as printed on the result sheet.
    pub fn label(&self) -> &'static str {
        match self {
            Self::RollNo => "Roll No.",
            Self::Name => "Name",
            Self::FatherName => "Father's Name",
            Self::Branch => "Branch",
            Self::Semester => "Semester",
            Self::Sgpa => "SGPA",
        }
    }
}

impl fmt::Display for StudentField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Why the Field Extractor rejected a page's text.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
pub enum FieldError {
    /// The label was absent or captured nothing.
    #[error("field '{0}' not found")]
    Missing(StudentField),

    /// The label matched but the value did not coerce to its numeric type.
    #[error("field '{field}' has unparseable value {value:?}")]
    Unparseable { field: StudentField, value: String },
}

/// A non-fatal reason a single page produced no student record.
///
/// Stored alongside [`crate::output::PageReport`]. The document run
/// continues with the next page.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
pub enum PageMiss {
    /// The summary block failed the all-or-nothing field gate.
    #[error("Page {page}: {source}")]
    Fields {
        page: usize,
        #[source]
        source: FieldError,
    },

    /// No table on the page carries the required column headers.
    #[error("Page {page}: no grade table with the required headers")]
    NoGradeTable { page: usize },

    /// A grade table was found but every row was dropped.
    #[error("Page {page}: grade table has no valid subject rows ({dropped} dropped)")]
    NoSubjectRows { page: usize, dropped: usize },
}

impl PageMiss {
    /// 1-indexed page the miss belongs to.
    pub fn page(&self) -> usize {
        match self {
            Self::Fields { page, .. }
            | Self::NoGradeTable { page }
            | Self::NoSubjectRows { page, .. } => *page,
        }
    }
}
