//! Student and subject records, before and after persistence.
//!
//! [`StudentRecord`] and [`SubjectRecord`] are candidates produced by the
//! extraction pipeline. [`PersistedStudent`] and [`PersistedSubject`] are
//! the rows owned by the storage collaborator; `cgpa` and `rank` on a
//! student stay `None` until the first ranking pass.

use serde::{Deserialize, Serialize};

/// A candidate student extracted from one page.
///
/// All six scalar fields are present and parsed; a page that cannot supply
/// every one of them never becomes a `StudentRecord`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentRecord {
    /// Natural key used for deduplication across uploads.
    pub roll_no: String,
    pub name: String,
    pub father_name: String,
    pub branch: String,
    /// Positive semester number.
    pub semester: u32,
    pub sgpa: f64,
    /// Grade-table rows in page order.
    pub subjects: Vec<SubjectRecord>,
}

/// One accepted row of a grade table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectRecord {
    pub subject_code: String,
    /// Empty when the table has no subject-name column.
    pub subject_name: String,
    pub credits: f64,
    pub grade: String,
    pub grade_point: i64,
    pub credit_points: f64,
}

/// A stored student row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedStudent {
    pub id: i64,
    pub roll_no: String,
    pub name: String,
    pub father_name: String,
    pub branch: String,
    pub semester: u32,
    pub sgpa: f64,
    pub cgpa: Option<f64>,
    pub rank: Option<u32>,
}

/// A stored subject row, owned by one [`PersistedStudent`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedSubject {
    pub id: i64,
    pub student_id: i64,
    /// Copied from the owning student at insert time.
    pub semester: u32,
    pub subject_code: String,
    pub subject_name: String,
    pub credits: f64,
    pub grade: String,
    pub grade_point: i64,
    pub credit_points: f64,
}

/// Derived standing written back by the ranking engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Standing {
    pub student_id: i64,
    pub roll_no: String,
    pub sgpa: f64,
    pub cgpa: f64,
    /// 1-based position in the population ordered by SGPA descending.
    pub rank: u32,
}

/// Mean grade point of one subject within a semester.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectAverage {
    pub subject_code: String,
    pub subject_name: String,
    pub average_grade_point: f64,
    /// Number of subject rows that contributed to the mean.
    pub students: usize,
}

/// A stored student together with their subject rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentReport {
    #[serde(flatten)]
    pub student: PersistedStudent,
    pub subjects: Vec<PersistedSubject>,
}
