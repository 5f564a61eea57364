//! Storage collaborator.
//!
//! The core only talks to storage through [`StudentStore`]. Writes may be
//! buffered until [`StudentStore::commit`]; what is committed stays committed
//! even if a later write in the same batch fails. Callers that give up on a
//! batch call [`StudentStore::rollback`] so the store can be reused.

mod sqlite;

pub use sqlite::SqliteStore;

use crate::error::StoreError;
use crate::record::{PersistedStudent, PersistedSubject, StudentRecord, SubjectRecord};

/// The verbs the ingestion and query paths need from storage.
pub trait StudentStore {
    /// Look a student up by natural key.
    fn find_student_by_roll_no(&self, roll_no: &str) -> Result<Option<PersistedStudent>, StoreError>;

    /// Store a new student without subjects. `cgpa` and `rank` start unset.
    fn insert_student(&mut self, record: &StudentRecord) -> Result<PersistedStudent, StoreError>;

    /// Store one subject row for `student_id`, tagged with `semester`.
    fn insert_subject(
        &mut self,
        subject: &SubjectRecord,
        student_id: i64,
        semester: u32,
    ) -> Result<PersistedSubject, StoreError>;

    /// Every stored student, in insertion order.
    fn list_students(&self) -> Result<Vec<PersistedStudent>, StoreError>;

    /// Every subject row of one semester, in insertion order.
    fn list_subjects(&self, semester: u32) -> Result<Vec<PersistedSubject>, StoreError>;

    fn subjects_for_student(&self, student_id: i64) -> Result<Vec<PersistedSubject>, StoreError>;

    /// Overwrite the derived standing of one student.
    fn update_standing(&mut self, student_id: i64, cgpa: f64, rank: u32) -> Result<(), StoreError>;

    /// Make every write since the previous commit durable and visible.
    fn commit(&mut self) -> Result<(), StoreError>;

    /// Discard every write since the previous commit.
    fn rollback(&mut self) -> Result<(), StoreError>;
}
