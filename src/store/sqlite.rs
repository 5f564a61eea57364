//! SQLite-backed [`StudentStore`].
//!
//! Writes open a transaction lazily and [`StudentStore::commit`] closes it.
//! [`StudentStore::rollback`] discards it, and dropping the store with an
//! open transaction does the same, so an aborted batch never leaves half a
//! student behind.

use super::StudentStore;
use crate::error::StoreError;
use crate::record::{PersistedStudent, PersistedSubject, StudentRecord, SubjectRecord};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use tracing::{debug, warn};

// ── Schema SQL ───────────────────────────────────────────────────────────

const SCHEMA_SQL: &str = "
CREATE TABLE IF NOT EXISTS students (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    roll_no TEXT NOT NULL UNIQUE,
    name TEXT NOT NULL,
    father_name TEXT NOT NULL,
    branch TEXT NOT NULL,
    semester INTEGER NOT NULL,
    sgpa REAL NOT NULL,
    cgpa REAL,
    rank INTEGER,
    created_at INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
);

CREATE TABLE IF NOT EXISTS subjects (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    student_id INTEGER NOT NULL REFERENCES students(id) ON DELETE CASCADE,
    semester INTEGER NOT NULL,
    subject_code TEXT NOT NULL,
    subject_name TEXT NOT NULL DEFAULT '',
    credits REAL NOT NULL,
    grade TEXT NOT NULL,
    grade_point INTEGER NOT NULL,
    credit_points REAL NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_subjects_student ON subjects(student_id);
CREATE INDEX IF NOT EXISTS idx_subjects_semester ON subjects(semester);
";

const STUDENT_COLUMNS: &str = "id, roll_no, name, father_name, branch, semester, sgpa, cgpa, rank";

const SUBJECT_COLUMNS: &str =
    "id, student_id, semester, subject_code, subject_name, credits, grade, grade_point, credit_points";

/// A [`StudentStore`] over one SQLite connection.
pub struct SqliteStore {
    conn: Connection,
    in_tx: bool,
}

impl SqliteStore {
    /// Open or create a database file, creating parent directories as needed.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| StoreError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let conn = Connection::open(path)?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA busy_timeout = 5000;",
        )?;
        debug!("Opened student database {}", path.display());
        Self::init(conn)
    }

    /// A private database that disappears with the store.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(Self { conn, in_tx: false })
    }

    fn begin(&mut self) -> Result<(), StoreError> {
        if !self.in_tx {
            self.conn.execute_batch("BEGIN TRANSACTION")?;
            self.in_tx = true;
        }
        Ok(())
    }

    fn query_subjects(&self, sql: &str, key: i64) -> Result<Vec<PersistedSubject>, StoreError> {
        let mut stmt = self.conn.prepare(sql)?;
        let subjects = stmt
            .query_map(params![key], row_to_subject)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(subjects)
    }
}

impl StudentStore for SqliteStore {
    fn find_student_by_roll_no(&self, roll_no: &str) -> Result<Option<PersistedStudent>, StoreError> {
        let sql = format!("SELECT {STUDENT_COLUMNS} FROM students WHERE roll_no = ?1");
        let student = self
            .conn
            .query_row(&sql, params![roll_no], row_to_student)
            .optional()?;
        student.map(validate_student).transpose()
    }

    fn insert_student(&mut self, record: &StudentRecord) -> Result<PersistedStudent, StoreError> {
        self.begin()?;
        self.conn.execute(
            "INSERT INTO students (roll_no, name, father_name, branch, semester, sgpa)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                record.roll_no,
                record.name,
                record.father_name,
                record.branch,
                record.semester,
                record.sgpa
            ],
        )?;
        Ok(PersistedStudent {
            id: self.conn.last_insert_rowid(),
            roll_no: record.roll_no.clone(),
            name: record.name.clone(),
            father_name: record.father_name.clone(),
            branch: record.branch.clone(),
            semester: record.semester,
            sgpa: record.sgpa,
            cgpa: None,
            rank: None,
        })
    }

    fn insert_subject(
        &mut self,
        subject: &SubjectRecord,
        student_id: i64,
        semester: u32,
    ) -> Result<PersistedSubject, StoreError> {
        self.begin()?;
        self.conn.execute(
            "INSERT INTO subjects
                (student_id, semester, subject_code, subject_name, credits, grade, grade_point, credit_points)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                student_id,
                semester,
                subject.subject_code,
                subject.subject_name,
                subject.credits,
                subject.grade,
                subject.grade_point,
                subject.credit_points
            ],
        )?;
        Ok(PersistedSubject {
            id: self.conn.last_insert_rowid(),
            student_id,
            semester,
            subject_code: subject.subject_code.clone(),
            subject_name: subject.subject_name.clone(),
            credits: subject.credits,
            grade: subject.grade.clone(),
            grade_point: subject.grade_point,
            credit_points: subject.credit_points,
        })
    }

    fn list_students(&self) -> Result<Vec<PersistedStudent>, StoreError> {
        let sql = format!("SELECT {STUDENT_COLUMNS} FROM students ORDER BY id");
        let mut stmt = self.conn.prepare(&sql)?;
        let students = stmt
            .query_map([], row_to_student)?
            .map(|r| r.map_err(StoreError::from).and_then(validate_student))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(students)
    }

    fn list_subjects(&self, semester: u32) -> Result<Vec<PersistedSubject>, StoreError> {
        let sql = format!("SELECT {SUBJECT_COLUMNS} FROM subjects WHERE semester = ?1 ORDER BY id");
        self.query_subjects(&sql, i64::from(semester))
    }

    fn subjects_for_student(&self, student_id: i64) -> Result<Vec<PersistedSubject>, StoreError> {
        let sql = format!("SELECT {SUBJECT_COLUMNS} FROM subjects WHERE student_id = ?1 ORDER BY id");
        self.query_subjects(&sql, student_id)
    }

    fn update_standing(&mut self, student_id: i64, cgpa: f64, rank: u32) -> Result<(), StoreError> {
        self.begin()?;
        let changed = self.conn.execute(
            "UPDATE students SET cgpa = ?1, rank = ?2 WHERE id = ?3",
            params![cgpa, rank, student_id],
        )?;
        if changed == 0 {
            return Err(StoreError::UnknownStudent(student_id));
        }
        Ok(())
    }

    fn commit(&mut self) -> Result<(), StoreError> {
        if self.in_tx {
            self.conn.execute_batch("COMMIT")?;
            self.in_tx = false;
        }
        Ok(())
    }

    fn rollback(&mut self) -> Result<(), StoreError> {
        if self.in_tx {
            self.in_tx = false;
            self.conn.execute_batch("ROLLBACK")?;
        }
        Ok(())
    }
}

impl Drop for SqliteStore {
    fn drop(&mut self) {
        if self.in_tx {
            warn!("Rolling back uncommitted student writes");
            let _ = self.rollback();
        }
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────

fn row_to_student(row: &Row) -> Result<PersistedStudent, rusqlite::Error> {
    Ok(PersistedStudent {
        id: row.get(0)?,
        roll_no: row.get(1)?,
        name: row.get(2)?,
        father_name: row.get(3)?,
        branch: row.get(4)?,
        semester: row.get(5)?,
        sgpa: row.get(6)?,
        cgpa: row.get(7)?,
        rank: row.get(8)?,
    })
}

fn row_to_subject(row: &Row) -> Result<PersistedSubject, rusqlite::Error> {
    Ok(PersistedSubject {
        id: row.get(0)?,
        student_id: row.get(1)?,
        semester: row.get(2)?,
        subject_code: row.get(3)?,
        subject_name: row.get(4)?,
        credits: row.get(5)?,
        grade: row.get(6)?,
        grade_point: row.get(7)?,
        credit_points: row.get(8)?,
    })
}

fn validate_student(student: PersistedStudent) -> Result<PersistedStudent, StoreError> {
    if student.semester == 0 || !student.sgpa.is_finite() {
        return Err(StoreError::CorruptRow {
            table: "students",
            detail: format!(
                "roll_no {} has semester {} and sgpa {}",
                student.roll_no, student.semester, student.sgpa
            ),
        });
    }
    Ok(student)
}
