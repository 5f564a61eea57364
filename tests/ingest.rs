//! Integration tests for the ingestion core.
//!
//! Pages are built by hand, so these run without pdfium or any PDF on disk.
//! Each test drives `ingest_pages` / `extract_pages` against an in-memory
//! or temporary SQLite store and inspects what ended up stored.

use edgequake_gradesheet::pipeline::table::TableGrid;
use edgequake_gradesheet::{
    extract_pages, ingest_pages, student_report, subject_averages, topper, FieldError, GradesheetError,
    IngestConfig, PageContent, PageMiss, PageStatus, PersistedStudent, PersistedSubject, SqliteStore,
    StoreError, StudentField, StudentRecord, StudentStore, SubjectRecord, TieBreak,
};

// ── Page builders ────────────────────────────────────────────────────────────

fn summary(roll: &str, semester: u32, sgpa: &str) -> String {
    format!(
        "UNIVERSITY RESULT SHEET\nRoll No. {roll}\nName TEST STUDENT\n\
         Father's Name TEST PARENT\nBranch CSE\nSemester {semester}\nSGPA: {sgpa}\n"
    )
}

fn grade_table(rows: &[[&str; 6]]) -> TableGrid {
    let mut grid = vec![[
        "Subject Code",
        "Subject Name",
        "Credits",
        "Grade",
        "Grade Point",
        "Credit Points",
    ]
    .iter()
    .map(|c| c.to_string())
    .collect::<Vec<_>>()];
    grid.extend(rows.iter().map(|r| r.iter().map(|c| c.to_string()).collect()));
    grid
}

fn student_page(page_num: usize, roll: &str, sgpa: &str) -> PageContent {
    PageContent::new(
        page_num,
        summary(roll, 5, sgpa),
        vec![grade_table(&[
            ["CS501", "Compiler Design", "4", "A", "9", "36"],
            ["CS502", "Computer Networks", "3", "B", "8", "24"],
        ])],
    )
}

fn ok_pages(pages: Vec<PageContent>) -> Vec<Result<PageContent, GradesheetError>> {
    pages.into_iter().map(Ok).collect()
}

fn ranks(store: &SqliteStore) -> Vec<(String, Option<u32>)> {
    store
        .list_students()
        .unwrap()
        .into_iter()
        .map(|s| (s.roll_no, s.rank))
        .collect()
}

// ── Extraction outcomes ──────────────────────────────────────────────────────

#[test]
fn document_without_student_pages_is_an_error_for_ingest_only() {
    let pages = vec![
        PageContent::new(1, "Notice: results are provisional", vec![]),
        PageContent::new(2, "Grade legend", vec![vec![vec!["Grade".into(), "Points".into()]]]),
    ];
    let config = IngestConfig::default();

    let mut store = SqliteStore::open_in_memory().unwrap();
    let err = ingest_pages(ok_pages(pages.clone()), 2, &config, &mut store).unwrap_err();
    assert!(matches!(err, GradesheetError::NoRecordsFound { pages: 2 }));
    assert!(store.list_students().unwrap().is_empty());

    let dry = extract_pages(ok_pages(pages), 2, &config).unwrap();
    assert!(dry.records.is_empty());
    assert_eq!(dry.stats.pages_skipped, 2);
}

#[test]
fn page_missing_a_field_is_skipped_and_others_are_kept() {
    let mut broken = student_page(2, "1002", "7.5");
    broken.text = broken.text.replace("Father's Name TEST PARENT\n", "");
    let pages = vec![student_page(1, "1001", "8.0"), broken, student_page(3, "1003", "9.0")];

    let mut store = SqliteStore::open_in_memory().unwrap();
    let out = ingest_pages(ok_pages(pages), 3, &IngestConfig::default(), &mut store).unwrap();

    assert_eq!(out.inserted, vec!["1001", "1003"]);
    assert_eq!(out.stats.pages_skipped, 1);
    match &out.pages[1].status {
        PageStatus::Skipped { miss } => assert_eq!(
            miss,
            &PageMiss::Fields {
                page: 2,
                source: FieldError::Missing(StudentField::FatherName),
            }
        ),
        other => panic!("expected page 2 to be skipped, got {other:?}"),
    }
    assert!(store.find_student_by_roll_no("1002").unwrap().is_none());
}

#[test]
fn malformed_grade_row_is_dropped_and_counted() {
    let page = PageContent::new(
        1,
        summary("1001", 5, "8.0"),
        vec![grade_table(&[
            ["CS501", "Compiler Design", "4", "A", "9", "36"],
            ["CS502", "Computer Networks", "three", "B", "8", "24"],
        ])],
    );

    let mut store = SqliteStore::open_in_memory().unwrap();
    let out = ingest_pages(ok_pages(vec![page]), 1, &IngestConfig::default(), &mut store).unwrap();

    assert_eq!(out.stats.subjects_inserted, 1);
    assert_eq!(out.stats.subject_rows_dropped, 1);
    let report = student_report(&store, "1001").unwrap().unwrap();
    assert_eq!(report.subjects.len(), 1);
    assert_eq!(report.subjects[0].subject_code, "CS501");
    assert_eq!(report.subjects[0].semester, 5);
}

// ── Upsert and ranking ───────────────────────────────────────────────────────

#[test]
fn reingesting_a_roll_number_never_changes_it() {
    let config = IngestConfig::default();
    let mut store = SqliteStore::open_in_memory().unwrap();
    ingest_pages(ok_pages(vec![student_page(1, "1001", "8.0")]), 1, &config, &mut store).unwrap();
    let before = student_report(&store, "1001").unwrap().unwrap();

    let mut changed = student_page(1, "1001", "9.9");
    changed.text = changed.text.replace("Branch CSE", "Branch ECE");
    let out = ingest_pages(ok_pages(vec![changed]), 1, &config, &mut store).unwrap();

    assert_eq!(out.records_extracted, 1);
    assert!(out.inserted.is_empty());
    assert_eq!(out.duplicates, vec!["1001"]);
    assert_eq!(student_report(&store, "1001").unwrap().unwrap(), before);
    assert_eq!(store.list_students().unwrap().len(), 1);
}

#[test]
fn ranks_are_contiguous_across_uploads() {
    let config = IngestConfig::default();
    let mut store = SqliteStore::open_in_memory().unwrap();

    ingest_pages(
        ok_pages(vec![student_page(1, "1001", "7.0"), student_page(2, "1002", "8.0")]),
        2,
        &config,
        &mut store,
    )
    .unwrap();
    let out = ingest_pages(ok_pages(vec![student_page(1, "2001", "9.0")]), 1, &config, &mut store).unwrap();

    let mut got: Vec<u32> = out.standings.iter().map(|s| s.rank).collect();
    got.sort_unstable();
    assert_eq!(got, vec![1, 2, 3]);
    assert_eq!(
        ranks(&store),
        vec![
            ("1001".to_string(), Some(3)),
            ("1002".to_string(), Some(2)),
            ("2001".to_string(), Some(1)),
        ]
    );
    for s in store.list_students().unwrap() {
        assert_eq!(s.cgpa, Some(s.sgpa));
    }
}

#[test]
fn equal_sgpa_ties_follow_configured_order() {
    let pages = || {
        ok_pages(vec![
            student_page(1, "30", "9.2"),
            student_page(2, "20", "8.7"),
            student_page(3, "10", "9.2"),
        ])
    };

    let mut store = SqliteStore::open_in_memory().unwrap();
    ingest_pages(pages(), 3, &IngestConfig::default(), &mut store).unwrap();
    assert_eq!(
        ranks(&store),
        vec![
            ("30".to_string(), Some(1)),
            ("20".to_string(), Some(3)),
            ("10".to_string(), Some(2)),
        ]
    );

    let by_roll = IngestConfig::builder().tie_break(TieBreak::RollNumber).build().unwrap();
    let mut store = SqliteStore::open_in_memory().unwrap();
    ingest_pages(pages(), 3, &by_roll, &mut store).unwrap();
    assert_eq!(
        ranks(&store),
        vec![
            ("30".to_string(), Some(2)),
            ("20".to_string(), Some(3)),
            ("10".to_string(), Some(1)),
        ]
    );
}

// ── Aggregation ──────────────────────────────────────────────────────────────

#[test]
fn queries_over_ingested_population() {
    let config = IngestConfig::default();
    let mut store = SqliteStore::open_in_memory().unwrap();

    let strong = PageContent::new(
        1,
        summary("1001", 5, "9.0"),
        vec![grade_table(&[["CS501", "Compiler Design", "4", "O", "10", "40"]])],
    );
    ingest_pages(
        ok_pages(vec![strong, student_page(2, "1002", "8.0")]),
        2,
        &config,
        &mut store,
    )
    .unwrap();

    assert_eq!(topper(&store).unwrap().unwrap().roll_no, "1001");

    let avgs = subject_averages(&store, 5).unwrap();
    assert_eq!(avgs.len(), 2);
    assert_eq!(avgs[0].subject_code, "CS501");
    assert_eq!(avgs[0].average_grade_point, 9.5);
    assert_eq!(avgs[0].students, 2);
    assert_eq!(avgs[1].average_grade_point, 8.0);

    assert!(subject_averages(&store, 6).unwrap().is_empty());
    assert!(matches!(
        subject_averages(&store, 0),
        Err(GradesheetError::InvalidSemester(0))
    ));
}

// ── Failure handling ─────────────────────────────────────────────────────────

#[test]
fn unreadable_page_keeps_and_ranks_earlier_students() {
    let pages = vec![
        Ok(student_page(1, "1001", "7.0")),
        Ok(student_page(2, "1002", "8.0")),
        Err(GradesheetError::PageReadFailed {
            page: 3,
            detail: "content stream truncated".into(),
        }),
        Ok(student_page(4, "1004", "9.0")),
    ];

    let mut store = SqliteStore::open_in_memory().unwrap();
    let err = ingest_pages(pages, 4, &IngestConfig::default(), &mut store).unwrap_err();

    assert!(matches!(err, GradesheetError::PageReadFailed { page: 3, .. }));
    assert_eq!(
        ranks(&store),
        vec![("1001".to_string(), Some(2)), ("1002".to_string(), Some(1))]
    );
}

/// Delegates to SQLite but refuses subjects for one roll number's student.
struct FailingStore {
    inner: SqliteStore,
    poisoned_roll_no: &'static str,
    poisoned_id: Option<i64>,
}

impl StudentStore for FailingStore {
    fn find_student_by_roll_no(&self, roll_no: &str) -> Result<Option<PersistedStudent>, StoreError> {
        self.inner.find_student_by_roll_no(roll_no)
    }

    fn insert_student(&mut self, record: &StudentRecord) -> Result<PersistedStudent, StoreError> {
        let student = self.inner.insert_student(record)?;
        if record.roll_no == self.poisoned_roll_no {
            self.poisoned_id = Some(student.id);
        }
        Ok(student)
    }

    fn insert_subject(
        &mut self,
        subject: &SubjectRecord,
        student_id: i64,
        semester: u32,
    ) -> Result<PersistedSubject, StoreError> {
        if self.poisoned_id == Some(student_id) {
            return Err(StoreError::UnknownStudent(student_id));
        }
        self.inner.insert_subject(subject, student_id, semester)
    }

    fn list_students(&self) -> Result<Vec<PersistedStudent>, StoreError> {
        self.inner.list_students()
    }

    fn list_subjects(&self, semester: u32) -> Result<Vec<PersistedSubject>, StoreError> {
        self.inner.list_subjects(semester)
    }

    fn subjects_for_student(&self, student_id: i64) -> Result<Vec<PersistedSubject>, StoreError> {
        self.inner.subjects_for_student(student_id)
    }

    fn update_standing(&mut self, student_id: i64, cgpa: f64, rank: u32) -> Result<(), StoreError> {
        self.inner.update_standing(student_id, cgpa, rank)
    }

    fn commit(&mut self) -> Result<(), StoreError> {
        self.inner.commit()
    }

    fn rollback(&mut self) -> Result<(), StoreError> {
        self.inner.rollback()
    }
}

#[test]
fn storage_failure_mid_batch_keeps_committed_students_only() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("grades.sqlite");

    let mut store = FailingStore {
        inner: SqliteStore::open(&db).unwrap(),
        poisoned_roll_no: "1002",
        poisoned_id: None,
    };
    let pages = ok_pages(vec![
        student_page(1, "1001", "7.0"),
        student_page(2, "1002", "8.0"),
        student_page(3, "1003", "9.0"),
    ]);
    let err = ingest_pages(pages, 3, &IngestConfig::default(), &mut store).unwrap_err();
    assert!(matches!(
        err,
        GradesheetError::Storage(StoreError::UnknownStudent(_))
    ));
    drop(store);

    let reopened = SqliteStore::open(&db).unwrap();
    let students = reopened.list_students().unwrap();
    assert_eq!(students.len(), 1);
    assert_eq!(students[0].roll_no, "1001");
    assert_eq!(reopened.subjects_for_student(students[0].id).unwrap().len(), 2);
}

#[test]
fn store_reused_after_storage_failure_keeps_no_half_written_student() {
    let mut store = FailingStore {
        inner: SqliteStore::open_in_memory().unwrap(),
        poisoned_roll_no: "1002",
        poisoned_id: None,
    };
    let config = IngestConfig::default();
    let first = ingest_pages(
        ok_pages(vec![student_page(1, "1001", "7.0"), student_page(2, "1002", "8.0")]),
        2,
        &config,
        &mut store,
    );
    assert!(first.is_err());
    assert!(store.find_student_by_roll_no("1002").unwrap().is_none());

    // The sheet is fixed and re-uploaded through the same store.
    store.poisoned_roll_no = "none";
    store.poisoned_id = None;
    let second = ingest_pages(
        ok_pages(vec![student_page(1, "1002", "8.0"), student_page(2, "1003", "9.0")]),
        2,
        &config,
        &mut store,
    )
    .unwrap();

    assert_eq!(second.inserted, vec!["1002", "1003"]);
    assert!(second.duplicates.is_empty());
    let repaired = store.find_student_by_roll_no("1002").unwrap().unwrap();
    assert_eq!(store.subjects_for_student(repaired.id).unwrap().len(), 2);
    assert_eq!(
        ranks(&store.inner),
        vec![
            ("1001".to_string(), Some(3)),
            ("1002".to_string(), Some(2)),
            ("1003".to_string(), Some(1)),
        ]
    );
}
