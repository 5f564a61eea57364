//! Record upsert: insert-only by roll number, then one ranking pass.
//!
//! A roll number already in storage is skipped outright; its stored fields
//! and subjects are never touched. Each new student is committed together
//! with its subjects before the next one is looked at, so a storage failure
//! mid-batch keeps every student committed before it.

use crate::config::TieBreak;
use crate::error::StoreError;
use crate::output::UpsertReport;
use crate::ranking::recompute_standings;
use crate::record::StudentRecord;
use crate::store::StudentStore;
use tracing::{debug, info, warn};

/// Store every new record, then re-rank the whole population exactly once,
/// even when nothing new was inserted.
pub fn upsert_records<S, R>(store: &mut S, records: R, tie_break: TieBreak) -> Result<UpsertReport, StoreError>
where
    S: StudentStore + ?Sized,
    R: IntoIterator<Item = StudentRecord>,
{
    let mut report = UpsertReport::default();

    for record in records {
        report.records_seen += 1;

        if store.find_student_by_roll_no(&record.roll_no)?.is_some() {
            debug!("Roll number {} already stored; skipping", record.roll_no);
            report.duplicates.push(record.roll_no);
            continue;
        }

        if let Err(e) = store_student(store, &record) {
            discard(store, &record.roll_no);
            return Err(e);
        }

        debug!(
            "Stored {} with {} subjects",
            record.roll_no,
            record.subjects.len()
        );
        report.subjects_inserted += record.subjects.len();
        report.inserted.push(record.roll_no);
    }

    info!(
        "Upserted {} records: {} inserted, {} duplicates",
        report.records_seen,
        report.inserted.len(),
        report.duplicates.len()
    );

    report.standings = recompute_standings(store, tie_break)?;
    Ok(report)
}

/// Insert one student with all of its subjects and commit them together.
fn store_student<S>(store: &mut S, record: &StudentRecord) -> Result<(), StoreError>
where
    S: StudentStore + ?Sized,
{
    let student = store.insert_student(record)?;
    for subject in &record.subjects {
        store.insert_subject(subject, student.id, record.semester)?;
    }
    store.commit()
}

/// Roll back a partly written student; the original error wins.
fn discard<S>(store: &mut S, roll_no: &str)
where
    S: StudentStore + ?Sized,
{
    warn!("Storing {} failed; rolling back its partial writes", roll_no);
    if let Err(e) = store.rollback() {
        warn!("Rollback after failed insert of {} also failed: {}", roll_no, e);
    }
}
