//! Read-side queries over stored students and subjects.

use crate::error::{GradesheetError, StoreError};
use crate::record::{PersistedStudent, StudentReport, SubjectAverage};
use crate::store::StudentStore;
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// The student with the highest CGPA, SGPA breaking ties.
///
/// Students not yet ranked (no CGPA) sort after every ranked one. Among
/// fully equal candidates the earliest stored wins. `None` when storage is
/// empty.
pub fn topper<S>(store: &S) -> Result<Option<PersistedStudent>, StoreError>
where
    S: StudentStore + ?Sized,
{
    let students = store.list_students()?;
    Ok(students
        .into_iter()
        .reduce(|best, s| match compare_standing(&s, &best) {
            Ordering::Greater => s,
            _ => best,
        }))
}

fn compare_standing(a: &PersistedStudent, b: &PersistedStudent) -> Ordering {
    let cgpa = match (a.cgpa, b.cgpa) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => Ordering::Equal,
    };
    cgpa.then_with(|| a.sgpa.total_cmp(&b.sgpa))
}

/// Mean grade point per (subject code, subject name) for one semester,
/// sorted by code then name.
///
/// Semester 0 does not exist and is an error; a real semester with no
/// stored subjects yields an empty list.
pub fn subject_averages<S>(store: &S, semester: u32) -> Result<Vec<SubjectAverage>, GradesheetError>
where
    S: StudentStore + ?Sized,
{
    if semester == 0 {
        return Err(GradesheetError::InvalidSemester(semester));
    }

    let mut groups: BTreeMap<(String, String), (f64, usize)> = BTreeMap::new();
    for subject in store.list_subjects(semester)? {
        let entry = groups
            .entry((subject.subject_code, subject.subject_name))
            .or_insert((0.0, 0));
        entry.0 += subject.grade_point as f64;
        entry.1 += 1;
    }

    Ok(groups
        .into_iter()
        .map(|((subject_code, subject_name), (sum, n))| SubjectAverage {
            subject_code,
            subject_name,
            average_grade_point: sum / n as f64,
            students: n,
        })
        .collect())
}

/// A stored student and their subjects, looked up by roll number.
pub fn student_report<S>(store: &S, roll_no: &str) -> Result<Option<StudentReport>, StoreError>
where
    S: StudentStore + ?Sized,
{
    let Some(student) = store.find_student_by_roll_no(roll_no)? else {
        return Ok(None);
    };
    let subjects = store.subjects_for_student(student.id)?;
    Ok(Some(StudentReport { student, subjects }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TieBreak;
    use crate::record::{StudentRecord, SubjectRecord};
    use crate::store::SqliteStore;
    use crate::upsert::upsert_records;

    fn subject(code: &str, name: &str, gp: i64) -> SubjectRecord {
        SubjectRecord {
            subject_code: code.into(),
            subject_name: name.into(),
            credits: 4.0,
            grade: "A".into(),
            grade_point: gp,
            credit_points: 4.0 * gp as f64,
        }
    }

    fn record(roll: &str, semester: u32, sgpa: f64, subjects: Vec<SubjectRecord>) -> StudentRecord {
        StudentRecord {
            roll_no: roll.into(),
            name: "TEST STUDENT".into(),
            father_name: "TEST PARENT".into(),
            branch: "CSE".into(),
            semester,
            sgpa,
            subjects,
        }
    }

    fn populated() -> SqliteStore {
        let mut store = SqliteStore::open_in_memory().unwrap();
        upsert_records(
            &mut store,
            vec![
                record("1", 5, 8.0, vec![subject("CS501", "Compilers", 8), subject("CS502", "Networks", 7)]),
                record("2", 5, 9.0, vec![subject("CS501", "Compilers", 10)]),
                record("3", 3, 9.5, vec![subject("MA301", "Maths III", 9)]),
            ],
            TieBreak::default(),
        )
        .unwrap();
        store
    }

    #[test]
    fn averages_group_by_code_and_name() {
        let store = populated();
        let avgs = subject_averages(&store, 5).unwrap();
        assert_eq!(avgs.len(), 2);
        assert_eq!(avgs[0].subject_code, "CS501");
        assert_eq!(avgs[0].average_grade_point, 9.0);
        assert_eq!(avgs[0].students, 2);
        assert_eq!(avgs[1].subject_code, "CS502");
        assert_eq!(avgs[1].average_grade_point, 7.0);
    }

    #[test]
    fn same_code_different_name_is_separate_group() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        upsert_records(
            &mut store,
            vec![
                record("1", 2, 8.0, vec![subject("X1", "Old Name", 6)]),
                record("2", 2, 8.0, vec![subject("X1", "New Name", 10)]),
            ],
            TieBreak::default(),
        )
        .unwrap();
        assert_eq!(subject_averages(&store, 2).unwrap().len(), 2);
    }

    #[test]
    fn empty_semester_versus_invalid_semester() {
        let store = populated();
        assert!(subject_averages(&store, 8).unwrap().is_empty());
        assert!(matches!(
            subject_averages(&store, 0),
            Err(GradesheetError::InvalidSemester(0))
        ));
    }

    #[test]
    fn huge_grade_points_do_not_overflow_the_sum() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        upsert_records(
            &mut store,
            vec![
                record("1", 4, 8.0, vec![subject("EE401", "Machines", i64::MAX)]),
                record("2", 4, 8.0, vec![subject("EE401", "Machines", i64::MAX)]),
            ],
            TieBreak::default(),
        )
        .unwrap();
        let avgs = subject_averages(&store, 4).unwrap();
        assert_eq!(avgs[0].students, 2);
        assert_eq!(avgs[0].average_grade_point, i64::MAX as f64);
    }

    #[test]
    fn topper_is_highest_cgpa() {
        let store = populated();
        assert_eq!(topper(&store).unwrap().unwrap().roll_no, "3");
    }

    #[test]
    fn topper_of_empty_store_is_none() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert!(topper(&store).unwrap().is_none());
    }

    #[test]
    fn unranked_students_sort_last() {
        let ranked = PersistedStudent {
            id: 1,
            roll_no: "1".into(),
            name: "A".into(),
            father_name: "B".into(),
            branch: "C".into(),
            semester: 1,
            sgpa: 6.0,
            cgpa: Some(6.0),
            rank: Some(1),
        };
        let unranked = PersistedStudent {
            id: 2,
            roll_no: "2".into(),
            sgpa: 9.9,
            cgpa: None,
            rank: None,
            ..ranked.clone()
        };
        assert_eq!(compare_standing(&ranked, &unranked), Ordering::Greater);
    }

    #[test]
    fn student_report_lookup() {
        let store = populated();
        let report = student_report(&store, "1").unwrap().unwrap();
        assert_eq!(report.student.roll_no, "1");
        assert_eq!(report.subjects.len(), 2);
        assert!(student_report(&store, "404").unwrap().is_none());
    }
}
