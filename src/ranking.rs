//! Ranking engine: recompute CGPA and rank for the whole population.
//!
//! Every batch recomputes from scratch. Students are ordered by SGPA,
//! highest first, and ranked 1..=n with no gaps or shared ranks. Equal SGPA
//! falls back to the configured [`TieBreak`].
//!
//! CGPA is a single-semester placeholder: it is set equal to SGPA because
//! only one semester per student is ever stored.

use crate::config::TieBreak;
use crate::error::StoreError;
use crate::record::{PersistedStudent, Standing};
use crate::store::StudentStore;
use std::cmp::Ordering;
use tracing::{info, warn};

/// Order `students` and assign ranks. Pure; does not touch storage.
///
/// `students` is expected in insertion order, which is what
/// [`TieBreak::InsertionOrder`] preserves.
pub fn rank_population(students: &[PersistedStudent], tie_break: TieBreak) -> Vec<Standing> {
    let mut order: Vec<&PersistedStudent> = students.iter().collect();
    order.sort_by(|a, b| {
        b.sgpa.total_cmp(&a.sgpa).then_with(|| match tie_break {
            TieBreak::InsertionOrder => Ordering::Equal,
            TieBreak::RollNumber => a.roll_no.cmp(&b.roll_no),
        })
    });

    order
        .into_iter()
        .zip(1u32..)
        .map(|(s, rank)| Standing {
            student_id: s.id,
            roll_no: s.roll_no.clone(),
            sgpa: s.sgpa,
            cgpa: placeholder_cgpa(s),
            rank,
        })
        .collect()
}

fn placeholder_cgpa(student: &PersistedStudent) -> f64 {
    student.sgpa
}

/// Recompute and persist standings for every stored student, then commit
/// once so readers never see a half-ranked population.
pub fn recompute_standings<S>(store: &mut S, tie_break: TieBreak) -> Result<Vec<Standing>, StoreError>
where
    S: StudentStore + ?Sized,
{
    let students = store.list_students()?;
    let standings = rank_population(&students, tie_break);
    let written = standings
        .iter()
        .try_for_each(|s| store.update_standing(s.student_id, s.cgpa, s.rank))
        .and_then(|()| store.commit());
    if let Err(e) = written {
        warn!("Ranking pass failed, keeping previous standings: {}", e);
        if let Err(rb) = store.rollback() {
            warn!("Rollback of ranking pass failed: {}", rb);
        }
        return Err(e);
    }
    info!("Ranked {} students", standings.len());
    Ok(standings)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn student(id: i64, roll: &str, sgpa: f64) -> PersistedStudent {
        PersistedStudent {
            id,
            roll_no: roll.into(),
            name: "X".into(),
            father_name: "Y".into(),
            branch: "CSE".into(),
            semester: 5,
            sgpa,
            cgpa: None,
            rank: None,
        }
    }

    fn ranks(standings: &[Standing]) -> Vec<(&str, u32)> {
        standings.iter().map(|s| (s.roll_no.as_str(), s.rank)).collect()
    }

    #[test]
    fn ranks_by_sgpa_descending() {
        let pop = [student(1, "A", 8.7), student(2, "B", 9.2)];
        let out = rank_population(&pop, TieBreak::InsertionOrder);
        assert_eq!(ranks(&out), vec![("B", 1), ("A", 2)]);
        assert!(out.iter().all(|s| s.cgpa == s.sgpa));
    }

    #[test]
    fn ties_follow_insertion_order_by_default() {
        let pop = [student(1, "Z9", 9.2), student(2, "M5", 8.7), student(3, "A1", 9.2)];
        let out = rank_population(&pop, TieBreak::InsertionOrder);
        assert_eq!(ranks(&out), vec![("Z9", 1), ("A1", 2), ("M5", 3)]);
    }

    #[test]
    fn ties_by_roll_number() {
        let pop = [student(1, "Z9", 9.2), student(2, "M5", 8.7), student(3, "A1", 9.2)];
        let out = rank_population(&pop, TieBreak::RollNumber);
        assert_eq!(ranks(&out), vec![("A1", 1), ("Z9", 2), ("M5", 3)]);
    }

    #[test]
    fn empty_population() {
        assert!(rank_population(&[], TieBreak::InsertionOrder).is_empty());
    }

    #[test]
    fn ranks_are_contiguous_and_sgpa_non_increasing() {
        let pop: Vec<_> = [7.1, 9.9, 8.0, 8.0, 6.5, 9.9]
            .iter()
            .enumerate()
            .map(|(i, &g)| student(i as i64 + 1, &format!("R{i}"), g))
            .collect();
        let out = rank_population(&pop, TieBreak::InsertionOrder);
        let r: Vec<u32> = out.iter().map(|s| s.rank).collect();
        assert_eq!(r, (1..=6).collect::<Vec<u32>>());
        assert!(out.windows(2).all(|w| w[0].sgpa >= w[1].sgpa));
    }
}
