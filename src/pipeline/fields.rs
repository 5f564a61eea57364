//! Field extraction: pull the student summary fields out of page text.
//!
//! Each field is anchored to its printed label and captures the value that
//! follows on the same line. The gate is all-or-nothing: a page that lacks
//! any one field, or whose semester / SGPA does not parse, is not a
//! student-data page.
//!
//! Value patterns end on a word boundary so that a label printed on the
//! same line (`Name JOHN DOE Father's Name …`) is not swallowed into the
//! preceding value.

use crate::error::{FieldError, StudentField};
use once_cell::sync::Lazy;
use regex::Regex;

/// The six scalar fields of one summary block.
#[derive(Debug, Clone, PartialEq)]
pub struct StudentFields {
    pub roll_no: String,
    pub name: String,
    pub father_name: String,
    pub branch: String,
    pub semester: u32,
    pub sgpa: f64,
}

static RE_ROLL_NO: Lazy<Regex> = Lazy::new(|| Regex::new(r"Roll No\.?\s*:?\s*(\d+)").unwrap());

static RE_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bName\s*:?[ \t]*([A-Z][A-Z \t.]*)\b").unwrap());

static RE_FATHER_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Father'?s Name\s*:?[ \t]*([A-Z][A-Z \t.]*)\b").unwrap());

static RE_BRANCH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Branch\s*:?[ \t]*([A-Z&][A-Z& \t]*)\b").unwrap());

static RE_SEMESTER: Lazy<Regex> = Lazy::new(|| Regex::new(r"Semester\s*:?\s*(\d+)").unwrap());

static RE_SGPA: Lazy<Regex> = Lazy::new(|| Regex::new(r"SGPA\s*:?\s*([\d.]+)").unwrap());

/// Words that turn a following `Name` label into a different field.
const NAME_QUALIFIERS: &[&str] = &["Father's", "Fathers", "Mother's", "Subject"];

/// Extract the summary fields from one block of page text.
///
/// Fields are checked in label order (roll number, name, father's name,
/// branch, semester, SGPA); the first failure is reported.
pub fn extract_fields(text: &str) -> Result<StudentFields, FieldError> {
    let roll_no = capture(&RE_ROLL_NO, text, StudentField::RollNo)?;
    let name = capture_student_name(text)?;
    let father_name = capture(&RE_FATHER_NAME, text, StudentField::FatherName)?;
    let branch = capture(&RE_BRANCH, text, StudentField::Branch)?;

    let semester_raw = capture(&RE_SEMESTER, text, StudentField::Semester)?;
    let semester = match semester_raw.parse::<u32>() {
        Ok(n) if n > 0 => n,
        _ => {
            return Err(FieldError::Unparseable {
                field: StudentField::Semester,
                value: semester_raw,
            })
        }
    };

    let sgpa_raw = capture(&RE_SGPA, text, StudentField::Sgpa)?;
    let sgpa = match sgpa_raw.parse::<f64>() {
        Ok(v) if v.is_finite() => v,
        _ => {
            return Err(FieldError::Unparseable {
                field: StudentField::Sgpa,
                value: sgpa_raw,
            })
        }
    };

    Ok(StudentFields {
        roll_no,
        name,
        father_name,
        branch,
        semester,
        sgpa,
    })
}

/// Byte offsets where each roll-number label starts, in text order.
///
/// Used to split a page holding several summary blocks.
pub fn roll_no_offsets(text: &str) -> Vec<usize> {
    RE_ROLL_NO.find_iter(text).map(|m| m.start()).collect()
}

fn capture(re: &Regex, text: &str, field: StudentField) -> Result<String, FieldError> {
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or(FieldError::Missing(field))
}

/// `Name` also appears inside `Father's Name` and the `Subject Name` table
/// header; only an unqualified label counts.
fn capture_student_name(text: &str) -> Result<String, FieldError> {
    RE_NAME
        .captures_iter(text)
        .filter(|caps| {
            let start = caps.get(0).map_or(0, |m| m.start());
            let before = text[..start].trim_end();
            !NAME_QUALIFIERS.iter().any(|q| before.ends_with(q))
        })
        .filter_map(|caps| caps.get(1).map(|m| m.as_str().trim().to_string()))
        .find(|v| !v.is_empty())
        .ok_or(FieldError::Missing(StudentField::Name))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SUMMARY: &str = "UNIVERSITY RESULT SHEET\n\
        Roll No. 2101234\n\
        Name RAVI KUMAR\n\
        Father's Name SURESH KUMAR\n\
        Branch COMPUTER SCIENCE & ENGINEERING\n\
        Semester 5\n\
        Subject Code Subject Name Credits Grade Grade Point Credit Points\n\
        SGPA: 8.75\n";

    #[test]
    fn extracts_all_fields() {
        let f = extract_fields(SUMMARY).unwrap();
        assert_eq!(f.roll_no, "2101234");
        assert_eq!(f.name, "RAVI KUMAR");
        assert_eq!(f.father_name, "SURESH KUMAR");
        assert_eq!(f.branch, "COMPUTER SCIENCE & ENGINEERING");
        assert_eq!(f.semester, 5);
        assert!((f.sgpa - 8.75).abs() < 1e-9);
    }

    #[test]
    fn labels_on_one_line_are_not_swallowed() {
        let text = "Roll No. 77 Name ANITA SHARMA Father's Name VIJAY SHARMA\n\
                    Branch CSE Semester 3 SGPA: 9.1";
        let f = extract_fields(text).unwrap();
        assert_eq!(f.name, "ANITA SHARMA");
        assert_eq!(f.father_name, "VIJAY SHARMA");
        assert_eq!(f.branch, "CSE");
        assert_eq!(f.semester, 3);
    }

    #[test]
    fn fathers_name_listed_first_is_not_taken_as_name() {
        let text = "Roll No. 12\nFather's Name MOHAN LAL\nName GEETA\n\
                    Branch ECE\nSemester 1\nSGPA: 7.0";
        let f = extract_fields(text).unwrap();
        assert_eq!(f.name, "GEETA");
        assert_eq!(f.father_name, "MOHAN LAL");
    }

    #[test]
    fn each_missing_field_fails_the_page() {
        let cases = [
            ("Roll No. 2101234\n", StudentField::RollNo),
            ("Name RAVI KUMAR\n", StudentField::Name),
            ("Father's Name SURESH KUMAR\n", StudentField::FatherName),
            ("Branch COMPUTER SCIENCE & ENGINEERING\n", StudentField::Branch),
            ("Semester 5\n", StudentField::Semester),
            ("SGPA: 8.75\n", StudentField::Sgpa),
        ];
        for (line, field) in cases {
            let text = SUMMARY.replace(line, "");
            assert_eq!(
                extract_fields(&text),
                Err(FieldError::Missing(field)),
                "removing {line:?}"
            );
        }
    }

    #[test]
    fn lowercase_name_is_missing() {
        let text = SUMMARY.replace("Name RAVI KUMAR", "Name ravi kumar");
        assert_eq!(
            extract_fields(&text),
            Err(FieldError::Missing(StudentField::Name))
        );
    }

    #[test]
    fn malformed_sgpa_is_a_coercion_failure() {
        let text = SUMMARY.replace("SGPA: 8.75", "SGPA: 8.7.5");
        assert_eq!(
            extract_fields(&text),
            Err(FieldError::Unparseable {
                field: StudentField::Sgpa,
                value: "8.7.5".into()
            })
        );
    }

    #[test]
    fn semester_zero_is_rejected() {
        let text = SUMMARY.replace("Semester 5", "Semester 0");
        assert!(matches!(
            extract_fields(&text),
            Err(FieldError::Unparseable {
                field: StudentField::Semester,
                ..
            })
        ));
    }

    #[test]
    fn roll_no_offsets_in_order() {
        let text = "Roll No. 1 Name A\nRoll No. 2 Name B";
        let offsets = roll_no_offsets(text);
        assert_eq!(offsets.len(), 2);
        assert_eq!(offsets[0], 0);
        assert!(text[offsets[1]..].starts_with("Roll No. 2"));
    }
}
