use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::catalog::{Course, CourseLookup};
use crate::error::{GpaError, Result};
use crate::grades::{Grade, GradeEntry, GpaResult, compute_results};

lazy_static! {
    static ref PART_REGEX: Regex = Regex::new(r"^[0-9]+$").unwrap();
    static ref SEMESTER_REGEX: Regex = Regex::new(r"^[A-Za-z]+$").unwrap();
}

/// Builds the key identifying a part/semester within a session.
pub fn session_key(part: &str, semester: &str) -> String {
    format!("{}-{}", part, semester)
}

/// Checks that a part is a numeric ordinal and a semester is a plain label.
pub fn validate_part_semester(part: &str, semester: &str) -> Result<()> {
    if part.is_empty() || semester.is_empty() {
        return Err(GpaError::Validation(
            "part and semester are required".to_string(),
        ));
    }
    if !PART_REGEX.is_match(part) || !SEMESTER_REGEX.is_match(semester) {
        return Err(GpaError::Validation(
            "Invalid part or semester format".to_string(),
        ));
    }
    Ok(())
}

/// Raw grade as submitted by a client, before validation
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct GradeSubmission {
    pub course_code: String,
    #[serde(default)]
    pub grade: Option<String>,
}

/// Grades recorded for one part/semester
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct SemesterRecord {
    pub session_key: String,
    pub part: String,
    pub semester: String,
    pub courses: Vec<GradeEntry>,
}

/// A failed course that has not been passed since.
///
/// `part` and `semester` are where the failure happened.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct CarryOverCourse {
    pub course_code: String,
    pub course_title: String,
    pub course_unit: u32,
    pub part: String,
    pub semester: String,
}

impl CarryOverCourse {
    fn from_course(course: &Course, part: &str, semester: &str) -> Self {
        CarryOverCourse {
            course_code: course.code.clone(),
            course_title: course.title.clone(),
            course_unit: course.unit,
            part: part.to_string(),
            semester: semester.to_string(),
        }
    }
}

/// A course row as shown for a part/semester
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct ListedCourse {
    pub course_code: String,
    pub course_title: String,
    pub course_unit: u32,
    pub grade: Option<Grade>,
    pub is_carry_over: bool,
}

/// Per-semester GPA line of the running summary
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct SemesterSummary {
    pub part: String,
    pub semester: String,
    pub gpa: f64,
}

/// In-progress calculation for one anonymous user session
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Default)]
pub struct SessionState {
    semesters: Vec<SemesterRecord>,
    carry_overs: Vec<CarryOverCourse>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a session from previously saved semesters.
    ///
    /// Semesters are replayed in order, so a failure that was passed later
    /// does not come back as a carry-over. Failed codes missing from the
    /// catalog are skipped.
    pub fn restore<L: CourseLookup + ?Sized>(semesters: Vec<SemesterRecord>, catalog: &L) -> Self {
        let mut state = SessionState {
            semesters: Vec::new(),
            carry_overs: Vec::new(),
        };
        for record in &semesters {
            for entry in &record.courses {
                if entry.is_fail() {
                    if let Some(course) = catalog.by_code(&entry.course_code) {
                        state.add_carry_over(CarryOverCourse::from_course(
                            course,
                            &record.part,
                            &record.semester,
                        ));
                    }
                } else {
                    state.clear_carry_over(&entry.course_code);
                }
            }
        }
        state.semesters = semesters;
        state
    }

    pub fn semesters(&self) -> &[SemesterRecord] {
        &self.semesters
    }

    pub fn carry_overs(&self) -> &[CarryOverCourse] {
        &self.carry_overs
    }

    pub fn is_empty(&self) -> bool {
        self.semesters.is_empty()
    }

    pub fn semester(&self, key: &str) -> Option<&SemesterRecord> {
        self.semesters.iter().find(|s| s.session_key == key)
    }

    pub fn reset(&mut self) {
        self.semesters.clear();
        self.carry_overs.clear();
    }

    /// Recomputes GPAs over every recorded semester.
    pub fn results(&self) -> GpaResult {
        compute_results(self.semesters.iter().map(|s| (&s.session_key, &s.courses)))
    }

    /// Per-semester GPAs in display order.
    pub fn summary(&self, results: &GpaResult) -> Vec<SemesterSummary> {
        self.semesters
            .iter()
            .map(|s| SemesterSummary {
                part: s.part.clone(),
                semester: s.semester.clone(),
                gpa: results.semester_gpa(&s.session_key),
            })
            .collect()
    }

    fn add_carry_over(&mut self, course: CarryOverCourse) {
        if !self
            .carry_overs
            .iter()
            .any(|c| c.course_code == course.course_code)
        {
            self.carry_overs.push(course);
        }
    }

    fn clear_carry_over(&mut self, code: &str) {
        self.carry_overs.retain(|c| c.course_code != code);
    }

    fn put_semester(&mut self, record: SemesterRecord) {
        match self
            .semesters
            .iter_mut()
            .find(|s| s.session_key == record.session_key)
        {
            Some(existing) => *existing = record,
            None => self.semesters.push(record),
        }
    }
}

/// Records the grades for a part/semester and updates the carry-over set.
///
/// All input is validated against the catalog before the state is touched:
/// on `Err` the session is unchanged. A semester submitted again replaces the
/// earlier one. Failed courses join the carry-over set once; any other grade
/// for a carried course clears it.
pub fn record_semester<L: CourseLookup + ?Sized>(
    state: &mut SessionState,
    part: &str,
    semester: &str,
    submissions: &[GradeSubmission],
    catalog: &L,
) -> Result<GpaResult> {
    let part = part.trim();
    let semester = semester.trim();
    validate_part_semester(part, semester)?;
    if submissions.is_empty() {
        return Err(GpaError::Validation(
            "at least one grade is required".to_string(),
        ));
    }

    let mut seen = HashSet::with_capacity(submissions.len());
    let mut validated: Vec<(&Course, Option<Grade>)> = Vec::with_capacity(submissions.len());
    for submission in submissions {
        let code = submission.course_code.trim();
        if code.is_empty() {
            return Err(GpaError::Validation("missing course code".to_string()));
        }
        if !seen.insert(code) {
            return Err(GpaError::Validation(format!(
                "course {} submitted more than once",
                code
            )));
        }
        let grade = Grade::parse(submission.grade.as_deref().unwrap_or(""))?;
        let course = catalog
            .by_code(code)
            .ok_or_else(|| GpaError::CourseNotFound(code.to_string()))?;
        validated.push((course, grade));
    }

    for (course, grade) in &validated {
        match grade {
            Some(Grade::F) => {
                state.add_carry_over(CarryOverCourse::from_course(course, part, semester))
            }
            _ => state.clear_carry_over(&course.code),
        }
    }

    let courses = validated
        .into_iter()
        .map(|(course, grade)| GradeEntry {
            course_code: course.code.clone(),
            grade,
            course_unit: course.unit,
        })
        .collect();
    state.put_semester(SemesterRecord {
        session_key: session_key(part, semester),
        part: part.to_string(),
        semester: semester.to_string(),
        courses,
    });

    log::debug!(
        "recorded {}-{}; {} carry-over(s) outstanding",
        part,
        semester,
        state.carry_overs.len()
    );

    Ok(state.results())
}

/// Carry-overs that belong in a part/semester listing.
///
/// Only courses failed in an earlier part under the same semester label
/// qualify. A part that is not numeric matches nothing.
pub fn eligible_carry_overs<'a>(
    state: &'a SessionState,
    part: &str,
    semester: &str,
) -> Vec<&'a CarryOverCourse> {
    let Ok(part) = part.trim().parse::<u32>() else {
        return Vec::new();
    };
    state
        .carry_overs
        .iter()
        .filter(|co| co.semester == semester)
        .filter(|co| co.part.parse::<u32>().is_ok_and(|failed_in| failed_in < part))
        .collect()
}

/// Courses to offer for a part/semester.
///
/// Catalog courses come first with any grade already recorded for that
/// semester filled in, followed by eligible carry-overs not already listed.
pub fn course_listing<L: CourseLookup + ?Sized>(
    state: &SessionState,
    catalog: &L,
    part: &str,
    semester: &str,
) -> Result<Vec<ListedCourse>> {
    validate_part_semester(part, semester)?;

    let saved = state.semester(&session_key(part, semester));
    let saved_grade = |code: &str| -> Option<Grade> {
        saved
            .and_then(|s| s.courses.iter().find(|e| e.course_code == code))
            .and_then(|e| e.grade)
    };

    let mut listing: Vec<ListedCourse> = catalog
        .by_part_semester(part, semester)
        .into_iter()
        .map(|c| ListedCourse {
            course_code: c.code.clone(),
            course_title: c.title.clone(),
            course_unit: c.unit,
            grade: saved_grade(&c.code),
            is_carry_over: false,
        })
        .collect();

    for co in eligible_carry_overs(state, part, semester) {
        if listing.iter().any(|c| c.course_code == co.course_code) {
            continue;
        }
        listing.push(ListedCourse {
            course_code: co.course_code.clone(),
            course_title: co.course_title.clone(),
            course_unit: co.course_unit,
            grade: saved_grade(&co.course_code),
            is_carry_over: true,
        });
    }

    Ok(listing)
}

/// Final results for a session about to be saved.
pub fn finalize(state: &SessionState) -> Result<GpaResult> {
    if state.is_empty() {
        return Err(GpaError::EmptyState);
    }
    Ok(state.results())
}
