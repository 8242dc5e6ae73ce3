use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{GpaError, Result};

/// Letter grades accepted by the calculator
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq, Hash)]
pub enum Grade {
    A,
    B,
    C,
    D,
    E,
    F,
}

impl Grade {
    /// Grade points on the five-point scale.
    pub fn points(self) -> u32 {
        match self {
            Grade::A => 5,
            Grade::B => 4,
            Grade::C => 3,
            Grade::D => 2,
            Grade::E => 1,
            Grade::F => 0,
        }
    }

    pub fn from_strng(token: &str) -> Option<Self> {
        match token.trim().to_uppercase().as_str() {
            "A" => Some(Grade::A),
            "B" => Some(Grade::B),
            "C" => Some(Grade::C),
            "D" => Some(Grade::D),
            "E" => Some(Grade::E),
            "F" => Some(Grade::F),
            _ => None,
        }
    }

    /// Parses a submitted grade token.
    ///
    /// A blank token means the course was left ungraded. Anything else that is
    /// not a letter grade is rejected rather than silently ignored.
    pub fn parse(token: &str) -> Result<Option<Self>> {
        if token.trim().is_empty() {
            return Ok(None);
        }
        Self::from_strng(token)
            .map(Some)
            .ok_or_else(|| GpaError::Validation(format!("unknown grade '{}'", token.trim())))
    }

    pub fn is_fail(self) -> bool {
        matches!(self, Grade::F)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
            Grade::E => "E",
            Grade::F => "F",
        }
    }
}

/// One course's grade within a semester.
///
/// `course_unit` is a snapshot taken from the catalog when the grade was entered.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct GradeEntry {
    pub course_code: String,
    pub grade: Option<Grade>,
    pub course_unit: u32,
}

impl GradeEntry {
    pub fn is_fail(&self) -> bool {
        self.grade.is_some_and(Grade::is_fail)
    }
}

/// Output of [`compute_results`]
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Default)]
pub struct GpaResult {
    pub semester_gpas: BTreeMap<String, f64>,
    pub cumulative_gpa: f64,
    pub total_units_taken: u32,
    pub total_credit_points: u32,
    pub total_courses: usize,
}

impl GpaResult {
    pub fn semester_gpa(&self, session_key: &str) -> f64 {
        self.semester_gpas.get(session_key).copied().unwrap_or(0.0)
    }
}

/// Divides credit points by units and rounds half up to two decimals.
///
/// Works on the integer totals directly so ties like 0.125 always go up.
/// Zero units yields 0.
pub fn round_gpa(credit_points: u32, units: u32) -> f64 {
    if units == 0 {
        return 0.0;
    }
    let points = u64::from(credit_points);
    let units = u64::from(units);
    let hundredths = (points * 200 + units) / (units * 2);
    hundredths as f64 / 100.0
}

/// Computes every semester GPA and the cumulative GPA.
///
/// Ungraded entries are skipped for points and units but still counted in
/// `total_courses`.
pub fn compute_results<'a, I, E>(semesters: I) -> GpaResult
where
    I: IntoIterator<Item = (&'a String, &'a E)>,
    E: AsRef<[GradeEntry]> + 'a + ?Sized,
{
    let mut result = GpaResult::default();

    for (session_key, entries) in semesters {
        let entries = entries.as_ref();
        let mut semester_tcp = 0;
        let mut semester_tnu = 0;
        result.total_courses += entries.len();

        for entry in entries {
            if let Some(grade) = entry.grade {
                semester_tcp += grade.points() * entry.course_unit;
                semester_tnu += entry.course_unit;
            }
        }

        result
            .semester_gpas
            .insert(session_key.clone(), round_gpa(semester_tcp, semester_tnu));
        result.total_credit_points += semester_tcp;
        result.total_units_taken += semester_tnu;
    }

    result.cumulative_gpa = round_gpa(result.total_credit_points, result.total_units_taken);
    result
}
