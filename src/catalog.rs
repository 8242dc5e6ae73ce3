use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::Path;

use crate::error::{GpaError, Result};

/// Course table shipped with the calculator
const BUNDLED_COURSES: &str = include_str!("../data/courses.json");

/// Largest unit weight a catalog entry may carry
pub const MAX_COURSE_UNIT: u32 = 30;

/// Reference data for a single course
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct Course {
    pub code: String,
    pub title: String,
    pub unit: u32,
    pub part: String,
    pub semester: String,
}

/// Read access to the course catalog.
///
/// Implementations must be keyed uniquely by course code.
pub trait CourseLookup {
    fn by_code(&self, code: &str) -> Option<&Course>;

    /// Courses offered in a part/semester, in catalog order.
    fn by_part_semester(&self, part: &str, semester: &str) -> Vec<&Course>;
}

/// In-memory catalog
#[derive(Clone, Debug, Default)]
pub struct Catalog {
    courses: Vec<Course>,
    index: HashMap<String, usize>,
}

impl Catalog {
    pub fn new(courses: Vec<Course>) -> Result<Self> {
        let mut index = HashMap::with_capacity(courses.len());
        for (i, course) in courses.iter().enumerate() {
            if course.unit == 0 || course.unit > MAX_COURSE_UNIT {
                return Err(GpaError::Catalog(format!(
                    "course {} has unit weight {}, expected 1..={}",
                    course.code, course.unit, MAX_COURSE_UNIT
                )));
            }
            if index.insert(course.code.clone(), i).is_some() {
                return Err(GpaError::Catalog(format!(
                    "duplicate course code {}",
                    course.code
                )));
            }
        }
        Ok(Catalog { courses, index })
    }

    /// The course table bundled with the binary.
    pub fn bundled() -> Result<Self> {
        Self::from_json(BUNDLED_COURSES)
    }

    pub fn from_json(data: &str) -> Result<Self> {
        let courses: Vec<Course> =
            serde_json::from_str(data).map_err(|e| GpaError::Catalog(e.to_string()))?;
        Self::new(courses)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path).map_err(|e| {
            GpaError::Catalog(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_json(&data)
    }

    pub fn len(&self) -> usize {
        self.courses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.courses.is_empty()
    }

    /// Distinct (part, semester) pairs ordered by part, then semester.
    ///
    /// Parts compare numerically where they parse, so "10" sorts after "9".
    pub fn semester_parts(&self) -> Vec<(String, String)> {
        let pairs: BTreeSet<(u32, String, String)> = self
            .courses
            .iter()
            .map(|c| {
                (
                    c.part.parse().unwrap_or(u32::MAX),
                    c.part.clone(),
                    c.semester.clone(),
                )
            })
            .collect();
        pairs.into_iter().map(|(_, part, sem)| (part, sem)).collect()
    }
}

impl CourseLookup for Catalog {
    fn by_code(&self, code: &str) -> Option<&Course> {
        self.index.get(code).map(|&i| &self.courses[i])
    }

    fn by_part_semester(&self, part: &str, semester: &str) -> Vec<&Course> {
        self.courses
            .iter()
            .filter(|c| c.part == part && c.semester == semester)
            .collect()
    }
}
