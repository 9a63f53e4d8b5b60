use crate::error::DataError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet, HashSet};

// Type aliases for clarity
pub type CourseId = String;
pub type FacultyId = String;
pub type Period = u32;

/// Largest accepted preference magnitude. Any happiness total stays exact in
/// an `i64` and in the solver's `f64` coefficients.
pub const MAX_SCORE: i64 = 1 << 31;

/// A course to be staffed, one per input row.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: CourseId,
    pub credits: u32,
    pub period: Period,
    pub min_groups: u32,
    pub max_groups: u32,
}

impl Course {
    /// A course taught as a single group.
    pub fn new(id: impl Into<CourseId>, credits: u32, period: Period) -> Self {
        Self::with_groups(id, credits, period, 1, 1)
    }

    pub fn with_groups(
        id: impl Into<CourseId>,
        credits: u32,
        period: Period,
        min_groups: u32,
        max_groups: u32,
    ) -> Self {
        Self {
            id: id.into(),
            credits,
            period,
            min_groups,
            max_groups,
        }
    }
}

/// A faculty member and their preference score for every course of the run.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Faculty {
    pub id: FacultyId,
    pub preferences: BTreeMap<CourseId, i64>,
}

impl Faculty {
    pub fn new<I, C>(id: impl Into<FacultyId>, preferences: I) -> Self
    where
        I: IntoIterator<Item = (C, i64)>,
        C: Into<CourseId>,
    {
        Self {
            id: id.into(),
            preferences: preferences
                .into_iter()
                .map(|(course, score)| (course.into(), score))
                .collect(),
        }
    }
}

/// One already-parsed row of the course sheet.
///
/// Scores are kept as raw cells so that a non-integer value can be reported
/// against the row and column it came from.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseRow {
    pub course: CourseId,
    pub credits: i64,
    pub period: i64,
    #[serde(default)]
    pub scores: BTreeMap<FacultyId, Value>,
    #[serde(default)]
    pub min_groups: Option<i64>,
    #[serde(default)]
    pub max_groups: Option<i64>,
}

/// The tabular input: the faculty columns and the course rows.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    pub faculty: Vec<FacultyId>,
    pub rows: Vec<CourseRow>,
}

impl Dataset {
    /// Validates every row and produces the typed instance. Row numbers in
    /// errors are 1-based.
    pub fn into_instance(self) -> Result<Instance, DataError> {
        check_faculty_ids(self.faculty.iter())?;
        let known: HashSet<&FacultyId> = self.faculty.iter().collect();

        let mut seen = HashSet::new();
        let mut courses = Vec::with_capacity(self.rows.len());
        let mut preferences: Vec<BTreeMap<CourseId, i64>> =
            vec![BTreeMap::new(); self.faculty.len()];

        for (i, row) in self.rows.iter().enumerate() {
            let row_no = i + 1;
            let course = parse_row(row_no, row, &mut seen)?;

            if let Some(unknown) = row.scores.keys().find(|f| !known.contains(f)) {
                return Err(DataError::UnknownFaculty {
                    row: row_no,
                    course: row.course.clone(),
                    faculty: unknown.clone(),
                });
            }

            for (f_idx, faculty) in self.faculty.iter().enumerate() {
                let cell = row
                    .scores
                    .get(faculty)
                    .ok_or_else(|| DataError::MissingPreference {
                        course: row.course.clone(),
                        faculty: faculty.clone(),
                    })?;
                let score = parse_score(cell).ok_or_else(|| DataError::NonIntegerScore {
                    row: row_no,
                    course: row.course.clone(),
                    faculty: faculty.clone(),
                    value: cell.to_string(),
                })?;
                preferences[f_idx].insert(row.course.clone(), score);
            }

            courses.push(course);
        }

        let faculty = self
            .faculty
            .into_iter()
            .zip(preferences)
            .map(|(id, preferences)| Faculty { id, preferences })
            .collect();

        Instance::new(courses, faculty)
    }
}

fn parse_row(
    row_no: usize,
    row: &CourseRow,
    seen: &mut HashSet<CourseId>,
) -> Result<Course, DataError> {
    if row.course.trim().is_empty() {
        return Err(DataError::EmptyIdentifier { row: row_no });
    }
    if !seen.insert(row.course.clone()) {
        return Err(DataError::DuplicateCourse {
            row: row_no,
            course: row.course.clone(),
        });
    }

    let credits = u32::try_from(row.credits)
        .ok()
        .filter(|c| *c >= 1)
        .ok_or_else(|| DataError::NonPositiveCredits {
            row: row_no,
            course: row.course.clone(),
            credits: row.credits,
        })?;

    let period = Period::try_from(row.period).map_err(|_| DataError::NegativePeriod {
        row: row_no,
        course: row.course.clone(),
        period: row.period,
    })?;

    let min = row.min_groups.unwrap_or(1);
    let max = row.max_groups.unwrap_or(1);
    let bounds = u32::try_from(min)
        .ok()
        .zip(u32::try_from(max).ok())
        .filter(|(lo, hi)| lo <= hi);
    let Some((min_groups, max_groups)) = bounds else {
        return Err(DataError::InvalidGroupBounds {
            row: row_no,
            course: row.course.clone(),
            min,
            max,
        });
    };

    Ok(Course::with_groups(
        row.course.clone(),
        credits,
        period,
        min_groups,
        max_groups,
    ))
}

/// Integers and integral floats (`10.0` from spreadsheet readers) are
/// accepted; anything else is not a score.
fn parse_score(cell: &Value) -> Option<i64> {
    match cell {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && f.fract() == 0.0)
                .filter(|f| *f >= i64::MIN as f64 && *f <= i64::MAX as f64)
                .map(|f| f as i64)
        }),
        _ => None,
    }
}

fn check_faculty_ids<'a>(ids: impl Iterator<Item = &'a FacultyId>) -> Result<(), DataError> {
    let mut seen = HashSet::new();
    for id in ids {
        if id.trim().is_empty() {
            return Err(DataError::EmptyFacultyIdentifier);
        }
        if !seen.insert(id) {
            return Err(DataError::DuplicateFaculty {
                faculty: id.clone(),
            });
        }
    }
    Ok(())
}

/// A validated set of courses and faculty. Everything downstream trusts it.
#[derive(Debug, Clone, PartialEq)]
pub struct Instance {
    courses: Vec<Course>,
    faculty: Vec<Faculty>,
    periods: BTreeSet<Period>,
    // scores[course][faculty]
    scores: Vec<Vec<i64>>,
}

impl Instance {
    pub fn new(courses: Vec<Course>, faculty: Vec<Faculty>) -> Result<Self, DataError> {
        check_faculty_ids(faculty.iter().map(|f| &f.id))?;

        let mut seen = HashSet::new();
        for (i, course) in courses.iter().enumerate() {
            let row = i + 1;
            if course.id.trim().is_empty() {
                return Err(DataError::EmptyIdentifier { row });
            }
            if !seen.insert(&course.id) {
                return Err(DataError::DuplicateCourse {
                    row,
                    course: course.id.clone(),
                });
            }
            if course.credits == 0 {
                return Err(DataError::NonPositiveCredits {
                    row,
                    course: course.id.clone(),
                    credits: 0,
                });
            }
            if course.min_groups > course.max_groups {
                return Err(DataError::InvalidGroupBounds {
                    row,
                    course: course.id.clone(),
                    min: i64::from(course.min_groups),
                    max: i64::from(course.max_groups),
                });
            }
        }

        let scores = courses
            .iter()
            .map(|course| {
                faculty
                    .iter()
                    .map(|member| {
                        let score = member.preferences.get(&course.id).copied().ok_or_else(|| {
                            DataError::MissingPreference {
                                course: course.id.clone(),
                                faculty: member.id.clone(),
                            }
                        })?;
                        if !(-MAX_SCORE..=MAX_SCORE).contains(&score) {
                            return Err(DataError::ScoreOutOfRange {
                                course: course.id.clone(),
                                faculty: member.id.clone(),
                                value: score,
                            });
                        }
                        Ok(score)
                    })
                    .collect::<Result<Vec<_>, _>>()
            })
            .collect::<Result<Vec<_>, _>>()?;

        let periods = courses.iter().map(|c| c.period).collect();

        Ok(Self {
            courses,
            faculty,
            periods,
            scores,
        })
    }

    pub fn courses(&self) -> &[Course] {
        &self.courses
    }

    pub fn faculty(&self) -> &[Faculty] {
        &self.faculty
    }

    /// Distinct period tags present among the courses, ascending.
    pub fn periods(&self) -> &BTreeSet<Period> {
        &self.periods
    }

    /// Preference of faculty `f` for course `c`, by position.
    pub fn score(&self, c: usize, f: usize) -> i64 {
        self.scores[c][f]
    }
}
