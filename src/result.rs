use crate::data::{CourseId, FacultyId, Instance, Period};
use crate::solver::{RawAssignment, SolverStatus};
use itertools::Itertools;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write;

/// One assigned (faculty, course) pair with what it contributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentDetail {
    pub faculty: FacultyId,
    pub course: CourseId,
    pub happiness: i64,
    pub credits: u32,
    pub period: Period,
}

/// The outcome of one solve or baseline run. Owned by the caller, never
/// shared between runs.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentResult {
    /// Assigned faculty per course, in faculty input order. Courses without
    /// any faculty are listed in `unassigned_courses` instead.
    pub course_assignments: BTreeMap<CourseId, Vec<FacultyId>>,
    pub faculty_credits: BTreeMap<FacultyId, i64>,
    pub faculty_period_credits: BTreeMap<FacultyId, BTreeMap<Period, i64>>,
    pub happiness_index: i64,
    /// In course input order.
    pub unassigned_courses: Vec<CourseId>,
    pub solver_status: SolverStatus,
    /// False for the Monte Carlo baseline: its assignment may break any
    /// workload or coverage constraint.
    pub feasibility_checked: bool,
    pub assignment_details: Vec<AssignmentDetail>,
    #[serde(skip)]
    course_order: Vec<CourseId>,
    #[serde(skip)]
    faculty_order: Vec<FacultyId>,
}

/// Courses by faculty, 1 where assigned. Rows and columns keep input order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssignmentMatrix {
    pub courses: Vec<CourseId>,
    pub faculty: Vec<FacultyId>,
    pub cells: Vec<Vec<u8>>,
}

impl AssignmentMatrix {
    pub fn get(&self, course: &str, faculty: &str) -> Option<u8> {
        let row = self.courses.iter().position(|c| c == course)?;
        let col = self.faculty.iter().position(|f| f == faculty)?;
        Some(self.cells[row][col])
    }
}

/// Walks `assignment` (absent when the solver found nothing) over `instance`.
pub fn aggregate(
    instance: &Instance,
    status: SolverStatus,
    assignment: Option<&RawAssignment>,
    feasibility_checked: bool,
) -> AssignmentResult {
    let courses = instance.courses();
    let faculty = instance.faculty();

    let mut faculty_credits: BTreeMap<FacultyId, i64> =
        faculty.iter().map(|f| (f.id.clone(), 0)).collect();
    let mut faculty_period_credits: BTreeMap<FacultyId, BTreeMap<Period, i64>> = faculty
        .iter()
        .map(|f| {
            let periods = instance.periods().iter().map(|p| (*p, 0)).collect();
            (f.id.clone(), periods)
        })
        .collect();
    let mut course_assignments: BTreeMap<CourseId, Vec<FacultyId>> = BTreeMap::new();
    let mut assignment_details = Vec::new();
    let mut happiness_index = 0;

    for decision in assignment.into_iter().flat_map(|a| a.iter()) {
        let course = &courses[decision.course];
        let member = &faculty[decision.faculty];
        let happiness = instance.score(decision.course, decision.faculty);
        let credits = i64::from(course.credits);

        happiness_index += happiness;
        *faculty_credits.entry(member.id.clone()).or_default() += credits;
        *faculty_period_credits
            .entry(member.id.clone())
            .or_default()
            .entry(course.period)
            .or_default() += credits;
        course_assignments
            .entry(course.id.clone())
            .or_default()
            .push(member.id.clone());
        assignment_details.push(AssignmentDetail {
            faculty: member.id.clone(),
            course: course.id.clone(),
            happiness,
            credits: course.credits,
            period: course.period,
        });
    }

    let unassigned_courses = courses
        .iter()
        .filter(|c| !course_assignments.contains_key(&c.id))
        .map(|c| c.id.clone())
        .collect();

    AssignmentResult {
        course_assignments,
        faculty_credits,
        faculty_period_credits,
        happiness_index,
        unassigned_courses,
        solver_status: status,
        feasibility_checked,
        assignment_details,
        course_order: courses.iter().map(|c| c.id.clone()).collect(),
        faculty_order: faculty.iter().map(|f| f.id.clone()).collect(),
    }
}

impl AssignmentResult {
    pub fn is_optimal(&self) -> bool {
        self.solver_status.is_optimal()
    }

    /// The single faculty member of a course, or the first one when several
    /// groups were assigned.
    pub fn faculty_for(&self, course: &str) -> Option<&FacultyId> {
        self.course_assignments.get(course).and_then(|f| f.first())
    }

    pub fn courses_by_faculty(&self) -> BTreeMap<&FacultyId, Vec<&CourseId>> {
        self.assignment_details
            .iter()
            .map(|d| (&d.faculty, &d.course))
            .into_group_map()
            .into_iter()
            .collect()
    }

    pub fn matrix(&self) -> AssignmentMatrix {
        let cells = self
            .course_order
            .iter()
            .map(|course| {
                let assigned = self.course_assignments.get(course);
                self.faculty_order
                    .iter()
                    .map(|f| u8::from(assigned.is_some_and(|a| a.contains(f))))
                    .collect()
            })
            .collect();
        AssignmentMatrix {
            courses: self.course_order.clone(),
            faculty: self.faculty_order.clone(),
            cells,
        }
    }

    /// Line-oriented plain-text digest with sorted keys and integer values
    /// only, stable across runs and platforms.
    pub fn summary(&self) -> String {
        let mut out = String::new();
        // writing to a String cannot fail
        let _ = writeln!(out, "status {}", self.solver_status);
        let _ = writeln!(out, "feasibility_checked {}", self.feasibility_checked);
        let _ = writeln!(out, "happiness {}", self.happiness_index);
        for (course, faculty) in &self.course_assignments {
            let _ = writeln!(out, "assign {} {}", course, faculty.iter().join(","));
        }
        for (faculty, credits) in &self.faculty_credits {
            let _ = writeln!(out, "credits {} {}", faculty, credits);
        }
        for (faculty, periods) in &self.faculty_period_credits {
            for (period, credits) in periods {
                let _ = writeln!(out, "period_credits {} {} {}", faculty, period, credits);
            }
        }
        let _ = writeln!(out, "unassigned {}", self.unassigned_courses.iter().join(","));
        out
    }
}
