//! The 0/1 integer program behind an allocation.
//!
//! The model is a plain value: one binary variable per (course, faculty) pair,
//! integer objective coefficients and labelled integer constraints. Building
//! it never touches a solver, so the same instance and configuration always
//! yield the same model.

use crate::config::{AllocationConfig, CoveragePolicy};
use crate::data::{Instance, Period};
use log::{debug, info};

/// Position of a decision variable `x[c, f]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Decision {
    pub course: usize,
    pub faculty: usize,
}

/// What a constraint row stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstraintKind {
    Coverage { course: usize },
    MinimumLoad { faculty: usize },
    PeriodCap { faculty: usize, period: Period },
    AnnualBand { faculty: usize },
}

/// `lower <= sum(coef * x[var]) <= upper`, either bound optional.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinearConstraint {
    pub kind: ConstraintKind,
    pub terms: Vec<(usize, i64)>,
    pub lower: Option<i64>,
    pub upper: Option<i64>,
}

impl LinearConstraint {
    fn admits(&self, value: i64) -> bool {
        self.lower.is_none_or(|lo| value >= lo) && self.upper.is_none_or(|hi| value <= hi)
    }

    /// Left-hand side under a full 0/1 assignment indexed by variable.
    pub fn evaluate(&self, selected: &[bool]) -> i64 {
        self.terms
            .iter()
            .filter(|(var, _)| selected[*var])
            .map(|(_, coef)| coef)
            .sum()
    }

    pub fn is_satisfied_by(&self, selected: &[bool]) -> bool {
        self.admits(self.evaluate(selected))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllocationModel {
    courses: usize,
    faculty: usize,
    objective: Vec<i64>,
    constraints: Vec<LinearConstraint>,
}

impl AllocationModel {
    /// Builds the maximisation model for `instance`. `config` is expected to
    /// have passed [`AllocationConfig::validate`].
    pub fn build(instance: &Instance, config: &AllocationConfig) -> Self {
        let n_courses = instance.courses().len();
        let n_faculty = instance.faculty().len();
        info!(
            "Building allocation model with {} courses, {} faculty and {} periods...",
            n_courses,
            n_faculty,
            instance.periods().len()
        );

        // variables laid out course-major; must exist before any row refers to them
        let objective: Vec<i64> = (0..n_courses)
            .flat_map(|c| (0..n_faculty).map(move |f| (c, f)))
            .map(|(c, f)| instance.score(c, f))
            .collect();

        let mut model = Self {
            courses: n_courses,
            faculty: n_faculty,
            objective,
            constraints: Vec::new(),
        };

        model.add_coverage(instance, config.coverage_policy);
        if config.require_min_faculty_load {
            model.add_minimum_load();
        }
        model.add_period_caps(instance, config.trimester_limit);
        model.add_annual_band(instance, config.annual_min, config.annual_max);

        debug!(
            "Model has {} binary variables and {} constraints.",
            model.num_variables(),
            model.constraints.len()
        );
        model
    }

    fn add_coverage(&mut self, instance: &Instance, policy: CoveragePolicy) {
        for (c, course) in instance.courses().iter().enumerate() {
            let (lower, upper) = match policy {
                CoveragePolicy::ExactlyOne => (1, 1),
                CoveragePolicy::BoundedGroups => {
                    (i64::from(course.min_groups), i64::from(course.max_groups))
                }
            };
            let terms = (0..self.faculty).map(|f| (self.variable(c, f), 1)).collect();
            self.constraints.push(LinearConstraint {
                kind: ConstraintKind::Coverage { course: c },
                terms,
                lower: Some(lower),
                upper: Some(upper),
            });
        }
    }

    fn add_minimum_load(&mut self) {
        for f in 0..self.faculty {
            let terms = (0..self.courses).map(|c| (self.variable(c, f), 1)).collect();
            self.constraints.push(LinearConstraint {
                kind: ConstraintKind::MinimumLoad { faculty: f },
                terms,
                lower: Some(1),
                upper: None,
            });
        }
    }

    fn add_period_caps(&mut self, instance: &Instance, limit: i64) {
        for f in 0..self.faculty {
            for &period in instance.periods() {
                let terms = instance
                    .courses()
                    .iter()
                    .enumerate()
                    .filter(|(_, course)| course.period == period)
                    .map(|(c, course)| (self.variable(c, f), i64::from(course.credits)))
                    .collect();
                self.constraints.push(LinearConstraint {
                    kind: ConstraintKind::PeriodCap { faculty: f, period },
                    terms,
                    lower: None,
                    upper: Some(limit),
                });
            }
        }
    }

    fn add_annual_band(&mut self, instance: &Instance, min: i64, max: i64) {
        for f in 0..self.faculty {
            let terms = instance
                .courses()
                .iter()
                .enumerate()
                .map(|(c, course)| (self.variable(c, f), i64::from(course.credits)))
                .collect();
            self.constraints.push(LinearConstraint {
                kind: ConstraintKind::AnnualBand { faculty: f },
                terms,
                lower: Some(min),
                upper: Some(max),
            });
        }
    }

    pub fn variable(&self, course: usize, faculty: usize) -> usize {
        course * self.faculty + faculty
    }

    pub fn decision(&self, var: usize) -> Decision {
        Decision {
            course: var / self.faculty,
            faculty: var % self.faculty,
        }
    }

    pub fn num_variables(&self) -> usize {
        self.objective.len()
    }

    pub fn objective(&self) -> &[i64] {
        &self.objective
    }

    pub fn constraints(&self) -> &[LinearConstraint] {
        &self.constraints
    }

    /// A row without variables is the constant 0; if its bounds exclude 0 no
    /// assignment can satisfy the model.
    pub fn trivially_infeasible(&self) -> Option<&LinearConstraint> {
        self.constraints
            .iter()
            .find(|row| row.terms.is_empty() && !row.admits(0))
    }

    pub fn objective_value(&self, selected: &[bool]) -> i64 {
        self.objective
            .iter()
            .zip(selected)
            .filter(|(_, on)| **on)
            .map(|(coef, _)| coef)
            .sum()
    }

    pub fn is_satisfied_by(&self, selected: &[bool]) -> bool {
        self.constraints.iter().all(|row| row.is_satisfied_by(selected))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Course, Faculty};

    fn instance() -> Instance {
        let courses = vec![
            Course::new("A", 3, 1),
            Course::new("B", 3, 1),
            Course::with_groups("C", 4, 2, 0, 2),
        ];
        let faculty = vec![
            Faculty::new("F1", [("A", 10), ("B", 1), ("C", 5)]),
            Faculty::new("F2", [("A", 1), ("B", 10), ("C", 5)]),
        ];
        Instance::new(courses, faculty).unwrap()
    }

    fn count(model: &AllocationModel, pred: impl Fn(&ConstraintKind) -> bool) -> usize {
        model.constraints().iter().filter(|c| pred(&c.kind)).count()
    }

    #[test]
    fn variable_space_is_course_major() {
        let model = AllocationModel::build(&instance(), &AllocationConfig::default());
        assert_eq!(model.num_variables(), 6);
        assert_eq!(model.variable(2, 1), 5);
        assert_eq!(model.decision(3), Decision { course: 1, faculty: 1 });
        assert_eq!(model.objective(), &[10, 1, 1, 10, 5, 5]);
    }

    #[test]
    fn constraint_rows_per_family() {
        let config = AllocationConfig::new(6, 3, 10);
        let model = AllocationModel::build(&instance(), &config);
        assert_eq!(count(&model, |k| matches!(k, ConstraintKind::Coverage { .. })), 3);
        assert_eq!(count(&model, |k| matches!(k, ConstraintKind::MinimumLoad { .. })), 2);
        // two faculty times two distinct period tags
        assert_eq!(count(&model, |k| matches!(k, ConstraintKind::PeriodCap { .. })), 4);
        assert_eq!(count(&model, |k| matches!(k, ConstraintKind::AnnualBand { .. })), 2);

        let without_load = AllocationModel::build(&instance(), &config.with_min_faculty_load(false));
        assert_eq!(
            count(&without_load, |k| matches!(k, ConstraintKind::MinimumLoad { .. })),
            0
        );
    }

    #[test]
    fn coverage_bounds_follow_policy() {
        let bounded = AllocationModel::build(&instance(), &AllocationConfig::default());
        let row = &bounded.constraints()[2];
        assert_eq!(row.kind, ConstraintKind::Coverage { course: 2 });
        assert_eq!((row.lower, row.upper), (Some(0), Some(2)));

        let exact = AllocationModel::build(
            &instance(),
            &AllocationConfig::default().with_coverage(CoveragePolicy::ExactlyOne),
        );
        let row = &exact.constraints()[2];
        assert_eq!((row.lower, row.upper), (Some(1), Some(1)));
    }

    #[test]
    fn period_cap_groups_by_tag() {
        let model = AllocationModel::build(&instance(), &AllocationConfig::new(6, 0, 10));
        let cap = model
            .constraints()
            .iter()
            .find(|c| c.kind == ConstraintKind::PeriodCap { faculty: 1, period: 1 })
            .unwrap();
        assert_eq!(cap.terms, vec![(1, 3), (3, 3)]);
        assert_eq!(cap.upper, Some(6));
    }

    #[test]
    fn build_is_deterministic() {
        let config = AllocationConfig::new(6, 3, 10);
        assert_eq!(
            AllocationModel::build(&instance(), &config),
            AllocationModel::build(&instance(), &config)
        );
    }

    #[test]
    fn empty_rows_outside_bounds_are_infeasible() {
        let courses = vec![Course::new("A", 3, 1)];
        let lonely = Instance::new(courses, vec![]).unwrap();
        let model = AllocationModel::build(&lonely, &AllocationConfig::default());
        assert_eq!(
            model.trivially_infeasible().map(|c| c.kind),
            Some(ConstraintKind::Coverage { course: 0 })
        );

        let optional = Instance::new(vec![Course::with_groups("A", 3, 1, 0, 1)], vec![]).unwrap();
        let model = AllocationModel::build(&optional, &AllocationConfig::default());
        assert!(model.trivially_infeasible().is_none());
    }

    #[test]
    fn evaluates_assignments() {
        let model = AllocationModel::build(&instance(), &AllocationConfig::new(6, 3, 10));
        // A->F1, B->F2, C->F1
        let selected = [true, false, false, true, true, false];
        assert_eq!(model.objective_value(&selected), 25);
        assert!(model.is_satisfied_by(&selected));

        // everything on F1 leaves F2 without a course
        let overloaded = [true, false, true, false, true, false];
        assert!(!model.is_satisfied_by(&overloaded));
    }
}
