use crate::config::AllocationConfig;
use crate::data::Instance;
use crate::error::SolverError;
use crate::model::{AllocationModel, Decision, LinearConstraint};
use good_lp::solvers::SolutionStatus;
use good_lp::variable;
use good_lp::{
    Expression, ProblemVariables, ResolutionError, Solution, SolverModel, Variable, constraint,
    default_solver,
};
use log::{info, trace, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::time::Instant;

/// Normalized outcome of one optimization attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SolverStatus {
    Optimal,
    Infeasible,
    Unbounded,
    /// No verdict: the solver gave up, was interrupted, or never ran (heuristic).
    NotSolved,
}

impl SolverStatus {
    pub fn is_optimal(self) -> bool {
        matches!(self, SolverStatus::Optimal)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SolverStatus::Optimal => "OPTIMAL",
            SolverStatus::Infeasible => "INFEASIBLE",
            SolverStatus::Unbounded => "UNBOUNDED",
            SolverStatus::NotSolved => "NOT_SOLVED",
        }
    }
}

impl fmt::Display for SolverStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The (course, faculty) pairs set to 1 by a solver or sampler.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawAssignment(BTreeSet<Decision>);

impl RawAssignment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, course: usize, faculty: usize) {
        self.0.insert(Decision { course, faculty });
    }

    pub fn contains(&self, course: usize, faculty: usize) -> bool {
        self.0.contains(&Decision { course, faculty })
    }

    /// Pairs in course-major order.
    pub fn iter(&self) -> impl Iterator<Item = Decision> + '_ {
        self.0.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(usize, usize)> for RawAssignment {
    fn from_iter<I: IntoIterator<Item = (usize, usize)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(course, faculty)| Decision { course, faculty })
                .collect(),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolveOutcome {
    pub status: SolverStatus,
    /// Present exactly when `status` is optimal.
    pub assignment: Option<RawAssignment>,
}

impl SolveOutcome {
    pub fn optimal(assignment: RawAssignment) -> Self {
        Self {
            status: SolverStatus::Optimal,
            assignment: Some(assignment),
        }
    }

    pub fn without_solution(status: SolverStatus) -> Self {
        Self {
            status,
            assignment: None,
        }
    }
}

/// Solves `model` to optimality with HiGHS.
///
/// Infeasible, unbounded and aborted runs come back as a status, never as an
/// error. The only error is a variable value that does not round to 0 or 1.
pub fn solve_exact(
    model: &AllocationModel,
    instance: &Instance,
    config: &AllocationConfig,
) -> Result<SolveOutcome, SolverError> {
    let start_time = Instant::now();

    if let Some(row) = model.trivially_infeasible() {
        warn!("Constraint {:?} has no variables and cannot hold; model is infeasible.", row.kind);
        return Ok(SolveOutcome::without_solution(SolverStatus::Infeasible));
    }
    if model.num_variables() == 0 {
        info!("Model has no decision variables; nothing to solve.");
        return Ok(SolveOutcome::optimal(RawAssignment::new()));
    }

    let mut problem = ProblemVariables::new();
    let vars = problem.add_vector(variable().binary(), model.num_variables());

    let objective = linear_expression(&vars, model.objective().iter().copied().enumerate());
    let mut lp = problem
        .maximise(objective)
        .using(default_solver)
        .set_option("threads", 1) // limit to 1 thread for reproducibility
        .set_option("random_seed", 1234) //set seed for reproducibility
        .set_option("mip_rel_gap", 0.0) // prove optimality, not just a small gap
        .set_option("log_to_console", if config.solver_log { "true" } else { "false" });

    let mut rows = 0usize;
    for row in model.constraints().iter().filter(|row| !row.terms.is_empty()) {
        rows += add_row(&mut lp, &vars, row);
    }
    trace!("Passed {} rows to the solver.", rows);

    info!("Starting ILP solver...");
    let solution = match lp.solve() {
        Ok(s) => s,
        Err(e) => {
            let status = status_of_error(&e);
            warn!("Solver stopped with {} after {:.2?}: {}", status, start_time.elapsed(), e);
            return Ok(SolveOutcome::without_solution(status));
        }
    };

    let status = status_of(solution.status());
    if !status.is_optimal() {
        warn!(
            "Solver hit a limit after {:.2?} without proving optimality.",
            start_time.elapsed()
        );
        return Ok(SolveOutcome::without_solution(status));
    }
    info!("Solution found in {:.2?}", start_time.elapsed());

    let values = vars.iter().map(|var| solution.value(*var));
    let assignment = extract_assignment(model, instance, values)?;
    Ok(SolveOutcome::optimal(assignment))
}

/// Only a proven optimum counts; a solution cut short by a time, gap or
/// iteration limit is reported as not solved.
fn status_of(status: SolutionStatus) -> SolverStatus {
    match status {
        SolutionStatus::Optimal => SolverStatus::Optimal,
        _ => SolverStatus::NotSolved,
    }
}

fn status_of_error(error: &ResolutionError) -> SolverStatus {
    match error {
        ResolutionError::Infeasible => SolverStatus::Infeasible,
        ResolutionError::Unbounded => SolverStatus::Unbounded,
        _ => SolverStatus::NotSolved,
    }
}

fn linear_expression(vars: &[Variable], terms: impl Iterator<Item = (usize, i64)>) -> Expression {
    terms.fold(Expression::from(0.0), |sum, (var, coef)| {
        sum + vars[var] * (coef as f64)
    })
}

fn add_row(lp: &mut impl SolverModel, vars: &[Variable], row: &LinearConstraint) -> usize {
    let lhs = linear_expression(vars, row.terms.iter().copied());
    match (row.lower, row.upper) {
        (Some(lo), Some(hi)) if lo == hi => {
            let rhs = lo as f64;
            lp.add_constraint(constraint!(lhs == rhs));
            1
        }
        (lower, upper) => {
            let mut added = 0;
            if let Some(lo) = lower {
                let rhs = lo as f64;
                lp.add_constraint(constraint!(lhs.clone() >= rhs));
                added += 1;
            }
            if let Some(hi) = upper {
                let rhs = hi as f64;
                lp.add_constraint(constraint!(lhs <= rhs));
                added += 1;
            }
            added
        }
    }
}

/// Rounds solver output to the nearest integer; anything but 0 or 1 is a
/// broken solver, not a zero.
pub fn extract_assignment(
    model: &AllocationModel,
    instance: &Instance,
    values: impl IntoIterator<Item = f64>,
) -> Result<RawAssignment, SolverError> {
    let mut assignment = RawAssignment::new();
    for (var, value) in values.into_iter().enumerate() {
        let Decision { course, faculty } = model.decision(var);
        let rounded = value.round();
        if rounded == 1.0 {
            assignment.insert(course, faculty);
        } else if rounded != 0.0 || !value.is_finite() {
            return Err(SolverError::ContractViolation {
                course: instance.courses()[course].id.clone(),
                faculty: instance.faculty()[faculty].id.clone(),
                value,
            });
        }
    }
    Ok(assignment)
}
