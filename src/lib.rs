//! Course-to-faculty allocation.
//!
//! Courses are handed to faculty members so that the summed preference
//! score ("happiness") is maximal while every course is covered and no
//! faculty member exceeds the per-period cap or leaves the annual credit
//! band. The exact path builds a 0/1 integer program and hands it to HiGHS;
//! the Monte Carlo baseline samples random allocations and ignores all
//! constraints.
//!
//! ```no_run
//! use course_allocator::{AllocationConfig, Course, Faculty, solve};
//!
//! let courses = vec![Course::new("A", 3, 1), Course::new("B", 3, 1)];
//! let faculty = vec![
//!     Faculty::new("F1", [("A", 10), ("B", 1)]),
//!     Faculty::new("F2", [("A", 1), ("B", 10)]),
//! ];
//! let result = solve(courses, faculty, &AllocationConfig::new(6, 3, 10)).unwrap();
//! println!("{}", result.summary());
//! ```

pub mod config;
pub mod data;
pub mod error;
pub mod model;
pub mod monte_carlo;
pub mod result;
pub mod solver;

pub use config::{AllocationConfig, CoveragePolicy, HeuristicConfig, ServerConfig};
pub use data::{Course, CourseId, CourseRow, Dataset, Faculty, FacultyId, Instance, Period};
pub use error::{AllocationError, ConfigError, DataError, SolverError};
pub use result::{AssignmentMatrix, AssignmentResult};
pub use solver::SolverStatus;

use log::info;

/// Validates the input, builds a fresh model and solves it exactly.
///
/// Infeasibility is reported through `solver_status`, not as an error.
pub fn solve(
    courses: Vec<Course>,
    faculty: Vec<Faculty>,
    config: &AllocationConfig,
) -> Result<AssignmentResult, AllocationError> {
    let instance = Instance::new(courses, faculty)?;
    solve_instance(&instance, config)
}

pub fn solve_dataset(
    dataset: Dataset,
    config: &AllocationConfig,
) -> Result<AssignmentResult, AllocationError> {
    let instance = dataset.into_instance()?;
    solve_instance(&instance, config)
}

pub fn solve_instance(
    instance: &Instance,
    config: &AllocationConfig,
) -> Result<AssignmentResult, AllocationError> {
    config.validate()?;
    let model = model::AllocationModel::build(instance, config);
    let outcome = solver::solve_exact(&model, instance, config)?;
    let result = result::aggregate(instance, outcome.status, outcome.assignment.as_ref(), true);
    info!(
        "Solve finished with status {} and happiness {}.",
        result.solver_status, result.happiness_index
    );
    Ok(result)
}

/// Monte Carlo baseline as a result object. The status is always
/// `NOT_SOLVED` and `feasibility_checked` is false: the allocation is only
/// the best of the samples by score.
pub fn run_baseline(instance: &Instance, config: &HeuristicConfig) -> AssignmentResult {
    let baseline = monte_carlo::run_monte_carlo(instance, config);
    result::aggregate(
        instance,
        SolverStatus::NotSolved,
        Some(&baseline.assignment),
        false,
    )
}
