use crate::data::{CourseId, FacultyId};
use thiserror::Error;

/// Malformed input, rejected before any model is built.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DataError {
    #[error("row {row}: course identifier is empty")]
    EmptyIdentifier { row: usize },

    #[error("row {row}: duplicate course identifier '{course}'")]
    DuplicateCourse { row: usize, course: CourseId },

    #[error("duplicate faculty identifier '{faculty}'")]
    DuplicateFaculty { faculty: FacultyId },

    #[error("faculty identifier is empty")]
    EmptyFacultyIdentifier,

    #[error("row {row}: course '{course}' has non-positive credits ({credits})")]
    NonPositiveCredits {
        row: usize,
        course: CourseId,
        credits: i64,
    },

    #[error("row {row}: course '{course}' has a negative period tag ({period})")]
    NegativePeriod {
        row: usize,
        course: CourseId,
        period: i64,
    },

    #[error("row {row}: course '{course}' has invalid group bounds (min {min}, max {max})")]
    InvalidGroupBounds {
        row: usize,
        course: CourseId,
        min: i64,
        max: i64,
    },

    #[error("row {row}: score of '{faculty}' for course '{course}' is not an integer ({value})")]
    NonIntegerScore {
        row: usize,
        course: CourseId,
        faculty: FacultyId,
        value: String,
    },

    #[error("row {row}: course '{course}' has a score column for unknown faculty '{faculty}'")]
    UnknownFaculty {
        row: usize,
        course: CourseId,
        faculty: FacultyId,
    },

    #[error(
        "score {value} of '{faculty}' for course '{course}' is outside -{max}..={max}",
        max = crate::data::MAX_SCORE
    )]
    ScoreOutOfRange {
        course: CourseId,
        faculty: FacultyId,
        value: i64,
    },

    #[error("faculty '{faculty}' has no preference score for course '{course}'")]
    MissingPreference {
        course: CourseId,
        faculty: FacultyId,
    },
}

/// Inconsistent engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("annual band is inverted: annual_min {min} > annual_max {max}")]
    AnnualBandInverted { min: i64, max: i64 },

    #[error("{name} must not be negative (got {value})")]
    NegativeLimit { name: &'static str, value: i64 },
}

/// The solver handed back something outside its contract.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SolverError {
    #[error("solver returned {value} for x[{course}, {faculty}], expected 0 or 1")]
    ContractViolation {
        course: CourseId,
        faculty: FacultyId,
        value: f64,
    },
}

/// Everything `solve` can fail with. Infeasibility is not in here; it is a
/// [`SolverStatus`](crate::solver::SolverStatus) on the result.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AllocationError {
    #[error("data contract violation: {0}")]
    Data(#[from] DataError),

    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("solver contract violation: {0}")]
    Solver(#[from] SolverError),
}
