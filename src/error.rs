//! Error taxonomy for allocation runs.
//!
//! Callers must be able to tell malformed data ([`AllocError::Mapping`])
//! from plausibly infeasible data ([`AllocError::Incoherent`]) and from a
//! failed solve ([`AllocError::Solver`]).

use crate::ilp::SolveStatus;

/// Errors raised by the allocation pipeline.
#[derive(Debug, thiserror::Error)]
pub enum AllocError {
    /// Required sheet or column missing. Never overridable.
    #[error("The input workbook has not the expected structure: {}", .0.join("; "))]
    Schema(Vec<String>),

    /// A relation references an undeclared identifier, or a required
    /// (service, treatment) pair is not offered by any bed.
    #[error("There is some errors in your dataset mappings ({issues} issue(s)), please reconsider it.")]
    Mapping { issues: usize },

    /// Pre-solve capacity estimate says the instance is likely infeasible.
    #[error("There is a risk of unfeasability in your dataset ({issues} issue(s)), please reconsider it.")]
    Incoherent { issues: usize },

    /// The solver returned a status worse than optimal/feasible.
    #[error("Problem is {status}. There might be a problem of data.")]
    Solver { status: SolveStatus },

    /// Reading or writing a file failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Workbook or report (de)serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Alias for results produced by this crate.
pub type Result<T> = std::result::Result<T, AllocError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solver_message() {
        let err = AllocError::Solver {
            status: SolveStatus::Infeasible,
        };
        assert_eq!(
            err.to_string(),
            "Problem is IntegerInfeasible. There might be a problem of data."
        );
    }

    #[test]
    fn test_schema_message_lists_all() {
        let err = AllocError::Schema(vec!["missing sheet 'beds'".into(), "missing column".into()]);
        let msg = err.to_string();
        assert!(msg.contains("missing sheet 'beds'"));
        assert!(msg.contains("missing column"));
    }
}
