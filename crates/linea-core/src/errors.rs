//! Error types for the linea solver.

use thiserror::Error;

use crate::ids::{ConstraintId, VariableId};

/// Errors reported by the solver façade.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SolverError {
    /// A hard constraint conflicts with hard constraints already accepted.
    ///
    /// The tableau is left exactly as it was before the offending request;
    /// callers usually drop the newest constraint and carry on.
    #[error("Infeasible constraint: {constraint}")]
    Infeasible { constraint: String },

    #[error("Unknown constraint: {0}")]
    UnknownConstraint(ConstraintId),

    #[error("Unknown variable: {0}")]
    UnknownVariable(VariableId),

    #[error(transparent)]
    Internal(#[from] InternalError),
}

impl SolverError {
    /// Whether this error reports an infeasible hard constraint.
    pub fn is_infeasible(&self) -> bool {
        matches!(self, SolverError::Infeasible { .. })
    }
}

/// Invariant violations inside the tableau.
///
/// These indicate a bug in row compilation or pivoting, never a property
/// of the caller's constraint set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InternalError {
    #[error("Objective is unbounded along {variable}")]
    UnboundedVariable { variable: VariableId },

    #[error("Simplex did not converge within {limit} iterations")]
    IterationLimit { limit: usize },
}
