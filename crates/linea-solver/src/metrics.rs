//! Solver counters.

use std::fmt;

/// Counters describing the work done by a solver since the last reset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Metrics {
    /// Constraints accepted into the tableau.
    pub constraints: u64,
    /// Constraints inserted without phase-one pivoting.
    pub simple_constraints: u64,
    /// Constraints that needed an artificial variable.
    pub artificial_constraints: u64,
    /// Constraints rejected as infeasible.
    pub infeasible: u64,
    /// Calls to `optimize`.
    pub optimize: u64,
    /// Simplex iterations across all objectives.
    pub iterations: u64,
    pub pivots: u64,
    pub variables: u64,
    pub slack_variables: u64,
    pub error_variables: u64,
    pub max_rows: u64,
    pub max_variables: u64,
    /// Times a pool had to grow its backing storage.
    pub table_size_increase: u64,
}

impl Metrics {
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

impl fmt::Display for Metrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "*** Metrics ***")?;
        writeln!(f, "constraints: {}", self.constraints)?;
        writeln!(f, "simple constraints: {}", self.simple_constraints)?;
        writeln!(f, "artificial constraints: {}", self.artificial_constraints)?;
        writeln!(f, "infeasible: {}", self.infeasible)?;
        writeln!(f, "optimize: {}", self.optimize)?;
        writeln!(f, "iterations: {}", self.iterations)?;
        writeln!(f, "pivots: {}", self.pivots)?;
        writeln!(f, "variables: {}", self.variables)?;
        writeln!(f, "slack variables: {}", self.slack_variables)?;
        writeln!(f, "error variables: {}", self.error_variables)?;
        writeln!(f, "max rows: {}", self.max_rows)?;
        writeln!(f, "max variables: {}", self.max_variables)?;
        write!(f, "table size increases: {}", self.table_size_increase)
    }
}
