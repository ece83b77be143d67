//! Primal simplex over a lexicographic objective.
//!
//! Entering variables follow Bland's rule: among the improving candidates
//! the one with the lowest id enters. Together with lowest-id tie-breaking
//! in the ratio test this rules out cycling and makes every solve
//! reproducible for the same sequence of calls.

use std::cmp::Ordering;

use linea_core::{InternalError, RowId, SolverError, VariableId, VariableKind};
use tracing::trace;

use crate::tableau::{ratio_wins, Tableau};

/// Which objective to drive to its minimum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Objective {
    /// The priority goal row holding every error variable.
    Goal,
    /// The phase-one objective of an insertion in progress.
    Artificial,
}

impl Tableau {
    /// Pivot until no entering variable improves the objective.
    pub(crate) fn optimize_objective(&mut self, objective: Objective) -> Result<(), SolverError> {
        let limit = self
            .config
            .iteration_limit(self.active_len(), self.variables.live_count());
        let mut iterations = 0usize;

        let outcome = loop {
            let Some((entering, direction)) = self.entering_variable(objective) else {
                break Ok(());
            };
            if iterations >= limit {
                break Err(InternalError::IterationLimit { limit }.into());
            }
            iterations += 1;
            match self.leaving_row(entering, direction) {
                Some(row) => self.pivot(row, entering),
                None => break Err(InternalError::UnboundedVariable { variable: entering }.into()),
            }
        };

        self.record(|m| m.iterations += iterations as u64);
        outcome
    }

    /// Lowest-id variable whose movement lowers the objective.
    ///
    /// Restricted variables can only grow from zero, so they qualify with a
    /// negative leading coefficient. External variables are unrestricted
    /// and also qualify with a positive one, moving downwards. Returns the
    /// variable and its direction of movement.
    fn entering_variable(&self, objective: Objective) -> Option<(VariableId, f64)> {
        let goal = match objective {
            Objective::Goal => &self.goal,
            Objective::Artificial => self.artificial.as_ref()?,
        };

        let mut best: Option<(VariableId, f64)> = None;
        for (var, vector) in goal.terms() {
            let kind = self.variables[var].kind();
            if kind == VariableKind::Constant {
                continue;
            }
            let direction = match vector.lex_sign() {
                Ordering::Less => 1.0,
                Ordering::Greater if !kind.is_restricted() => -1.0,
                _ => continue,
            };
            if best.map_or(true, |(current, _)| var < current) {
                best = Some((var, direction));
            }
        }
        best
    }

    /// Row whose basic variable hits zero first as `entering` moves.
    ///
    /// Rows defining constant markers block immediately since their basic
    /// variable must stay at zero. Rows with an external basic variable
    /// never block.
    fn leaving_row(&self, entering: VariableId, direction: f64) -> Option<RowId> {
        let mut best = None;
        for &row_id in self.variables[entering].row_refs() {
            let row = &self.rows[row_id];
            let Some(basic) = row.basic() else {
                continue;
            };
            let coeff = row.coefficient(entering) * direction;
            let ratio = match self.variables[basic].kind() {
                VariableKind::External => continue,
                VariableKind::Constant => 0.0,
                VariableKind::Slack | VariableKind::Error if coeff < 0.0 => -row.constant() / coeff,
                VariableKind::Slack | VariableKind::Error => continue,
            };
            if ratio_wins(ratio, basic, best) {
                best = Some((ratio, basic, row_id));
            }
        }
        best.map(|(_, _, row)| row)
    }

    /// Exchange the basic variable of `row_id` for `entering`.
    pub(crate) fn pivot(&mut self, row_id: RowId, entering: VariableId) {
        let mut row = self.uninstall(row_id);
        let leaving = row.basic.take();
        match leaving {
            Some(leaving) => row.solve_for_pair(leaving, entering),
            None => row.solve_for(entering),
        }
        row.basic = Some(entering);
        self.substitute(entering, &row);
        self.install(row);

        trace!(row = %row_id, entering = %entering, leaving = ?leaving, "pivot");
        self.record(|m| m.pivots += 1);
    }
}
