//! The solver façade.

use std::fmt;

use indexmap::IndexMap;
use linea_core::{
    ConstraintId, Relation, SolverConfig, SolverError, StrengthVector, VariableId, VariableKind,
};
use tracing::debug;

use crate::builder::RowBuilder;
use crate::goal::GoalRow;
use crate::metrics::Metrics;
use crate::optimizer::Objective;
use crate::row::Row;
use crate::tableau::Tableau;
use crate::variable::Variable;

/// Lifecycle of a [`LinearSystem`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SolverState {
    /// Constraints changed since the last optimization.
    #[default]
    Building,
    /// An optimization is running.
    Optimizing,
    /// Values reflect the optimum of the current constraints.
    Optimal,
    /// The last constraint or optimization could not be satisfied.
    Infeasible,
}

/// Occupancy of the variable and row pools.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    pub variables_live: usize,
    pub variables_capacity: usize,
    pub variables_high_water: usize,
    pub rows_live: usize,
    pub rows_capacity: usize,
    pub rows_high_water: usize,
}

/// An incremental lexicographic simplex solver.
///
/// Constraints are linear rows against zero at one of the [`Strength`]
/// tiers. Hard rows must hold; soft rows are satisfied as far as possible,
/// with any single violation at a stronger tier outweighing every
/// violation at weaker tiers.
///
/// [`Strength`]: linea_core::Strength
///
/// # Example
///
/// ```
/// use linea_core::{Relation, Strength, VariableKind};
/// use linea_solver::LinearSystem;
///
/// let mut system = LinearSystem::new();
/// let left = system.create_variable(VariableKind::External, "left");
/// let right = system.create_variable(VariableKind::External, "right");
///
/// // right = left + 100
/// let width = system
///     .create_row()
///     .with_term(right, 1.0)
///     .with_term(left, -1.0)
///     .with_constant(-100.0);
/// system.add_constraint(width, Relation::Eq).unwrap();
///
/// // left wants to sit at 20
/// let anchor = system
///     .create_row()
///     .with_term(left, 1.0)
///     .with_constant(-20.0)
///     .with_strength(Strength::Medium);
/// system.add_constraint(anchor, Relation::Eq).unwrap();
///
/// system.optimize().unwrap();
/// assert_eq!(system.value_of(left), 20.0);
/// assert_eq!(system.value_of(right), 120.0);
/// ```
#[derive(Debug)]
pub struct LinearSystem {
    tableau: Tableau,
    state: SolverState,
    /// Pinned variables and the hidden constraint holding each of them, if any.
    pins: IndexMap<VariableId, Option<ConstraintId>>,
    /// Unpinned variables still held at their pinned value, because live
    /// rows folded that value in. Each hold is a hidden hard equality.
    holds: IndexMap<VariableId, (ConstraintId, f32)>,
}

impl Default for LinearSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl LinearSystem {
    pub fn new() -> Self {
        Self::with_config(SolverConfig::default())
    }

    pub fn with_config(config: SolverConfig) -> Self {
        Self {
            tableau: Tableau::new(config),
            state: SolverState::Building,
            pins: IndexMap::new(),
            holds: IndexMap::new(),
        }
    }

    pub fn config(&self) -> &SolverConfig {
        &self.tableau.config
    }

    /// Acquire a fresh variable. An empty prefix leaves it unnamed.
    pub fn create_variable(&mut self, kind: VariableKind, name_prefix: &str) -> VariableId {
        let prefix = (!name_prefix.is_empty()).then_some(name_prefix);
        self.tableau.new_variable(kind, prefix)
    }

    /// Start a hard row. Use [`RowBuilder::with_strength`] to make it soft.
    pub fn create_row(&self) -> RowBuilder {
        RowBuilder::new()
    }

    /// Add `row REL 0` to the system.
    ///
    /// # Errors
    ///
    /// Returns [`SolverError::Infeasible`] if the row is hard and conflicts
    /// with the hard rows already present. The system is left exactly as
    /// it was before the call.
    pub fn add_constraint(
        &mut self,
        row: RowBuilder,
        relation: Relation,
    ) -> Result<ConstraintId, SolverError> {
        self.state = SolverState::Building;
        match self.tableau.add_constraint(&row, relation) {
            Ok(id) => Ok(id),
            Err(err) => {
                if err.is_infeasible() {
                    self.state = SolverState::Infeasible;
                }
                Err(err)
            }
        }
    }

    /// Remove a constraint added earlier.
    pub fn remove_constraint(&mut self, id: ConstraintId) -> Result<(), SolverError> {
        self.tableau.remove_constraint(id)?;
        self.state = SolverState::Building;
        self.release_holds()
    }

    /// Drop the holds whose folding rows have all been removed.
    fn release_holds(&mut self) -> Result<(), SolverError> {
        let released: Vec<_> = self
            .holds
            .iter()
            .filter(|(var, _)| {
                self.tableau
                    .variables
                    .get(**var)
                    .map_or(true, |v| v.fold_count() == 0)
            })
            .map(|(var, &(hold, _))| (*var, hold))
            .collect();
        for (var, hold) in released {
            self.holds.shift_remove(&var);
            self.tableau.remove_constraint(hold)?;
            debug!(variable = %var, "hold released");
        }
        Ok(())
    }

    /// Fix a variable's value outside the simplex.
    ///
    /// Rows authored while the variable is pinned fold its value into their
    /// constant. If the variable already takes part in the tableau, a
    /// hidden hard equality holds it at `value` as well. Pinning a pinned
    /// variable again replaces its value, unless live rows folded the old
    /// value in; then only the same value is accepted.
    ///
    /// # Errors
    ///
    /// Returns [`SolverError::Infeasible`] if the value contradicts the hard
    /// rows already present. The previous pin, if any, stays in place.
    pub fn pin_value(&mut self, var: VariableId, value: f32) -> Result<(), SolverError> {
        let variable = self
            .tableau
            .variables
            .get(var)
            .ok_or(SolverError::UnknownVariable(var))?;
        let previous_value = variable.computed_value();
        let fixed = match self.holds.get(&var) {
            Some(&(_, held)) => Some(held),
            None if variable.fold_count() > 0 => Some(previous_value),
            None => None,
        };

        // Folded rows already carry the value as a constant.
        if let Some(fixed) = fixed {
            if value != fixed {
                self.state = SolverState::Infeasible;
                return Err(self.tableau.reject(&pin_row(var, value), Relation::Eq));
            }
            if let Some((hold, _)) = self.holds.shift_remove(&var) {
                self.tableau.variables[var].pin(value);
                self.pins.insert(var, Some(hold));
                self.state = SolverState::Building;
                debug!(variable = %var, value, "held variable pinned");
            }
            return Ok(());
        }

        let repin = self.pins.contains_key(&var);
        if repin {
            self.release_pin(var)?;
        }
        if let Err(err) = self.attach_pin(var, value) {
            if repin {
                self.attach_pin(var, previous_value)?;
                self.state = SolverState::Infeasible;
            }
            return Err(err);
        }
        Ok(())
    }

    fn attach_pin(&mut self, var: VariableId, value: f32) -> Result<(), SolverError> {
        let variable = &self.tableau.variables[var];
        let referenced = variable.kind() != VariableKind::Constant
            && (variable.is_basic() || !variable.row_refs().is_empty());

        let hidden = if referenced {
            Some(self.add_constraint(pin_row(var, value), Relation::Eq)?)
        } else {
            None
        };

        self.tableau.variables[var].pin(value);
        self.pins.insert(var, hidden);
        self.state = SolverState::Building;
        debug!(variable = %var, value, hidden = hidden.is_some(), "variable pinned");
        Ok(())
    }

    fn release_pin(&mut self, var: VariableId) -> Result<(), SolverError> {
        if let Some(variable) = self.tableau.variables.get_mut(var) {
            variable.unpin();
        }
        if let Some(Some(hidden)) = self.pins.shift_remove(&var) {
            self.tableau.remove_constraint(hidden)?;
        }
        Ok(())
    }

    /// Release a pinned variable.
    ///
    /// While live rows still hold the folded value, the variable stays at
    /// that value through a hidden hard equality. The hold goes away with
    /// the last of those rows.
    pub fn unpin(&mut self, var: VariableId) -> Result<(), SolverError> {
        let variable = self
            .tableau
            .variables
            .get(var)
            .ok_or(SolverError::UnknownVariable(var))?;
        let value = variable.computed_value();
        let folded = variable.fold_count() > 0;
        self.state = SolverState::Building;

        let Some(&hidden) = self.pins.get(&var).filter(|_| folded) else {
            return self.release_pin(var);
        };

        self.tableau.variables[var].unpin();
        let hold = match hidden {
            Some(hidden) => hidden,
            None => match self.tableau.add_constraint(&pin_row(var, value), Relation::Eq) {
                Ok(id) => id,
                Err(err) => {
                    self.tableau.variables[var].pin(value);
                    return Err(err);
                }
            },
        };
        self.pins.shift_remove(&var);
        self.holds.insert(var, (hold, value));
        debug!(variable = %var, value, "unpinned variable held by folded rows");
        Ok(())
    }

    /// Drive the objective to its lexicographic minimum and refresh values.
    pub fn optimize(&mut self) -> Result<(), SolverError> {
        self.state = SolverState::Optimizing;
        self.tableau.record(|m| m.optimize += 1);

        match self.tableau.optimize_objective(Objective::Goal) {
            Ok(()) => {
                self.tableau.refresh_values();
                self.state = SolverState::Optimal;
                debug!(
                    rows = self.tableau.active_len(),
                    variables = self.tableau.variables.live_count(),
                    "optimal"
                );
                Ok(())
            }
            Err(err) => {
                self.state = SolverState::Building;
                debug!(error = %err, "optimization failed");
                Err(err)
            }
        }
    }

    /// Current value of a variable; `0.0` for ids that are not live.
    pub fn value_of(&self, var: VariableId) -> f32 {
        self.tableau.value(var) as f32
    }

    /// Drop every variable, row, and constraint, keeping pool capacity.
    pub fn reset(&mut self) {
        self.tableau.reset();
        self.pins.clear();
        self.holds.clear();
        self.state = SolverState::Building;
        debug!("system reset");
    }

    pub fn state(&self) -> SolverState {
        self.state
    }

    pub fn metrics(&self) -> &Metrics {
        &self.tableau.metrics
    }

    pub fn reset_metrics(&mut self) {
        self.tableau.metrics.reset();
    }

    /// Residual penalty per tier after the last optimization.
    pub fn objective(&self) -> StrengthVector {
        *self.tableau.goal.constant()
    }

    /// The priority goal row being minimized.
    pub fn goal(&self) -> &GoalRow {
        &self.tableau.goal
    }

    /// Rows of the tableau, each defining one basic variable.
    pub fn rows(&self) -> impl Iterator<Item = &Row> {
        self.tableau.active_rows()
    }

    pub fn variable(&self, id: VariableId) -> Option<&Variable> {
        self.tableau.variables.get(id)
    }

    pub fn is_pinned(&self, id: VariableId) -> bool {
        self.pins.contains_key(&id)
    }

    /// Whether an unpinned variable is still held at a value folded into live rows.
    pub fn is_held(&self, id: VariableId) -> bool {
        self.holds.contains_key(&id)
    }

    /// Number of rows in the tableau.
    pub fn row_count(&self) -> usize {
        self.tableau.active_len()
    }

    pub fn constraint_count(&self) -> usize {
        self.tableau.constraint_count()
    }

    pub fn contains_constraint(&self, id: ConstraintId) -> bool {
        self.tableau.contains_constraint(id)
    }

    pub fn pool_stats(&self) -> PoolStats {
        let variables = &self.tableau.variables;
        let rows = &self.tableau.rows;
        PoolStats {
            variables_live: variables.live_count(),
            variables_capacity: variables.capacity(),
            variables_high_water: variables.high_water_mark(),
            rows_live: rows.live_count(),
            rows_capacity: rows.capacity(),
            rows_high_water: rows.high_water_mark(),
        }
    }
}

impl fmt::Display for LinearSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tableau = &self.tableau;
        write!(f, "goal: {}", tableau.goal.constant())?;
        for (var, vector) in tableau.goal.terms() {
            write!(f, " + {} {}", vector, tableau.label(var))?;
        }
        writeln!(f)?;

        for row in tableau.active_rows() {
            tableau.write_row(f, row)?;
            writeln!(f)?;
        }

        let pinned = self
            .pins
            .keys()
            .map(|var| (tableau.label(*var), self.value_of(*var) as f64));
        for (label, value) in pinned {
            writeln!(f, "pinned {} = {}", label, value)?;
        }
        for (var, (_, value)) in &self.holds {
            writeln!(f, "held {} = {}", tableau.label(*var), value)?;
        }
        write!(f, "state: {:?}", self.state)
    }
}

/// `var = value` at the default hard strength.
fn pin_row(var: VariableId, value: f32) -> RowBuilder {
    RowBuilder::new().with_term(var, 1.0).with_constant(-value)
}
