//! Tableau bookkeeping: constraint compilation, insertion, and removal.
//!
//! The tableau keeps every active row in basic-feasible form:
//! - each basic variable is defined by exactly one row, recorded in
//!   [`Variable::definition_row`](crate::Variable::definition_row);
//! - each non-basic variable lists the rows referencing it in its
//!   back-references, so a pivot only touches the rows that mention the
//!   entering variable;
//! - every row whose basic variable is a slack or error variable has a
//!   non-negative constant.
//!
//! Pivot selection lives in `optimizer.rs`.

use std::fmt::{self, Write as _};

use indexmap::{IndexMap, IndexSet};
use linea_core::{
    near_zero, ConstraintId, Relation, RowId, SolverConfig, SolverError, Strength, StrengthVector,
    VariableId, VariableKind,
};
use smallvec::SmallVec;
use tracing::debug;

use crate::builder::RowBuilder;
use crate::goal::GoalRow;
use crate::metrics::Metrics;
use crate::optimizer::Objective;
use crate::row::{Row, RowPool, TermChange};
use crate::variable::VariablePool;

/// Variables introduced for one constraint.
#[derive(Debug, Clone)]
pub(crate) struct Tag {
    /// Slack, error, or constant variable marking the constraint's row.
    pub(crate) marker: VariableId,
    /// Second error variable of a soft equality, or the error of a soft inequality.
    pub(crate) other: Option<VariableId>,
    /// Single-sided error variables requested through the row builder.
    pub(crate) extra: SmallVec<[VariableId; 2]>,
    /// Pinned variables whose values were folded into the row constant.
    pub(crate) folded: SmallVec<[VariableId; 2]>,
}

impl Tag {
    fn new(marker: VariableId, other: Option<VariableId>) -> Self {
        Self {
            marker,
            other,
            extra: SmallVec::new(),
            folded: SmallVec::new(),
        }
    }

    pub(crate) fn variables(&self) -> impl Iterator<Item = VariableId> + '_ {
        std::iter::once(self.marker)
            .chain(self.other)
            .chain(self.extra.iter().copied())
    }
}

/// The simplex tableau together with the pools backing it.
#[derive(Debug)]
pub(crate) struct Tableau {
    pub(crate) variables: VariablePool,
    pub(crate) rows: RowPool,
    active: IndexSet<RowId>,
    pub(crate) goal: GoalRow,
    /// Phase-one objective, present only while a row is being inserted
    /// through an artificial variable.
    pub(crate) artificial: Option<GoalRow>,
    constraints: IndexMap<ConstraintId, Tag>,
    next_constraint: u32,
    pub(crate) config: SolverConfig,
    pub(crate) metrics: Metrics,
}

impl Tableau {
    pub(crate) fn new(config: SolverConfig) -> Self {
        Self {
            variables: VariablePool::with_capacity(config.initial_variable_capacity),
            rows: RowPool::with_capacity(config.initial_row_capacity),
            active: IndexSet::with_capacity(config.initial_row_capacity),
            goal: GoalRow::new(),
            artificial: None,
            constraints: IndexMap::new(),
            next_constraint: 0,
            config,
            metrics: Metrics::default(),
        }
    }

    /// Release every row and variable back to the pools.
    pub(crate) fn reset(&mut self) {
        self.variables.reset();
        self.rows.reset();
        self.active.clear();
        self.goal.clear();
        self.artificial = None;
        self.constraints.clear();
        self.next_constraint = 0;
    }

    pub(crate) fn record(&mut self, update: impl FnOnce(&mut Metrics)) {
        if self.config.collect_metrics {
            update(&mut self.metrics);
        }
    }

    pub(crate) fn active_rows(&self) -> impl Iterator<Item = &Row> {
        self.active.iter().map(|id| &self.rows[*id])
    }

    pub(crate) fn active_len(&self) -> usize {
        self.active.len()
    }

    pub(crate) fn constraint_count(&self) -> usize {
        self.constraints.len()
    }

    pub(crate) fn contains_constraint(&self, id: ConstraintId) -> bool {
        self.constraints.contains_key(&id)
    }

    /// Current value of a variable.
    ///
    /// Rows never reference folded (pinned or constant) variables, and every
    /// other non-basic variable sits at zero, so a basic variable's value is
    /// its row constant.
    pub(crate) fn value(&self, id: VariableId) -> f64 {
        let Some(var) = self.variables.get(id) else {
            return 0.0;
        };
        if var.is_folded() {
            return var.computed_value() as f64;
        }
        var.definition_row.map_or(0.0, |row| self.rows[row].constant())
    }

    /// Store the current value of every external variable.
    pub(crate) fn refresh_values(&mut self) {
        let Tableau {
            variables, rows, ..
        } = self;
        for var in variables.iter_mut() {
            if var.kind() != VariableKind::External || var.is_final_value() {
                continue;
            }
            let value = var.definition_row.map_or(0.0, |row| rows[row].constant());
            var.set_computed_value(value as f32);
        }
    }

    pub(crate) fn new_variable(&mut self, kind: VariableKind, name_prefix: Option<&str>) -> VariableId {
        let growths = self.variables.growths();
        let id = self.variables.acquire(kind, name_prefix);
        let grew = self.variables.growths() != growths;
        let live = self.variables.live_count() as u64;
        self.record(|m| {
            m.variables += 1;
            match kind {
                VariableKind::Slack => m.slack_variables += 1,
                VariableKind::Error => m.error_variables += 1,
                _ => {}
            }
            m.max_variables = m.max_variables.max(live);
            if grew {
                m.table_size_increase += 1;
            }
        });
        id
    }

    /// Create an error variable penalized at `strength` and add it to the goal.
    fn new_error(&mut self, strength: Strength) -> VariableId {
        let id = self.new_variable(VariableKind::Error, None);
        self.variables[id].set_strength(strength);
        self.goal.add_term(id, &StrengthVector::unit(strength), 1.0);
        id
    }

    fn acquire_row(&mut self) -> Row {
        let growths = self.rows.growths();
        let id = self.rows.acquire();
        if self.rows.growths() != growths {
            self.record(|m| m.table_size_increase += 1);
        }
        self.rows.take(id)
    }

    /// Attach a row with a basic variable to the tableau.
    pub(crate) fn install(&mut self, row: Row) {
        let id = row.id();
        if let Some(basic) = row.basic() {
            self.variables[basic].definition_row = Some(id);
        }
        for &(var, _) in row.terms() {
            self.variables[var].add_row_ref(id);
        }
        self.active.insert(id);
        self.rows.restore(row);

        let rows = self.active.len() as u64;
        self.record(|m| m.max_rows = m.max_rows.max(rows));
    }

    /// Detach a row from the tableau, unlinking its basic variable and terms.
    pub(crate) fn uninstall(&mut self, id: RowId) -> Row {
        let row = self.rows.take(id);
        if let Some(basic) = row.basic() {
            self.variables[basic].definition_row = None;
        }
        for &(var, _) in row.terms() {
            self.variables[var].remove_row_ref(id);
        }
        self.active.swap_remove(&id);
        row
    }

    /// Replace `var` by `definition` in every row and objective referencing it.
    ///
    /// `definition` must not be installed while this runs.
    pub(crate) fn substitute(&mut self, var: VariableId, definition: &Row) {
        let mut refs = std::mem::take(&mut self.variables[var].row_refs);
        for &row_id in &refs {
            let row = &mut self.rows[row_id];
            let Some(coeff) = row.remove_term(var) else {
                continue;
            };
            row.constant += coeff * definition.constant();
            if near_zero(row.constant) {
                row.constant = 0.0;
            }
            for &(other, c) in definition.terms() {
                match row.add_term(other, coeff * c) {
                    TermChange::Inserted => self.variables[other].add_row_ref(row_id),
                    TermChange::Removed => self.variables[other].remove_row_ref(row_id),
                    TermChange::Updated | TermChange::Unchanged => {}
                }
            }
        }
        refs.clear();
        self.variables[var].row_refs = refs;

        self.goal.substitute(var, definition);
        if let Some(artificial) = &mut self.artificial {
            artificial.substitute(var, definition);
        }
    }

    /// Remove every trace of `var` from rows and objectives.
    ///
    /// Only valid for a variable whose value is zero: dropping its terms
    /// then leaves every row's value unchanged.
    fn scrub(&mut self, var: VariableId) {
        if let Some(def) = self.variables[var].definition_row {
            let row = self.uninstall(def);
            self.rows.recycle(row);
        }
        let refs = std::mem::take(&mut self.variables[var].row_refs);
        for &row_id in &refs {
            self.rows[row_id].remove_term(var);
        }
        self.goal.remove_term(var);
        if let Some(artificial) = &mut self.artificial {
            artificial.remove_term(var);
        }
    }

    /// Compile a builder into a pending row `0 = constant + Σ`.
    ///
    /// Basic variables are replaced by their definitions, folded variables
    /// by their values, and the slack, error, or marker variables for the
    /// relation and strength are appended. The constant is made
    /// non-negative.
    fn compile(&mut self, builder: &RowBuilder, relation: Relation) -> Result<(Row, Tag), SolverError> {
        if let Some(&(unknown, _)) = builder
            .terms()
            .iter()
            .find(|(var, _)| !self.variables.is_live(*var))
        {
            return Err(SolverError::UnknownVariable(unknown));
        }

        let mut row = self.acquire_row();
        let mut folded = SmallVec::new();
        row.constant = builder.constant();
        for &(var, coeff) in builder.terms() {
            let variable = &self.variables[var];
            if variable.is_folded() {
                row.constant += coeff * variable.computed_value() as f64;
                if variable.is_final_value() {
                    folded.push(var);
                }
                continue;
            }
            match variable.definition_row {
                Some(def) => {
                    let def = &self.rows[def];
                    row.constant += coeff * def.constant();
                    for &(other, c) in def.terms() {
                        row.add_term(other, coeff * c);
                    }
                }
                None => {
                    row.add_term(var, coeff);
                }
            }
        }

        let strength = builder.strength();
        let mut tag = match relation {
            Relation::Le | Relation::Ge => {
                let coeff = if relation == Relation::Le { 1.0 } else { -1.0 };
                let slack = self.new_variable(VariableKind::Slack, None);
                row.set_term(slack, coeff);
                let error = (!strength.is_hard()).then(|| {
                    let error = self.new_error(strength);
                    row.set_term(error, -coeff);
                    error
                });
                Tag::new(slack, error)
            }
            Relation::Eq if strength.is_hard() => {
                let marker = self.new_variable(VariableKind::Constant, None);
                row.set_term(marker, 1.0);
                Tag::new(marker, None)
            }
            Relation::Eq => {
                let too_high = self.new_error(strength);
                let too_low = self.new_error(strength);
                row.set_term(too_high, -1.0);
                row.set_term(too_low, 1.0);
                Tag::new(too_high, Some(too_low))
            }
        };

        for &(sign, error_strength) in builder.error_terms() {
            let error = self.new_error(error_strength);
            row.set_term(error, sign);
            tag.extra.push(error);
        }
        tag.folded = folded;

        if row.constant < 0.0 {
            row.negate();
        }
        Ok((row, tag))
    }

    /// Pick the variable a freshly compiled row should define.
    ///
    /// Any external variable will do since externals are unrestricted. A
    /// fresh slack or error variable works when its coefficient is
    /// negative, which keeps its value `constant / -coeff >= 0`.
    fn choose_subject(&self, row: &Row, tag: &Tag) -> Option<VariableId> {
        if let Some(&(var, _)) = row
            .terms()
            .iter()
            .find(|(var, _)| self.variables[*var].kind() == VariableKind::External)
        {
            return Some(var);
        }
        tag.variables().find(|var| {
            self.variables[*var].kind().is_restricted() && row.coefficient(*var) < 0.0
        })
    }

    fn is_all_constant(&self, row: &Row) -> bool {
        row.terms()
            .iter()
            .all(|(var, _)| self.variables[*var].kind() == VariableKind::Constant)
    }

    /// Insert a constraint, keeping the tableau basic-feasible.
    pub(crate) fn add_constraint(
        &mut self,
        builder: &RowBuilder,
        relation: Relation,
    ) -> Result<ConstraintId, SolverError> {
        let (mut row, tag) = self.compile(builder, relation)?;

        match self.choose_subject(&row, &tag) {
            Some(subject) => {
                row.solve_for(subject);
                row.basic = Some(subject);
                self.substitute(subject, &row);
                self.install(row);
                self.record(|m| m.simple_constraints += 1);
            }
            None if self.is_all_constant(&row) => {
                if !near_zero(row.constant()) {
                    let description = self.describe(builder, relation);
                    self.discard(row, &tag);
                    return Err(self.infeasible(description));
                }
                // Implied by hard constraints already present: the marker
                // enters the basis at zero so later removals keep it.
                if row.contains(tag.marker) {
                    row.solve_for(tag.marker);
                    row.basic = Some(tag.marker);
                    self.install(row);
                } else {
                    self.rows.recycle(row);
                }
            }
            None => {
                if !self.insert_with_artificial(row, &tag)? {
                    let description = self.describe(builder, relation);
                    for var in tag.variables() {
                        self.scrub(var);
                        self.variables.release(var);
                    }
                    return Err(self.infeasible(description));
                }
            }
        }

        for &var in &tag.folded {
            self.variables[var].retain_fold();
        }
        let id = ConstraintId(self.next_constraint);
        self.next_constraint += 1;
        self.constraints.insert(id, tag);
        self.record(|m| m.constraints += 1);
        debug!(
            constraint = %id,
            relation = %relation,
            strength = %builder.strength(),
            rows = self.active.len(),
            "constraint added"
        );
        Ok(id)
    }

    /// Phase-one insertion through an artificial slack variable.
    ///
    /// Returns `false` when the artificial objective cannot reach zero, in
    /// which case the row has been dropped and the tableau holds exactly
    /// the rows it held before.
    fn insert_with_artificial(&mut self, mut row: Row, tag: &Tag) -> Result<bool, SolverError> {
        self.record(|m| m.artificial_constraints += 1);
        let art = self.new_variable(VariableKind::Slack, None);
        row.basic = Some(art);
        self.artificial = Some(GoalRow::from_row(&row, Strength::Fixed));
        self.install(row);

        let outcome = self.optimize_objective(Objective::Artificial);
        let success = outcome.is_ok()
            && self
                .artificial
                .as_ref()
                .is_some_and(|goal| goal.constant().is_zero());
        self.artificial = None;

        if let Some(def) = self.variables[art].definition_row {
            let mut row = self.uninstall(def);
            if !success || row.is_empty() {
                self.rows.recycle(row);
            } else {
                match self.artificial_exit(&row, tag) {
                    Some(entering) => {
                        row.solve_for_pair(art, entering);
                        row.basic = Some(entering);
                        self.substitute(entering, &row);
                        self.install(row);
                    }
                    None => self.rows.recycle(row),
                }
            }
        }

        self.scrub(art);
        self.variables.release(art);
        outcome?;
        Ok(success)
    }

    /// Variable to make basic in a satisfied artificial row.
    fn artificial_exit(&self, row: &Row, tag: &Tag) -> Option<VariableId> {
        let kind_of = |var: VariableId| self.variables[var].kind();
        row.terms()
            .iter()
            .map(|(var, _)| *var)
            .find(|var| kind_of(*var).is_restricted())
            .or_else(|| {
                row.terms()
                    .iter()
                    .map(|(var, _)| *var)
                    .find(|var| kind_of(*var) == VariableKind::External)
            })
            .or_else(|| row.contains(tag.marker).then_some(tag.marker))
    }

    /// Drop a compiled row that was never installed, along with its variables.
    fn discard(&mut self, row: Row, tag: &Tag) {
        self.rows.recycle(row);
        for var in tag.variables() {
            self.scrub(var);
            self.variables.release(var);
        }
    }

    /// Reject a request that contradicts the hard rows without touching the tableau.
    pub(crate) fn reject(&mut self, builder: &RowBuilder, relation: Relation) -> SolverError {
        let description = self.describe(builder, relation);
        self.infeasible(description)
    }

    fn infeasible(&mut self, constraint: String) -> SolverError {
        self.record(|m| m.infeasible += 1);
        debug!(constraint = constraint.as_str(), "infeasible constraint rejected");
        SolverError::Infeasible { constraint }
    }

    /// Remove a constraint, keeping the tableau basic-feasible.
    pub(crate) fn remove_constraint(&mut self, id: ConstraintId) -> Result<(), SolverError> {
        let tag = self
            .constraints
            .shift_remove(&id)
            .ok_or(SolverError::UnknownConstraint(id))?;

        for &var in &tag.folded {
            self.variables[var].release_fold();
        }
        for var in tag.variables() {
            if self.variables[var].kind() == VariableKind::Error {
                self.remove_error_effects(var);
            }
        }

        let marker = tag.marker;
        if let Some(def) = self.variables[marker].definition_row {
            let row = self.uninstall(def);
            self.rows.recycle(row);
        } else if let Some(leaving) = self.marker_leaving_row(marker) {
            let mut row = self.uninstall(leaving);
            match row.basic.take() {
                Some(basic) => row.solve_for_pair(basic, marker),
                None => row.solve_for(marker),
            }
            row.basic = Some(marker);
            self.substitute(marker, &row);
            self.rows.recycle(row);
        }

        for var in tag.variables() {
            self.scrub(var);
            self.variables.release(var);
        }

        debug!(constraint = %id, rows = self.active.len(), "constraint removed");
        Ok(())
    }

    /// Subtract an error variable's penalty from the goal row.
    fn remove_error_effects(&mut self, var: VariableId) {
        let vector = *self.variables[var].strength_vector();
        match self.variables[var].definition_row {
            Some(def) => self.goal.add_row(&self.rows[def], &vector, -1.0),
            None => self.goal.add_term(var, &vector, -1.0),
        }
    }

    /// Row to pivot a non-basic marker into before dropping it.
    ///
    /// Restricted rows that the marker would drive negative come first (by
    /// minimum ratio), then the remaining restricted rows, then rows with an
    /// external basic variable. Ties go to the lowest basic variable id.
    fn marker_leaving_row(&self, marker: VariableId) -> Option<RowId> {
        let mut first: Option<(f64, VariableId, RowId)> = None;
        let mut second: Option<(f64, VariableId, RowId)> = None;
        let mut third: Option<(VariableId, RowId)> = None;

        for &row_id in self.variables[marker].row_refs() {
            let row = &self.rows[row_id];
            let Some(basic) = row.basic() else {
                continue;
            };
            let coeff = row.coefficient(marker);
            if near_zero(coeff) {
                continue;
            }
            if self.variables[basic].kind() == VariableKind::External {
                if third.map_or(true, |(current, _)| basic < current) {
                    third = Some((basic, row_id));
                }
            } else if coeff < 0.0 {
                let ratio = -row.constant() / coeff;
                if ratio_wins(ratio, basic, first) {
                    first = Some((ratio, basic, row_id));
                }
            } else {
                let ratio = row.constant() / coeff;
                if ratio_wins(ratio, basic, second) {
                    second = Some((ratio, basic, row_id));
                }
            }
        }

        first
            .or(second)
            .map(|(_, _, row)| row)
            .or(third.map(|(_, row)| row))
    }

    /// Render a builder as `terms + constant REL 0 (strength)`.
    fn describe(&self, builder: &RowBuilder, relation: Relation) -> String {
        let mut out = String::new();
        let terms = builder.terms().iter().map(|&(var, coeff)| (self.label(var), coeff));
        let _ = write_expression(&mut out, terms, builder.constant(), false);
        let _ = write!(out, " {} 0 ({})", relation, builder.strength());
        out
    }

    pub(crate) fn label(&self, var: VariableId) -> String {
        self.variables
            .get(var)
            .map_or_else(|| var.to_string(), |v| v.label())
    }

    /// Render one row as `basic = constant + terms`.
    pub(crate) fn write_row(&self, f: &mut impl fmt::Write, row: &Row) -> fmt::Result {
        match row.basic() {
            Some(basic) => write!(f, "{} = ", self.label(basic))?,
            None => f.write_str("0 = ")?,
        }
        let terms = row.terms().iter().map(|&(var, coeff)| (self.label(var), coeff));
        write_expression(f, terms, row.constant(), true)
    }

    /// Check the tableau invariants, panicking with a description on failure.
    #[cfg(test)]
    pub(crate) fn assert_consistent(&self) {
        for row in self.active_rows() {
            let basic = row.basic().expect("active row without basic variable");
            assert_eq!(self.variables[basic].definition_row, Some(row.id()));
            assert!(!row.contains(basic), "basic variable among its own terms");
            if self.variables[basic].kind().is_restricted() {
                assert!(
                    row.constant() >= -1e-6,
                    "restricted row {} is infeasible: {}",
                    row.id(),
                    row.constant()
                );
            }
            for &(var, _) in row.terms() {
                assert!(self.variables.is_live(var), "row references released {}", var);
                assert!(!self.variables[var].is_basic(), "row references basic {}", var);
                assert!(self.variables[var].row_refs().contains(&row.id()));
            }
        }
        for var in self.variables.iter() {
            for row in var.row_refs() {
                assert!(self.active.contains(row));
                assert!(self.rows[*row].contains(var.id()));
            }
        }
        for (var, _) in self.goal.terms() {
            assert!(!self.variables[var].is_basic(), "goal references basic {}", var);
        }
    }
}

/// Whether `(ratio, basic)` beats the current best candidate.
pub(crate) fn ratio_wins(ratio: f64, basic: VariableId, best: Option<(f64, VariableId, RowId)>) -> bool {
    match best {
        None => true,
        Some((current, current_basic, _)) => {
            if near_zero(ratio - current) {
                basic < current_basic
            } else {
                ratio < current
            }
        }
    }
}

/// Write `Σ coeff·label` and a constant, e.g. `5 + s1 - 2 x3`.
pub(crate) fn write_expression(
    f: &mut impl fmt::Write,
    terms: impl Iterator<Item = (String, f64)>,
    constant: f64,
    constant_first: bool,
) -> fmt::Result {
    let mut empty = true;
    if constant_first {
        write!(f, "{}", constant)?;
        empty = false;
    }
    for (label, coeff) in terms {
        let magnitude = coeff.abs();
        match (empty, coeff < 0.0) {
            (true, false) => {}
            (true, true) => f.write_str("-")?,
            (false, false) => f.write_str(" + ")?,
            (false, true) => f.write_str(" - ")?,
        }
        if magnitude != 1.0 {
            write!(f, "{} ", magnitude)?;
        }
        f.write_str(&label)?;
        empty = false;
    }
    if !constant_first {
        if empty {
            write!(f, "{}", constant)?;
        } else if constant < 0.0 {
            write!(f, " - {}", -constant)?;
        } else if constant > 0.0 {
            write!(f, " + {}", constant)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tableau() -> Tableau {
        Tableau::new(SolverConfig::default())
    }

    fn external(t: &mut Tableau, name: &str) -> VariableId {
        t.new_variable(VariableKind::External, Some(name))
    }

    #[test]
    fn test_external_subject_fast_path() {
        let mut t = tableau();
        let x = external(&mut t, "x");
        let row = RowBuilder::new().with_term(x, 1.0).with_constant(-5.0);
        t.add_constraint(&row, Relation::Eq).unwrap();

        assert!(t.variables[x].is_basic());
        assert_eq!(t.value(x), 5.0);
        assert_eq!(t.metrics.simple_constraints, 1);
        t.assert_consistent();
    }

    #[test]
    fn test_basic_variables_are_substituted_on_compile() {
        let mut t = tableau();
        let x = external(&mut t, "x");
        let y = external(&mut t, "y");
        t.add_constraint(&RowBuilder::new().with_term(x, 1.0).with_constant(-10.0), Relation::Eq)
            .unwrap();
        // y = x + 5
        t.add_constraint(
            &RowBuilder::new().with_term(y, 1.0).with_term(x, -1.0).with_constant(-5.0),
            Relation::Eq,
        )
        .unwrap();

        assert_eq!(t.value(y), 15.0);
        let y_row = &t.rows[t.variables[y].definition_row.unwrap()];
        assert!(!y_row.contains(x));
        t.assert_consistent();
    }

    #[test]
    fn test_conflicting_hard_equalities_are_rejected() {
        let mut t = tableau();
        let x = external(&mut t, "x");
        t.add_constraint(&RowBuilder::new().with_term(x, 1.0).with_constant(-5.0), Relation::Eq)
            .unwrap();
        let live = t.variables.live_count();
        let rows = t.rows.live_count();

        let err = t
            .add_constraint(&RowBuilder::new().with_term(x, 1.0).with_constant(-6.0), Relation::Eq)
            .unwrap_err();
        assert!(err.is_infeasible());
        assert_eq!(err.to_string(), "Infeasible constraint: x1 - 6 = 0 (fixed)");
        assert_eq!(t.variables.live_count(), live);
        assert_eq!(t.rows.live_count(), rows);
        assert_eq!(t.value(x), 5.0);
        t.assert_consistent();
    }

    #[test]
    fn test_redundant_hard_equality_is_accepted() {
        let mut t = tableau();
        let x = external(&mut t, "x");
        let first = t
            .add_constraint(&RowBuilder::new().with_term(x, 1.0).with_constant(-5.0), Relation::Eq)
            .unwrap();
        let second = t
            .add_constraint(&RowBuilder::new().with_term(x, 1.0).with_constant(-5.0), Relation::Eq)
            .unwrap();
        t.assert_consistent();

        t.remove_constraint(first).unwrap();
        t.assert_consistent();
        assert_eq!(t.value(x), 5.0);

        t.remove_constraint(second).unwrap();
        t.assert_consistent();
        assert_eq!(t.value(x), 0.0);
    }

    #[test]
    fn test_hard_inequality_conflict_uses_artificial_phase() {
        let mut t = tableau();
        let x = external(&mut t, "x");
        t.add_constraint(&RowBuilder::new().with_term(x, 1.0).with_constant(-5.0), Relation::Eq)
            .unwrap();

        // x >= 10 contradicts x = 5
        let err = t
            .add_constraint(&RowBuilder::new().with_term(x, 1.0).with_constant(-10.0), Relation::Ge)
            .unwrap_err();
        assert!(err.is_infeasible());
        assert_eq!(t.metrics.artificial_constraints, 1);
        assert_eq!(t.constraint_count(), 1);
        t.assert_consistent();

        // x <= 10 is fine
        t.add_constraint(&RowBuilder::new().with_term(x, 1.0).with_constant(-10.0), Relation::Le)
            .unwrap();
        assert_eq!(t.value(x), 5.0);
        t.assert_consistent();
    }

    #[test]
    fn test_soft_constraint_adds_error_pair_to_goal() {
        let mut t = tableau();
        let x = external(&mut t, "x");
        let row = RowBuilder::new()
            .with_term(x, 1.0)
            .with_constant(-3.0)
            .with_strength(Strength::Medium);
        t.add_constraint(&row, Relation::Eq).unwrap();

        let errors: Vec<_> = t
            .variables
            .iter()
            .filter(|v| v.kind() == VariableKind::Error)
            .map(|v| v.strength())
            .collect();
        assert_eq!(errors, vec![Strength::Medium, Strength::Medium]);
        assert_eq!(t.goal.len(), 2);
        t.assert_consistent();
    }

    #[test]
    fn test_remove_releases_constraint_variables() {
        let mut t = tableau();
        let x = external(&mut t, "x");
        let y = external(&mut t, "y");
        let keep = t
            .add_constraint(&RowBuilder::new().with_term(x, 1.0).with_constant(-1.0), Relation::Ge)
            .unwrap();
        let soft = t
            .add_constraint(
                &RowBuilder::new()
                    .with_term(y, 1.0)
                    .with_term(x, -1.0)
                    .with_strength(Strength::Low),
                Relation::Eq,
            )
            .unwrap();
        t.assert_consistent();

        t.remove_constraint(soft).unwrap();
        t.assert_consistent();
        assert!(t.goal.is_empty());
        assert_eq!(t.variables.live_count(), 3);
        assert!(t.contains_constraint(keep));
        assert_eq!(
            t.remove_constraint(soft),
            Err(SolverError::UnknownConstraint(soft))
        );
    }

    #[test]
    fn test_folds_are_counted_per_accepted_constraint() {
        let mut t = tableau();
        let x = external(&mut t, "x");
        let y = external(&mut t, "y");
        t.variables[x].pin(40.0);

        // y = x + 10
        let sum = t
            .add_constraint(
                &RowBuilder::new().with_term(y, 1.0).with_term(x, -1.0).with_constant(-10.0),
                Relation::Eq,
            )
            .unwrap();
        assert_eq!(t.variables[x].fold_count(), 1);
        assert_eq!(t.value(y), 50.0);

        // y = x contradicts it and must not count
        let err = t
            .add_constraint(&RowBuilder::new().with_term(y, 1.0).with_term(x, -1.0), Relation::Eq)
            .unwrap_err();
        assert!(err.is_infeasible());
        assert_eq!(t.variables[x].fold_count(), 1);

        t.remove_constraint(sum).unwrap();
        assert_eq!(t.variables[x].fold_count(), 0);
        t.assert_consistent();
    }

    #[test]
    fn test_unknown_variable_is_reported() {
        let mut t = tableau();
        let row = RowBuilder::new().with_term(VariableId(42), 1.0);
        assert_eq!(
            t.add_constraint(&row, Relation::Eq),
            Err(SolverError::UnknownVariable(VariableId(42)))
        );
        assert_eq!(t.rows.live_count(), 0);
    }

    #[test]
    fn test_write_expression() {
        let mut out = String::new();
        let terms = vec![("x".to_string(), 1.0), ("y".to_string(), -2.0)].into_iter();
        write_expression(&mut out, terms, -4.0, false).unwrap();
        assert_eq!(out, "x - 2 y - 4");

        let mut out = String::new();
        let terms = vec![("s".to_string(), -1.0)].into_iter();
        write_expression(&mut out, terms, 5.0, true).unwrap();
        assert_eq!(out, "5 - s");

        let mut out = String::new();
        write_expression(&mut out, std::iter::empty(), 3.5, false).unwrap();
        assert_eq!(out, "3.5");
    }

    #[test]
    fn test_ratio_wins_breaks_ties_by_id() {
        let best = Some((2.0, VariableId(5), RowId(0)));
        assert!(ratio_wins(1.0, VariableId(9), best));
        assert!(ratio_wins(2.0, VariableId(3), best));
        assert!(!ratio_wins(2.0, VariableId(7), best));
        assert!(!ratio_wins(3.0, VariableId(1), best));
        assert!(ratio_wins(3.0, VariableId(1), None));
    }
}
