//! The priority goal row.
//!
//! The goal row is the objective being minimized. Instead of a scalar
//! coefficient per variable it keeps a [`StrengthVector`], so a single row
//! encodes one objective per strength tier.

use indexmap::IndexMap;
use linea_core::{Strength, StrengthVector, VariableId};

use crate::row::Row;

/// Lexicographic objective: `constant + Σ vector·var` over non-basic variables.
#[derive(Debug, Clone, Default)]
pub struct GoalRow {
    terms: IndexMap<VariableId, StrengthVector>,
    constant: StrengthVector,
}

impl GoalRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scalar objective equal to `row`, placed in a single tier.
    ///
    /// Used for the artificial objective of phase-one insertion.
    pub(crate) fn from_row(row: &Row, tier: Strength) -> Self {
        let unit = StrengthVector::unit(tier);
        let mut goal = Self::new();
        goal.constant = unit.scaled(row.constant());
        for &(var, coeff) in row.terms() {
            goal.add_term(var, &unit, coeff);
        }
        goal
    }

    /// Current objective value per tier.
    pub fn constant(&self) -> &StrengthVector {
        &self.constant
    }

    pub fn coefficient(&self, var: VariableId) -> StrengthVector {
        self.terms.get(&var).copied().unwrap_or(StrengthVector::ZERO)
    }

    pub fn terms(&self) -> impl Iterator<Item = (VariableId, &StrengthVector)> {
        self.terms.iter().map(|(var, vector)| (*var, vector))
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// `goal[var] += vector * factor`.
    pub(crate) fn add_term(&mut self, var: VariableId, vector: &StrengthVector, factor: f64) {
        let entry = self.terms.entry(var).or_insert(StrengthVector::ZERO);
        entry.add_scaled(vector, factor);
        if entry.is_zero() {
            self.terms.swap_remove(&var);
        }
    }

    /// `goal += vector * factor * row`, treating the row as `constant + Σ`.
    pub(crate) fn add_row(&mut self, row: &Row, vector: &StrengthVector, factor: f64) {
        self.constant.add_scaled(vector, factor * row.constant());
        for &(var, coeff) in row.terms() {
            self.add_term(var, vector, factor * coeff);
        }
    }

    pub(crate) fn remove_term(&mut self, var: VariableId) -> Option<StrengthVector> {
        self.terms.swap_remove(&var)
    }

    /// Replace `var` by the right-hand side of its defining row.
    pub(crate) fn substitute(&mut self, var: VariableId, definition: &Row) {
        if let Some(vector) = self.remove_term(var) {
            self.add_row(definition, &vector, 1.0);
        }
    }

    pub(crate) fn clear(&mut self) {
        self.terms.clear();
        self.constant = StrengthVector::ZERO;
    }
}
