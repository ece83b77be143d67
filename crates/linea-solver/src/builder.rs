//! Constraint authoring.

use linea_core::{near_zero, Strength, VariableId};
use smallvec::SmallVec;

/// Accumulates `Σ coeff·var + constant` for a constraint against zero.
///
/// Duplicate variables are merged by summing their coefficients and terms
/// that cancel out are dropped. Rows are hard ([`Strength::Fixed`]) unless a
/// strength is set.
#[derive(Debug, Clone)]
pub struct RowBuilder {
    terms: SmallVec<[(VariableId, f64); 4]>,
    constant: f64,
    strength: Strength,
    errors: SmallVec<[(f64, Strength); 2]>,
}

impl Default for RowBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RowBuilder {
    pub fn new() -> Self {
        Self {
            terms: SmallVec::new(),
            constant: 0.0,
            strength: Strength::Fixed,
            errors: SmallVec::new(),
        }
    }

    /// Add `coeff·var`.
    pub fn add_term(&mut self, var: VariableId, coeff: f32) -> &mut Self {
        let coeff = coeff as f64;
        match self.terms.iter().position(|(v, _)| *v == var) {
            Some(pos) => {
                self.terms[pos].1 += coeff;
                if near_zero(self.terms[pos].1) {
                    self.terms.remove(pos);
                }
            }
            None if !near_zero(coeff) => self.terms.push((var, coeff)),
            None => {}
        }
        self
    }

    pub fn add_constant(&mut self, constant: f32) -> &mut Self {
        self.constant += constant as f64;
        self
    }

    pub fn set_strength(&mut self, strength: Strength) -> &mut Self {
        self.strength = strength;
        self
    }

    /// Add a single weighted error variable with coefficient `sign`.
    ///
    /// This lets a hard row absorb a one-sided violation at the given tier,
    /// on top of whatever the row's own strength introduces.
    pub fn add_error_term(&mut self, sign: f32, strength: Strength) -> &mut Self {
        if sign != 0.0 {
            self.errors.push((sign.signum() as f64, strength));
        }
        self
    }

    /// Chaining form of [`add_term`](Self::add_term).
    pub fn with_term(mut self, var: VariableId, coeff: f32) -> Self {
        self.add_term(var, coeff);
        self
    }

    /// Chaining form of [`add_constant`](Self::add_constant).
    pub fn with_constant(mut self, constant: f32) -> Self {
        self.add_constant(constant);
        self
    }

    /// Chaining form of [`set_strength`](Self::set_strength).
    pub fn with_strength(mut self, strength: Strength) -> Self {
        self.set_strength(strength);
        self
    }

    /// Chaining form of [`add_error_term`](Self::add_error_term).
    pub fn with_error_term(mut self, sign: f32, strength: Strength) -> Self {
        self.add_error_term(sign, strength);
        self
    }

    pub fn terms(&self) -> &[(VariableId, f64)] {
        &self.terms
    }

    pub fn constant(&self) -> f64 {
        self.constant
    }

    pub fn strength(&self) -> Strength {
        self.strength
    }

    pub(crate) fn error_terms(&self) -> &[(f64, Strength)] {
        &self.errors
    }

    pub fn clear(&mut self) {
        self.terms.clear();
        self.constant = 0.0;
        self.strength = Strength::Fixed;
        self.errors.clear();
    }
}
