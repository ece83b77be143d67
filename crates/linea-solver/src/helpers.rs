//! Shorthands for the relations layout code builds most often.

use linea_core::{ConstraintId, Relation, SolverError, Strength, VariableId};

use crate::system::LinearSystem;

impl LinearSystem {
    /// `a = b + margin`
    pub fn add_equality(
        &mut self,
        a: VariableId,
        b: VariableId,
        margin: f32,
        strength: Strength,
    ) -> Result<ConstraintId, SolverError> {
        self.add_relation(a, b, margin, Relation::Eq, strength)
    }

    /// `a >= b + margin`
    pub fn add_greater_than(
        &mut self,
        a: VariableId,
        b: VariableId,
        margin: f32,
        strength: Strength,
    ) -> Result<ConstraintId, SolverError> {
        self.add_relation(a, b, margin, Relation::Ge, strength)
    }

    /// `a <= b + margin`
    pub fn add_lower_than(
        &mut self,
        a: VariableId,
        b: VariableId,
        margin: f32,
        strength: Strength,
    ) -> Result<ConstraintId, SolverError> {
        self.add_relation(a, b, margin, Relation::Le, strength)
    }

    /// `a = value`
    pub fn add_equality_to_value(
        &mut self,
        a: VariableId,
        value: f32,
        strength: Strength,
    ) -> Result<ConstraintId, SolverError> {
        let row = self
            .create_row()
            .with_term(a, 1.0)
            .with_constant(-value)
            .with_strength(strength);
        self.add_constraint(row, Relation::Eq)
    }

    /// Split the free space between two gaps according to `bias`.
    ///
    /// The gaps are `a - b - margin_ab` and `c - d - margin_cd`; the row is
    /// `(1 - bias)·gap_ab = bias·gap_cd`. A bias of `0.5` centers, `0` keeps
    /// the first gap empty, `1` the second. The bias is clamped to `[0, 1]`.
    #[allow(clippy::too_many_arguments)]
    pub fn add_centering(
        &mut self,
        a: VariableId,
        b: VariableId,
        margin_ab: f32,
        bias: f32,
        c: VariableId,
        d: VariableId,
        margin_cd: f32,
        strength: Strength,
    ) -> Result<ConstraintId, SolverError> {
        let bias = bias.clamp(0.0, 1.0);
        let keep = 1.0 - bias;
        let row = self
            .create_row()
            .with_term(a, keep)
            .with_term(b, -keep)
            .with_term(c, -bias)
            .with_term(d, bias)
            .with_constant(bias * margin_cd - keep * margin_ab)
            .with_strength(strength);
        self.add_constraint(row, Relation::Eq)
    }

    /// `a - b = ratio·(c - d)`
    pub fn add_ratio(
        &mut self,
        a: VariableId,
        b: VariableId,
        c: VariableId,
        d: VariableId,
        ratio: f32,
        strength: Strength,
    ) -> Result<ConstraintId, SolverError> {
        let row = self
            .create_row()
            .with_term(a, 1.0)
            .with_term(b, -1.0)
            .with_term(c, -ratio)
            .with_term(d, ratio)
            .with_strength(strength);
        self.add_constraint(row, Relation::Eq)
    }

    fn add_relation(
        &mut self,
        a: VariableId,
        b: VariableId,
        margin: f32,
        relation: Relation,
        strength: Strength,
    ) -> Result<ConstraintId, SolverError> {
        let row = self
            .create_row()
            .with_term(a, 1.0)
            .with_term(b, -1.0)
            .with_constant(-margin)
            .with_strength(strength);
        self.add_constraint(row, relation)
    }
}
