//! Strength tiers, strength vectors, relations, and variable kinds.
//!
//! Constraint priorities are not weights on a single scalar objective.
//! Each tier is its own objective, and tiers are compared lexicographically
//! from [`Strength::Fixed`] down to [`Strength::None`].

use std::cmp::Ordering;
use std::fmt;

use crate::near_zero;

/// Number of priority tiers in the strength scale.
pub const STRENGTH_TIERS: usize = 9;

/// Constraint strength, ordered from weakest to strongest.
///
/// `Equality` and `Fixed` are hard: such constraints never get error
/// variables and a conflict between them is reported as infeasible. All
/// other tiers are soft, including `Barrier` and `Centering` which rank
/// above `Equality` when soft penalties are compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum Strength {
    None = 0,
    Low = 1,
    Medium = 2,
    High = 3,
    Highest = 4,
    Equality = 5,
    Barrier = 6,
    Centering = 7,
    #[default]
    Fixed = 8,
}

impl Strength {
    /// All tiers, weakest first.
    pub const ALL: [Strength; STRENGTH_TIERS] = [
        Strength::None,
        Strength::Low,
        Strength::Medium,
        Strength::High,
        Strength::Highest,
        Strength::Equality,
        Strength::Barrier,
        Strength::Centering,
        Strength::Fixed,
    ];

    /// Index of this tier in a [`StrengthVector`].
    #[inline]
    pub fn tier(self) -> usize {
        self as usize
    }

    /// Look up a tier by index.
    pub fn from_tier(tier: usize) -> Option<Self> {
        Self::ALL.get(tier).copied()
    }

    /// Whether constraints of this strength must hold exactly.
    #[inline]
    pub fn is_hard(self) -> bool {
        matches!(self, Strength::Equality | Strength::Fixed)
    }

    /// Lowercase tier name.
    pub fn name(self) -> &'static str {
        match self {
            Strength::None => "none",
            Strength::Low => "low",
            Strength::Medium => "medium",
            Strength::High => "high",
            Strength::Highest => "highest",
            Strength::Equality => "equality",
            Strength::Barrier => "barrier",
            Strength::Centering => "centering",
            Strength::Fixed => "fixed",
        }
    }
}

impl fmt::Display for Strength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One coefficient per strength tier, index 0 being [`Strength::None`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StrengthVector([f64; STRENGTH_TIERS]);

impl StrengthVector {
    /// The all-zero vector.
    pub const ZERO: StrengthVector = StrengthVector([0.0; STRENGTH_TIERS]);

    /// A vector with `1.0` at the given tier and zero elsewhere.
    pub fn unit(strength: Strength) -> Self {
        let mut tiers = [0.0; STRENGTH_TIERS];
        tiers[strength.tier()] = 1.0;
        Self(tiers)
    }

    /// Build a vector from raw tier coefficients.
    pub fn from_tiers(tiers: [f64; STRENGTH_TIERS]) -> Self {
        Self(tiers)
    }

    /// Coefficient at a tier.
    #[inline]
    pub fn get(&self, strength: Strength) -> f64 {
        self.0[strength.tier()]
    }

    /// Raw tier coefficients, weakest first.
    #[inline]
    pub fn tiers(&self) -> &[f64; STRENGTH_TIERS] {
        &self.0
    }

    /// `self += other * factor`, flushing near-zero tiers to exactly zero.
    pub fn add_scaled(&mut self, other: &StrengthVector, factor: f64) {
        for (tier, value) in self.0.iter_mut().enumerate() {
            let delta = other.0[tier];
            if delta == 0.0 {
                continue;
            }
            *value += delta * factor;
            if near_zero(*value) {
                *value = 0.0;
            }
        }
    }

    /// A copy of this vector multiplied by `factor`.
    pub fn scaled(&self, factor: f64) -> Self {
        let mut out = *self;
        for value in &mut out.0 {
            *value *= factor;
            if near_zero(*value) {
                *value = 0.0;
            }
        }
        out
    }

    /// Whether every tier is zero.
    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|v| near_zero(*v))
    }

    /// Sign of the vector read lexicographically from the strongest tier.
    ///
    /// `Less` means the vector is negative at the strongest tier where it is
    /// nonzero.
    pub fn lex_sign(&self) -> Ordering {
        for value in self.0.iter().rev() {
            if near_zero(*value) {
                continue;
            }
            return if *value < 0.0 {
                Ordering::Less
            } else {
                Ordering::Greater
            };
        }
        Ordering::Equal
    }

    /// Lexicographic comparison, strongest tier first.
    pub fn lex_cmp(&self, other: &StrengthVector) -> Ordering {
        for tier in (0..STRENGTH_TIERS).rev() {
            let diff = self.0[tier] - other.0[tier];
            if near_zero(diff) {
                continue;
            }
            return if diff < 0.0 {
                Ordering::Less
            } else {
                Ordering::Greater
            };
        }
        Ordering::Equal
    }
}

impl fmt::Display for StrengthVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (tier, value) in self.0.iter().enumerate() {
            if tier > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}", value)?;
        }
        f.write_str("]")
    }
}

/// The relation between a constraint expression and zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Relation {
    /// `expr = 0`
    Eq,
    /// `expr <= 0`
    Le,
    /// `expr >= 0`
    Ge,
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Relation::Eq => "=",
            Relation::Le => "<=",
            Relation::Ge => ">=",
        })
    }
}

/// The role a variable plays in the tableau.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum VariableKind {
    /// A caller-visible unknown, such as a widget edge. Unrestricted in sign.
    External,
    /// Non-negative variable introduced for an inequality.
    Slack,
    /// Non-negative variable that lets a soft constraint be violated at a cost.
    Error,
    /// A fixed value. Never enters the basis during optimization.
    Constant,
}

impl VariableKind {
    /// Slack and error variables must stay `>= 0`.
    #[inline]
    pub fn is_restricted(self) -> bool {
        matches!(self, VariableKind::Slack | VariableKind::Error)
    }

    /// Short prefix used when rendering unnamed variables.
    pub fn prefix(self) -> &'static str {
        match self {
            VariableKind::External => "x",
            VariableKind::Slack => "s",
            VariableKind::Error => "e",
            VariableKind::Constant => "k",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strength_order() {
        assert!(Strength::None < Strength::Low);
        assert!(Strength::Equality < Strength::Barrier);
        assert!(Strength::Centering < Strength::Fixed);
        assert_eq!(Strength::Fixed.tier(), STRENGTH_TIERS - 1);
        assert_eq!(Strength::from_tier(3), Some(Strength::High));
        assert_eq!(Strength::from_tier(STRENGTH_TIERS), None);
    }

    #[test]
    fn test_hard_strengths() {
        let hard: Vec<_> = Strength::ALL.iter().filter(|s| s.is_hard()).collect();
        assert_eq!(hard, vec![&Strength::Equality, &Strength::Fixed]);
        assert_eq!(Strength::default(), Strength::Fixed);
    }

    #[test]
    fn test_lex_sign_uses_strongest_tier() {
        let mut v = StrengthVector::ZERO;
        v.add_scaled(&StrengthVector::unit(Strength::Low), 5.0);
        v.add_scaled(&StrengthVector::unit(Strength::High), -1.0);
        assert_eq!(v.lex_sign(), Ordering::Less);

        v.add_scaled(&StrengthVector::unit(Strength::Fixed), 0.5);
        assert_eq!(v.lex_sign(), Ordering::Greater);

        assert_eq!(StrengthVector::ZERO.lex_sign(), Ordering::Equal);
    }

    #[test]
    fn test_lex_cmp() {
        let low = StrengthVector::unit(Strength::Low).scaled(100.0);
        let medium = StrengthVector::unit(Strength::Medium);
        assert_eq!(low.lex_cmp(&medium), Ordering::Less);
        assert_eq!(medium.lex_cmp(&low), Ordering::Greater);
        assert_eq!(medium.lex_cmp(&medium), Ordering::Equal);
    }

    #[test]
    fn test_add_scaled_flushes_noise() {
        let unit = StrengthVector::unit(Strength::Medium);
        let mut v = unit;
        v.add_scaled(&unit, -1.0 + 1e-12);
        assert!(v.is_zero());
        assert_eq!(v.get(Strength::Medium), 0.0);
    }

    #[test]
    fn test_variable_kind_restrictions() {
        assert!(VariableKind::Slack.is_restricted());
        assert!(VariableKind::Error.is_restricted());
        assert!(!VariableKind::External.is_restricted());
        assert!(!VariableKind::Constant.is_restricted());
    }
}
