//! Core types, strengths, and errors for the linea constraint solver.
//!
//! This crate provides the vocabulary shared by the solver and its callers:
//! - Stable identifiers for variables, rows, and constraints
//! - The ordered strength scale and per-tier strength vectors
//! - Variable kinds and constraint relations
//! - Error types
//! - Solver configuration

pub mod config;
pub mod errors;
pub mod ids;
pub mod strength;

pub use config::*;
pub use errors::*;
pub use ids::*;
pub use strength::*;

/// Tolerance for floating-point comparisons inside the tableau.
pub const EPSILON: f64 = 1e-8;

/// Near-zero check for tableau coefficients.
#[inline]
pub fn near_zero(value: f64) -> bool {
    value.abs() < EPSILON
}
