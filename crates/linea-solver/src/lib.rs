//! Incremental constraint solving for layout.
//!
//! This crate implements:
//! - An incremental simplex tableau with per-constraint marker variables
//! - A lexicographic goal row ranking violations by strength tier
//! - Constraint insertion, removal, and value pinning without re-solving from scratch
//! - Pooled variables and rows that survive [`LinearSystem::reset`]

mod builder;
mod goal;
mod helpers;
mod metrics;
mod optimizer;
mod row;
mod system;
mod tableau;
mod variable;

pub use builder::RowBuilder;
pub use goal::GoalRow;
pub use metrics::Metrics;
pub use row::{Row, RowPool};
pub use system::{LinearSystem, PoolStats, SolverState};
pub use variable::{Variable, VariablePool};

pub use linea_core::{
    ConstraintId, Relation, RowId, SolverConfig, SolverError, Strength, StrengthVector,
    VariableId, VariableKind,
};
