//! # ql-methods
//!
//! Finite-difference PDE evolution: tridiagonal operators, theta schemes with
//! boundary-condition hooks, step conditions, the rollback model, the
//! Black-Scholes operator generators and the parallel evolver.
//!
//! Translates `ql/methods/finitedifferences/`.
//!
//! # Modules
//!
//! * [`finite_differences`]: operators, schemes, conditions, models, solver
//! * [`time_grid`]: time discretisation used by the rollback

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// ── Modules ───────────────────────────────────────────────────────────────────

/// Finite difference methods: operators, schemes, rollback, 1-D solver.
pub mod finite_differences;

/// Time grids.
pub mod time_grid;

// ── Convenience re-exports ────────────────────────────────────────────────────

pub use finite_differences::{
    FdBlackScholesSolver, FdmScheme, FdmSettings, FiniteDifferenceModel, MixedScheme, Operator,
    ParallelEvolver, TridiagonalOperator,
};
pub use time_grid::TimeGrid;
