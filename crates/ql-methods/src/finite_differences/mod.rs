//! Finite difference methods for PDE-based option pricing.
//!
//! Translates the core of `ql/methods/finitedifferences/`: tridiagonal
//! operators and their algebra, theta time stepping with boundary-condition
//! hooks, step conditions, the backward rollback model, Black-Scholes
//! operator generation and the parallel evolver for systems of grids.
//!
//! # Overview
//!
//! * [`TridiagonalOperator`]: three-band operator with an O(N) solve
//! * [`MixedScheme`]: theta scheme (explicit, implicit, Crank-Nicolson)
//! * [`FiniteDifferenceModel`]: rollback with step conditions and stopping
//!   times
//! * [`ParallelEvolver`]: a system of schemes stepped together on rayon
//! * [`OperatorFactory`]: Black-Scholes operators on a log grid
//! * [`FdBlackScholesSolver`]: vanilla option driver

pub mod boundary_condition;
pub mod bsm_operator;
pub mod difference_operators;
pub mod finite_difference_model;
pub mod mixed_scheme;
pub mod operator;
pub mod parallel_evolver;
pub mod payoff;
pub mod pde;
pub mod sampled_curve;
pub mod solver;
pub mod step_condition;
pub mod tridiagonal_operator;

pub use boundary_condition::{
    BoundaryCondition, BoundaryConditionSet, BoundaryConditions, BoundarySide, DirichletBc,
    NeumannBc,
};
pub use bsm_operator::{bsm_operator, bsm_operator_from_process, bsm_term_operator, OperatorFactory};
pub use difference_operators::{d_minus, d_plus, d_plus_d_minus, d_zero};
pub use finite_difference_model::{
    AnchoredCondition, FiniteDifferenceModel, StandardFiniteDifferenceModel,
    StandardSystemFiniteDifferenceModel,
};
pub use mixed_scheme::{Evolver, MixedScheme};
pub use operator::Operator;
pub use parallel_evolver::ParallelEvolver;
pub use payoff::{OptionType, Payoff, PlainVanillaPayoff};
pub use pde::{GenericTimeSetter, PdeBsm, PdeConstantCoeff, PdeSecondOrderParabolic};
pub use sampled_curve::SampledCurve;
pub use solver::{ExerciseStyle, FdBlackScholesSolver, FdResult};
pub use step_condition::{
    AmericanCondition, CurveItem, NullCondition, ShoutCondition, StepCondition, StepConditionSet,
};
pub use tridiagonal_operator::{TimeSetter, TridiagonalOperator};

use ql_core::{Real, Size};

// ─── FDM scheme selection ─────────────────────────────────────────────────────

/// Finite difference time-stepping scheme.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FdmScheme {
    /// Explicit Euler (`θ = 0`): conditionally stable.
    Explicit,
    /// Implicit Euler (`θ = 1`): unconditionally stable, first order.
    Implicit,
    /// Crank-Nicolson (`θ = ½`): second order in time.
    #[default]
    CrankNicolson,
    /// Any other weight in `[0, 1]`.
    Theta(Real),
}

impl FdmScheme {
    /// The theta weight of the scheme.
    pub fn theta(self) -> Real {
        match self {
            FdmScheme::Explicit => 0.0,
            FdmScheme::Implicit => 1.0,
            FdmScheme::CrankNicolson => 0.5,
            FdmScheme::Theta(theta) => theta,
        }
    }
}

// ─── Solver settings ──────────────────────────────────────────────────────────

/// Grid and scheme configuration for [`FdBlackScholesSolver`].
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct FdmSettings {
    /// Spatial grid points (raised to a maturity-dependent minimum).
    pub grid_points: Size,
    /// Uniform time steps of the rollback.
    pub time_steps: Size,
    /// Time-stepping scheme.
    pub scheme: FdmScheme,
    /// Regenerate the operator from the process at every step.
    pub time_dependent: bool,
}

impl Default for FdmSettings {
    fn default() -> Self {
        Self {
            grid_points: 100,
            time_steps: 100,
            scheme: FdmScheme::CrankNicolson,
            time_dependent: false,
        }
    }
}

impl FdmSettings {
    /// Set the number of grid points.
    pub fn with_grid_points(mut self, grid_points: Size) -> Self {
        self.grid_points = grid_points;
        self
    }

    /// Set the number of time steps.
    pub fn with_time_steps(mut self, time_steps: Size) -> Self {
        self.time_steps = time_steps;
        self
    }

    /// Set the scheme.
    pub fn with_scheme(mut self, scheme: FdmScheme) -> Self {
        self.scheme = scheme;
        self
    }

    /// Use the time-dependent operator.
    pub fn with_time_dependent(mut self, time_dependent: bool) -> Self {
        self.time_dependent = time_dependent;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scheme_weights() {
        assert_eq!(FdmScheme::Explicit.theta(), 0.0);
        assert_eq!(FdmScheme::Implicit.theta(), 1.0);
        assert_eq!(FdmScheme::default().theta(), 0.5);
        assert_eq!(FdmScheme::Theta(0.3).theta(), 0.3);
    }

    #[test]
    fn settings_builder() {
        let s = FdmSettings::default()
            .with_grid_points(301)
            .with_time_steps(50)
            .with_scheme(FdmScheme::Implicit)
            .with_time_dependent(true);
        assert_eq!(s.grid_points, 301);
        assert_eq!(s.time_steps, 50);
        assert_eq!(s.scheme, FdmScheme::Implicit);
        assert!(s.time_dependent);
        assert_eq!(FdmSettings::default().grid_points, 100);
    }

    #[test]
    fn invalid_theta_is_caught_by_the_scheme() {
        let l = TridiagonalOperator::new(3).unwrap();
        assert!(MixedScheme::new(l, FdmScheme::Theta(1.2).theta(), Vec::new()).is_err());
    }
}
