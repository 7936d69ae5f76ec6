//! Evolution of a system of independent grids under a common clock
//! (translates `ql/methods/finitedifferences/parallelevolver.hpp`).
//!
//! Each operator gets its own [`MixedScheme`] with its own boundary
//! conditions. Within a step no data flows between the schemes, so they are
//! stepped on the rayon pool; the step returns only once every scheme has
//! finished.

use rayon::prelude::*;

use ql_core::{ensure_size, Real, Result, Time};
use ql_math::Array;

use super::boundary_condition::BoundaryConditionSet;
use super::mixed_scheme::{Evolver, MixedScheme};
use super::operator::Operator;

/// A set of [`MixedScheme`]s stepped together.
///
/// Corresponds to `QuantLib::ParallelEvolver`.
pub struct ParallelEvolver<O: Operator> {
    schemes: Vec<MixedScheme<O>>,
}

impl<O: Operator> ParallelEvolver<O> {
    /// Crank-Nicolson schemes, one per operator.
    pub fn new(operators: Vec<O>, bcs: BoundaryConditionSet<O>) -> Result<Self> {
        Self::with_theta(operators, bcs, 0.5)
    }

    /// Schemes with an explicit theta weight.
    pub fn with_theta(operators: Vec<O>, bcs: BoundaryConditionSet<O>, theta: Real) -> Result<Self> {
        ensure_size!(bcs.len(), operators.len());
        let schemes = operators
            .into_iter()
            .zip(bcs.into_inner())
            .map(|(l, bcs)| MixedScheme::new(l, theta, bcs))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { schemes })
    }

    /// Number of grids in the system.
    pub fn len(&self) -> usize {
        self.schemes.len()
    }

    /// Whether the system is empty.
    pub fn is_empty(&self) -> bool {
        self.schemes.is_empty()
    }

    /// The wrapped schemes.
    pub fn schemes(&self) -> &[MixedScheme<O>] {
        &self.schemes
    }
}

impl<O: Operator> Evolver for ParallelEvolver<O> {
    type Values = Vec<Array>;

    fn set_step(&mut self, dt: Time) -> Result<()> {
        self.schemes.iter_mut().try_for_each(|s| s.set_step(dt))
    }

    fn step(&mut self, values: &mut Vec<Array>, t: Time) -> Result<()> {
        ensure_size!(values.len(), self.schemes.len());
        self.schemes
            .par_iter_mut()
            .zip(values.par_iter_mut())
            .try_for_each(|(scheme, v)| scheme.step(v, t))
    }
}
