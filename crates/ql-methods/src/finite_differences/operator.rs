//! The discretised-operator contract.
//!
//! Schemes, evolvers and models are written once against [`Operator`] and
//! instantiated per concrete representation at compile time.

use ql_core::{Real, Result, Size, Time};
use ql_math::Array;

/// A discretised linear spatial operator acting on grid vectors.
///
/// Corresponds to the operator concept required by QuantLib's
/// `MixedScheme<Operator>`.
///
/// Time-dependent operators regenerate their coefficients in place on
/// [`set_time`](Operator::set_time); an instance must therefore be owned by
/// a single evolution. Clone it before evolving two grids with it.
pub trait Operator: Clone + Send + Sync {
    /// Number of grid points the operator acts on.
    fn size(&self) -> Size;

    /// Whether [`set_time`](Operator::set_time) changes the coefficients.
    fn is_time_dependent(&self) -> bool;

    /// Regenerate the coefficients for time `t`; a no-op when the operator
    /// is not time dependent.
    fn set_time(&mut self, t: Time) -> Result<()>;

    /// The identity operator of the given size, in this representation.
    fn identity(&self, size: Size) -> Result<Self>;

    /// `L · v`.
    fn apply_to(&self, v: &Array) -> Result<Array>;

    /// Solve `L · x = rhs` for `x`.
    fn solve_for(&self, rhs: &Array) -> Result<Array>;

    /// `self + other`. The result is not time dependent.
    fn add(&self, other: &Self) -> Result<Self>;

    /// `self − other`. The result is not time dependent.
    fn subtract(&self, other: &Self) -> Result<Self>;

    /// `a · self`. The result is not time dependent.
    fn multiply(&self, a: Real) -> Self;

    /// Exchange the full state of two operators in place.
    fn swap(&mut self, other: &mut Self);
}
