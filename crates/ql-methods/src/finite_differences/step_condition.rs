//! Step conditions (translates `ql/methods/finitedifferences/stepcondition.hpp`,
//! `stepconditionset.hpp`, `americancondition.hpp` and `shoutcondition.hpp`).
//!
//! A step condition adjusts the grid once per time step, after the scheme
//! has produced the values for that time. Conditions never change the length
//! of the grid.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use ql_core::{ensure_size, Rate, Real, Result, Time};
use ql_math::Array;

use super::payoff::{OptionType, Payoff, PlainVanillaPayoff};

/// A per-step, path-dependent adjustment of a grid of type `A`.
///
/// Corresponds to `QuantLib::StepCondition<array_type>`.
pub trait StepCondition<A>: Send + Sync {
    /// Adjust `values`, which hold the solution at time `t`.
    fn apply_to(&self, values: &mut A, t: Time) -> Result<()>;
}

// ─── Null condition ───────────────────────────────────────────────────────────

/// Leaves the grid untouched.
pub struct NullCondition<A>(PhantomData<fn(&mut A)>);

impl<A> NullCondition<A> {
    /// Create a null condition.
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<A> Default for NullCondition<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> fmt::Debug for NullCondition<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("NullCondition")
    }
}

impl<A> StepCondition<A> for NullCondition<A> {
    fn apply_to(&self, _values: &mut A, _t: Time) -> Result<()> {
        Ok(())
    }
}

// ─── Condition set ────────────────────────────────────────────────────────────

/// One condition per grid of a system, applied pairwise.
///
/// Corresponds to `QuantLib::StepConditionSet`.
pub struct StepConditionSet<A> {
    conditions: Vec<Box<dyn StepCondition<A>>>,
}

impl<A> StepConditionSet<A> {
    /// An empty set.
    pub fn new() -> Self {
        Self {
            conditions: Vec::new(),
        }
    }

    /// Append the condition for the next grid.
    pub fn push(&mut self, condition: Box<dyn StepCondition<A>>) {
        self.conditions.push(condition);
    }

    /// Number of conditions.
    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }
}

impl<A> Default for StepConditionSet<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> StepCondition<Vec<A>> for StepConditionSet<A> {
    fn apply_to(&self, values: &mut Vec<A>, t: Time) -> Result<()> {
        ensure_size!(values.len(), self.conditions.len());
        for (condition, a) in self.conditions.iter().zip(values.iter_mut()) {
            condition.apply_to(a, t)?;
        }
        Ok(())
    }
}

// ─── Curve-dependent conditions ───────────────────────────────────────────────

/// The reference curve a curve-dependent condition compares the grid with.
#[derive(Clone)]
pub enum CurveItem {
    /// Fixed values sampled on the same grid points.
    Values(Array),
    /// A payoff evaluated at each grid point's underlying value.
    Payoff {
        /// The payoff.
        payoff: Arc<dyn Payoff>,
        /// Underlying value of every grid point.
        underlying: Array,
    },
}

impl CurveItem {
    /// A vanilla payoff sampled at `underlying`.
    pub fn vanilla(option_type: OptionType, strike: Real, underlying: Array) -> Self {
        CurveItem::Payoff {
            payoff: Arc::new(PlainVanillaPayoff::new(option_type, strike)),
            underlying,
        }
    }

    /// Number of grid points the curve covers.
    pub fn size(&self) -> usize {
        match self {
            CurveItem::Values(v) => v.size(),
            CurveItem::Payoff { underlying, .. } => underlying.size(),
        }
    }

    /// Curve value at grid point `i`.
    pub fn value(&self, i: usize) -> Real {
        match self {
            CurveItem::Values(v) => v[i],
            CurveItem::Payoff { payoff, underlying } => payoff.value(underlying[i]),
        }
    }

    /// Replace every `values[i]` with `f(values[i], curve[i])`.
    pub fn apply<F: Fn(Real, Real) -> Real>(&self, values: &mut Array, f: F) -> Result<()> {
        ensure_size!(values.size(), self.size());
        for (i, v) in values.iter_mut().enumerate() {
            *v = f(*v, self.value(i));
        }
        Ok(())
    }
}

impl fmt::Debug for CurveItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CurveItem::Values(v) => f.debug_tuple("Values").field(v).finish(),
            CurveItem::Payoff { underlying, .. } => f
                .debug_struct("Payoff")
                .field("underlying", underlying)
                .finish_non_exhaustive(),
        }
    }
}

impl From<Array> for CurveItem {
    fn from(values: Array) -> Self {
        CurveItem::Values(values)
    }
}

/// Early-exercise floor: `max(current, intrinsic)`.
///
/// Corresponds to `QuantLib::AmericanCondition`.
#[derive(Debug, Clone)]
pub struct AmericanCondition {
    curve: CurveItem,
}

impl AmericanCondition {
    /// Floor the grid at `curve`.
    pub fn new(curve: impl Into<CurveItem>) -> Self {
        Self {
            curve: curve.into(),
        }
    }

    /// The exercise curve.
    pub fn curve(&self) -> &CurveItem {
        &self.curve
    }
}

impl StepCondition<Array> for AmericanCondition {
    fn apply_to(&self, values: &mut Array, _t: Time) -> Result<()> {
        self.curve.apply(values, Real::max)
    }
}

/// Right to lock in the discounted intrinsic value once during the option's
/// life: `max(current, disc · intrinsic)` with
/// `disc = exp(−rate · (t − res_time))` recomputed on every call.
///
/// Corresponds to `QuantLib::ShoutCondition`.
#[derive(Debug, Clone)]
pub struct ShoutCondition {
    curve: CurveItem,
    res_time: Time,
    rate: Rate,
}

impl ShoutCondition {
    /// Shout against `curve`, discounting from `res_time` at `rate`.
    pub fn new(curve: impl Into<CurveItem>, res_time: Time, rate: Rate) -> Self {
        Self {
            curve: curve.into(),
            res_time,
            rate,
        }
    }

    /// Shout on a vanilla payoff sampled at `underlying`.
    pub fn vanilla(
        option_type: OptionType,
        strike: Real,
        underlying: Array,
        res_time: Time,
        rate: Rate,
    ) -> Self {
        Self::new(CurveItem::vanilla(option_type, strike, underlying), res_time, rate)
    }

    /// Discount factor applied to the curve at time `t`.
    pub fn discount(&self, t: Time) -> Real {
        (-self.rate * (t - self.res_time)).exp()
    }
}

impl StepCondition<Array> for ShoutCondition {
    fn apply_to(&self, values: &mut Array, t: Time) -> Result<()> {
        let disc = self.discount(t);
        self.curve.apply(values, |current, intrinsic| current.max(disc * intrinsic))
    }
}
