//! Boundary conditions (translates
//! `ql/methods/finitedifferences/boundarycondition.hpp` and
//! `boundaryconditionset.hpp`).
//!
//! A boundary condition is consulted at four fixed points of every scheme
//! step: around the explicit multiply and around the implicit solve. All four
//! hooks are required.

use ql_core::{ensure, Real, Result, Time};
use ql_math::Array;

use super::operator::Operator;
use super::tridiagonal_operator::TridiagonalOperator;

/// Edge hooks for an operator type `O`.
///
/// Corresponds to `QuantLib::BoundaryCondition<Operator>`.
pub trait BoundaryCondition<O: Operator>: Send {
    /// Called with the current time at the start of every step.
    fn set_time(&mut self, t: Time);

    /// Adjust the explicit operator before it is applied.
    fn apply_before_applying(&self, op: &mut O) -> Result<()>;

    /// Fix up the vector produced by the explicit multiply.
    fn apply_after_applying(&self, values: &mut Array) -> Result<()>;

    /// Adjust the implicit operator and the right-hand side before solving.
    fn apply_before_solving(&self, op: &mut O, rhs: &mut Array) -> Result<()>;

    /// Fix up the vector produced by the implicit solve.
    fn apply_after_solving(&self, values: &mut Array) -> Result<()>;
}

/// Which end of the grid a condition acts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoundarySide {
    /// Index 0.
    Lower,
    /// Index `n − 1`.
    Upper,
}

fn edges(values: &Array) -> Result<usize> {
    let n = values.size();
    ensure!(n >= 2, "boundary condition needs at least 2 grid points, got {n}");
    Ok(n)
}

// ─── Neumann ──────────────────────────────────────────────────────────────────

/// Fixed first difference at one edge: `u[1] − u[0] = value` (lower) or
/// `u[n−1] − u[n−2] = value` (upper).
///
/// Corresponds to `QuantLib::NeumannBC`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NeumannBc {
    value: Real,
    side: BoundarySide,
}

impl NeumannBc {
    /// Create a Neumann condition.
    pub fn new(value: Real, side: BoundarySide) -> Self {
        Self { value, side }
    }

    /// The imposed difference.
    pub fn value(&self) -> Real {
        self.value
    }

    /// The edge acted on.
    pub fn side(&self) -> BoundarySide {
        self.side
    }

    fn set_row(&self, op: &mut TridiagonalOperator) -> Result<()> {
        match self.side {
            BoundarySide::Lower => op.set_first_row(-1.0, 1.0),
            BoundarySide::Upper => op.set_last_row(-1.0, 1.0),
        }
    }
}

impl BoundaryCondition<TridiagonalOperator> for NeumannBc {
    fn set_time(&mut self, _t: Time) {}

    fn apply_before_applying(&self, op: &mut TridiagonalOperator) -> Result<()> {
        self.set_row(op)
    }

    fn apply_after_applying(&self, values: &mut Array) -> Result<()> {
        let n = edges(values)?;
        match self.side {
            BoundarySide::Lower => values[0] = values[1] - self.value,
            BoundarySide::Upper => values[n - 1] = values[n - 2] + self.value,
        }
        Ok(())
    }

    fn apply_before_solving(&self, op: &mut TridiagonalOperator, rhs: &mut Array) -> Result<()> {
        let n = edges(rhs)?;
        self.set_row(op)?;
        match self.side {
            BoundarySide::Lower => rhs[0] = self.value,
            BoundarySide::Upper => rhs[n - 1] = self.value,
        }
        Ok(())
    }

    fn apply_after_solving(&self, _values: &mut Array) -> Result<()> {
        Ok(())
    }
}

// ─── Dirichlet ────────────────────────────────────────────────────────────────

/// Fixed value at one edge.
///
/// Corresponds to `QuantLib::DirichletBC`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirichletBc {
    value: Real,
    side: BoundarySide,
}

impl DirichletBc {
    /// Create a Dirichlet condition.
    pub fn new(value: Real, side: BoundarySide) -> Self {
        Self { value, side }
    }

    /// The imposed edge value.
    pub fn value(&self) -> Real {
        self.value
    }

    /// The edge acted on.
    pub fn side(&self) -> BoundarySide {
        self.side
    }

    fn set_row(&self, op: &mut TridiagonalOperator) -> Result<()> {
        match self.side {
            BoundarySide::Lower => op.set_first_row(1.0, 0.0),
            BoundarySide::Upper => op.set_last_row(0.0, 1.0),
        }
    }

    fn set_edge(&self, values: &mut Array) -> Result<()> {
        let n = edges(values)?;
        match self.side {
            BoundarySide::Lower => values[0] = self.value,
            BoundarySide::Upper => values[n - 1] = self.value,
        }
        Ok(())
    }
}

impl BoundaryCondition<TridiagonalOperator> for DirichletBc {
    fn set_time(&mut self, _t: Time) {}

    fn apply_before_applying(&self, op: &mut TridiagonalOperator) -> Result<()> {
        self.set_row(op)
    }

    fn apply_after_applying(&self, values: &mut Array) -> Result<()> {
        self.set_edge(values)
    }

    fn apply_before_solving(&self, op: &mut TridiagonalOperator, rhs: &mut Array) -> Result<()> {
        self.set_row(op)?;
        self.set_edge(rhs)
    }

    fn apply_after_solving(&self, _values: &mut Array) -> Result<()> {
        Ok(())
    }
}

// ─── Sets ─────────────────────────────────────────────────────────────────────

/// Boundary conditions owned by one scheme.
pub type BoundaryConditions<O> = Vec<Box<dyn BoundaryCondition<O>>>;

/// One list of boundary conditions per operator of a system.
///
/// Corresponds to `QuantLib::BoundaryConditionSet`.
pub struct BoundaryConditionSet<O: Operator> {
    sets: Vec<BoundaryConditions<O>>,
}

impl<O: Operator> BoundaryConditionSet<O> {
    /// An empty set.
    pub fn new() -> Self {
        Self { sets: Vec::new() }
    }

    /// Append the conditions for the next operator.
    pub fn push(&mut self, bcs: BoundaryConditions<O>) {
        self.sets.push(bcs);
    }

    /// Number of operators covered.
    pub fn len(&self) -> usize {
        self.sets.len()
    }

    /// Whether no operator is covered.
    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    /// The conditions for operator `i`.
    pub fn get(&self, i: usize) -> Option<&BoundaryConditions<O>> {
        self.sets.get(i)
    }

    pub(crate) fn into_inner(self) -> Vec<BoundaryConditions<O>> {
        self.sets
    }
}

impl<O: Operator> Default for BoundaryConditionSet<O> {
    fn default() -> Self {
        Self::new()
    }
}

impl<O: Operator> FromIterator<BoundaryConditions<O>> for BoundaryConditionSet<O> {
    fn from_iter<I: IntoIterator<Item = BoundaryConditions<O>>>(iter: I) -> Self {
        Self {
            sets: iter.into_iter().collect(),
        }
    }
}
