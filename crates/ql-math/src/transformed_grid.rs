//! Transformed grids (translates `ql/math/transformedgrid.hpp`).
//!
//! A [`TransformedGrid`] keeps an underlying grid together with its image
//! under a monotone transform and the local spacings `dxm`, `dxp` and `dx`
//! of the transformed points. Finite-difference coefficient generators use
//! the spacings so that non-uniform grids are discretised correctly.
//!
//! [`LogGrid`] is the log-price instance: the Black-Scholes PDE has constant
//! coefficients in `ln S`, so it is discretised there.

use crate::array::Array;
use ql_core::{ensure, Error, Real, Result, Size};

/// A grid and its image under a transform, with the derived spacings.
///
/// For interior points `dxm[i] = y[i] - y[i-1]`, `dxp[i] = y[i+1] - y[i]`
/// and `dx[i] = dxm[i] + dxp[i]`; the end points carry zero for the missing
/// side.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformedGrid {
    grid: Array,
    transformed: Array,
    dxm: Array,
    dxp: Array,
    dx: Array,
}

impl TransformedGrid {
    /// The identity transform.
    pub fn new(grid: Array) -> Self {
        let transformed = grid.clone();
        Self::from_parts(grid, transformed)
    }

    /// Apply `f` to every grid point.
    pub fn with_transform<F: Fn(Real) -> Real>(grid: Array, f: F) -> Self {
        let transformed = grid.map(f);
        Self::from_parts(grid, transformed)
    }

    fn from_parts(grid: Array, transformed: Array) -> Self {
        let n = grid.size();
        let mut dxm = Array::zeros(n);
        let mut dxp = Array::zeros(n);
        let mut dx = Array::zeros(n);
        for i in 1..n.saturating_sub(1) {
            dxm[i] = transformed[i] - transformed[i - 1];
            dxp[i] = transformed[i + 1] - transformed[i];
            dx[i] = dxm[i] + dxp[i];
        }
        Self {
            grid,
            transformed,
            dxm,
            dxp,
            dx,
        }
    }

    /// Number of grid points.
    pub fn size(&self) -> Size {
        self.grid.size()
    }

    /// The untransformed grid.
    pub fn grid_array(&self) -> &Array {
        &self.grid
    }

    /// The transformed grid.
    pub fn transformed_grid_array(&self) -> &Array {
        &self.transformed
    }

    /// Untransformed point `i`.
    pub fn grid(&self, i: Size) -> Real {
        self.grid[i]
    }

    /// Transformed point `i`.
    pub fn transformed_grid(&self, i: Size) -> Real {
        self.transformed[i]
    }

    /// Backward spacing at `i`.
    pub fn dxm(&self, i: Size) -> Real {
        self.dxm[i]
    }

    /// Forward spacing at `i`.
    pub fn dxp(&self, i: Size) -> Real {
        self.dxp[i]
    }

    /// Total spacing `dxm + dxp` at `i`.
    pub fn dx(&self, i: Size) -> Real {
        self.dx[i]
    }
}

/// A grid transformed by the natural logarithm.
#[derive(Debug, Clone, PartialEq)]
pub struct LogGrid(TransformedGrid);

impl LogGrid {
    /// Build the log grid; every point must be strictly positive.
    pub fn new(grid: Array) -> Result<Self> {
        // NaN must fail as well, hence the negated comparison
        if let Some(i) = grid.iter().position(|x| !(*x > 0.0)) {
            return Err(Error::Numerical(format!(
                "log grid requires positive points, found {} at index {i}",
                grid[i]
            )));
        }
        Ok(Self(TransformedGrid::with_transform(grid, Real::ln)))
    }

    /// A grid of `steps + 1` points uniformly spaced in log between `min`
    /// and `max`.
    pub fn bounded(min: Real, max: Real, steps: Size) -> Result<Self> {
        ensure!(min > 0.0, "log grid lower bound must be positive, got {min}");
        ensure!(max > min, "log grid upper bound {max} must exceed lower bound {min}");
        ensure!(steps > 0, "log grid needs at least one step");
        let (lo, hi) = (min.ln(), max.ln());
        let h = (hi - lo) / steps as Real;
        Self::new(Array::from_fn(steps + 1, |i| (lo + i as Real * h).exp()))
    }

    /// Log of point `i`.
    pub fn log_grid(&self, i: Size) -> Real {
        self.0.transformed_grid(i)
    }

    /// All log points.
    pub fn log_grid_array(&self) -> &Array {
        self.0.transformed_grid_array()
    }

    /// The generic transformed-grid view.
    pub fn as_transformed(&self) -> &TransformedGrid {
        &self.0
    }

    /// Consume into the generic transformed-grid view.
    pub fn into_transformed(self) -> TransformedGrid {
        self.0
    }
}
