//! Second-order parabolic PDE coefficients and the operator generator
//! (translates `ql/methods/finitedifferences/pde.hpp`, `pdebsm.hpp`,
//! `pdeconstantcoeff` and `operatortraits`' generic time setter).

use std::fmt;
use std::sync::Arc;

use ql_core::{ensure_size, Rate, Real, Result, Time};
use ql_math::{Array, LogGrid, TransformedGrid};
use ql_processes::GeneralizedBlackScholesProcess;

use super::operator::Operator;
use super::tridiagonal_operator::{TimeSetter, TridiagonalOperator};

/// A PDE `∂u/∂t + ½σ²∂²u/∂x² + ν∂u/∂x − r·u = 0` given by its coefficients.
pub trait PdeSecondOrderParabolic: Send + Sync {
    /// `σ(t, x)`.
    fn diffusion(&self, t: Time, x: Real) -> Real;

    /// `ν(t, x)`.
    fn drift(&self, t: Time, x: Real) -> Real;

    /// `r(t, x)`.
    fn discount(&self, t: Time, x: Real) -> Rate;

    /// The grid the PDE is discretised on, built from the underlying grid.
    fn transform_grid(&self, grid: Array) -> Result<TransformedGrid> {
        Ok(TransformedGrid::new(grid))
    }

    /// Fill the interior rows of `op` with the central-difference
    /// discretisation at time `t`. Edge rows are left to the boundary
    /// conditions.
    fn generate_operator(
        &self,
        t: Time,
        grid: &TransformedGrid,
        op: &mut TridiagonalOperator,
    ) -> Result<()> {
        ensure_size!(op.size(), grid.size());
        for i in 1..grid.size().saturating_sub(1) {
            let x = grid.grid(i);
            let sigma = self.diffusion(t, x);
            let nu = self.drift(t, x);
            let r = self.discount(t, x);
            let sigma2 = sigma * sigma;

            let pd = -(sigma2 / grid.dxm(i) - nu) / grid.dx(i);
            let pu = -(sigma2 / grid.dxp(i) + nu) / grid.dx(i);
            let pm = sigma2 / (grid.dxm(i) * grid.dxp(i)) + r;
            op.set_mid_row(i, pd, pm, pu)?;
        }
        Ok(())
    }
}

/// The Black-Scholes-Merton PDE in log-price.
#[derive(Clone)]
pub struct PdeBsm {
    process: Arc<dyn GeneralizedBlackScholesProcess>,
}

impl PdeBsm {
    /// Coefficients read from `process`.
    pub fn new(process: Arc<dyn GeneralizedBlackScholesProcess>) -> Self {
        Self { process }
    }

    /// The underlying process.
    pub fn process(&self) -> &Arc<dyn GeneralizedBlackScholesProcess> {
        &self.process
    }
}

impl fmt::Debug for PdeBsm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PdeBsm")
            .field("process", &self.process)
            .finish()
    }
}

impl PdeSecondOrderParabolic for PdeBsm {
    fn diffusion(&self, t: Time, x: Real) -> Real {
        self.process.diffusion(t, x)
    }

    fn drift(&self, t: Time, x: Real) -> Real {
        self.process.drift(t, x)
    }

    fn discount(&self, t: Time, _x: Real) -> Rate {
        let t = if t.abs() < 1e-8 { 0.0 } else { t };
        self.process.risk_free_rate(t)
    }

    fn transform_grid(&self, grid: Array) -> Result<TransformedGrid> {
        Ok(LogGrid::new(grid)?.into_transformed())
    }
}

/// A PDE with coefficients frozen at one `(t, x)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PdeConstantCoeff {
    diffusion: Real,
    drift: Real,
    discount: Rate,
}

impl PdeConstantCoeff {
    /// Freeze `pde` at time `t` and level `x`.
    pub fn new<P: PdeSecondOrderParabolic + ?Sized>(pde: &P, t: Time, x: Real) -> Self {
        Self {
            diffusion: pde.diffusion(t, x),
            drift: pde.drift(t, x),
            discount: pde.discount(t, x),
        }
    }
}

impl PdeSecondOrderParabolic for PdeConstantCoeff {
    fn diffusion(&self, _t: Time, _x: Real) -> Real {
        self.diffusion
    }

    fn drift(&self, _t: Time, _x: Real) -> Real {
        self.drift
    }

    fn discount(&self, _t: Time, _x: Real) -> Rate {
        self.discount
    }
}

/// Regenerates an operator from a PDE whenever its time is set.
pub struct GenericTimeSetter<P: PdeSecondOrderParabolic> {
    grid: TransformedGrid,
    pde: P,
}

impl<P: PdeSecondOrderParabolic> GenericTimeSetter<P> {
    /// Discretise `pde` on `grid`, transformed the way the PDE requires.
    pub fn new(grid: Array, pde: P) -> Result<Self> {
        let grid = pde.transform_grid(grid)?;
        Ok(Self { grid, pde })
    }

    /// The discretisation grid.
    pub fn grid(&self) -> &TransformedGrid {
        &self.grid
    }
}

impl<P: PdeSecondOrderParabolic> TimeSetter for GenericTimeSetter<P> {
    fn set_time(&self, t: Time, op: &mut TridiagonalOperator) -> Result<()> {
        self.pde.generate_operator(t, &self.grid, op)
    }
}
