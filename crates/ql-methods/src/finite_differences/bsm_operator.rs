//! Black-Scholes-Merton differential operators (translates
//! `ql/methods/finitedifferences/bsmoperator.hpp`, `bsmtermoperator.hpp` and
//! `operatorfactory.hpp`).

use std::sync::Arc;

use ql_core::{ensure, Rate, Real, Result, Size, Time, Volatility};
use ql_math::{Array, LogGrid};
use ql_processes::GeneralizedBlackScholesProcess;

use super::operator::Operator;
use super::pde::{GenericTimeSetter, PdeBsm, PdeConstantCoeff, PdeSecondOrderParabolic};
use super::tridiagonal_operator::TridiagonalOperator;

/// Constant-coefficient operator on a uniform log grid with spacing `dx`.
///
/// With `ν = r − q − σ²/2` every interior row is
/// `(−(σ²/dx − ν)/2dx, σ²/dx² + r, −(σ²/dx + ν)/2dx)`.
pub fn bsm_operator(
    size: Size,
    dx: Real,
    r: Rate,
    q: Rate,
    sigma: Volatility,
) -> Result<TridiagonalOperator> {
    ensure!(dx > 0.0, "grid spacing must be positive, got {dx}");
    let mut op = TridiagonalOperator::new(size)?;
    let sigma2 = sigma * sigma;
    let nu = r - q - sigma2 / 2.0;
    let pd = -(sigma2 / dx - nu) / (2.0 * dx);
    let pu = -(sigma2 / dx + nu) / (2.0 * dx);
    let pm = sigma2 / (dx * dx) + r;
    op.set_mid_rows(pd, pm, pu);
    Ok(op)
}

/// Operator on the log of `grid` with the process coefficients frozen at
/// `residual_time` and the current spot.
pub fn bsm_operator_from_process(
    grid: &Array,
    process: Arc<dyn GeneralizedBlackScholesProcess>,
    residual_time: Time,
) -> Result<TridiagonalOperator> {
    let log_grid = LogGrid::new(grid.clone())?;
    let spot = process.x0();
    let coefficients = PdeConstantCoeff::new(&PdeBsm::new(process), residual_time, spot);
    let mut op = TridiagonalOperator::new(grid.size())?;
    coefficients.generate_operator(residual_time, log_grid.as_transformed(), &mut op)?;
    Ok(op)
}

/// Time-dependent operator on the log of `grid`; its coefficients are
/// regenerated from the process on every `set_time`. The returned operator
/// is already set to `residual_time`.
pub fn bsm_term_operator(
    grid: &Array,
    process: Arc<dyn GeneralizedBlackScholesProcess>,
    residual_time: Time,
) -> Result<TridiagonalOperator> {
    let setter = GenericTimeSetter::new(grid.clone(), PdeBsm::new(process))?;
    let mut op = TridiagonalOperator::new(grid.size())?.with_time_setter(Arc::new(setter));
    op.set_time(residual_time)?;
    Ok(op)
}

/// Picks the constant or the time-dependent Black-Scholes operator.
#[derive(Debug, Clone, Copy, Default)]
pub struct OperatorFactory;

impl OperatorFactory {
    /// [`bsm_term_operator`] when `time_dependent`, otherwise
    /// [`bsm_operator_from_process`].
    pub fn get_operator(
        process: Arc<dyn GeneralizedBlackScholesProcess>,
        grid: &Array,
        residual_time: Time,
        time_dependent: bool,
    ) -> Result<TridiagonalOperator> {
        if time_dependent {
            bsm_term_operator(grid, process, residual_time)
        } else {
            bsm_operator_from_process(grid, process, residual_time)
        }
    }
}
