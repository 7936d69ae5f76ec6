//! Elementary finite-difference operators on a uniform grid
//! (translates `ql/methods/finitedifferences/{dminus,dplus,dzero,dplusdminus}.hpp`).
//!
//! Each constructor returns a plain [`TridiagonalOperator`]; edge rows use
//! one-sided differences, which amounts to linear extrapolation.

use ql_core::{ensure, Real, Result, Size};

use super::tridiagonal_operator::TridiagonalOperator;

fn uniform(grid_points: Size, h: Real) -> Result<TridiagonalOperator> {
    ensure!(h > 0.0, "grid spacing must be positive, got {h}");
    ensure!(grid_points >= 3, "at least 3 grid points required, got {grid_points}");
    TridiagonalOperator::new(grid_points)
}

/// Backward first difference `D₋`: `(u[i] − u[i−1]) / h`.
pub fn d_minus(grid_points: Size, h: Real) -> Result<TridiagonalOperator> {
    let mut op = uniform(grid_points, h)?;
    op.set_first_row(-1.0 / h, 1.0 / h)?;
    op.set_mid_rows(-1.0 / h, 1.0 / h, 0.0);
    op.set_last_row(-1.0 / h, 1.0 / h)?;
    Ok(op)
}

/// Forward first difference `D₊`: `(u[i+1] − u[i]) / h`.
pub fn d_plus(grid_points: Size, h: Real) -> Result<TridiagonalOperator> {
    let mut op = uniform(grid_points, h)?;
    op.set_first_row(-1.0 / h, 1.0 / h)?;
    op.set_mid_rows(0.0, -1.0 / h, 1.0 / h);
    op.set_last_row(-1.0 / h, 1.0 / h)?;
    Ok(op)
}

/// Central first difference `D₀`: `(u[i+1] − u[i−1]) / 2h`.
pub fn d_zero(grid_points: Size, h: Real) -> Result<TridiagonalOperator> {
    let mut op = uniform(grid_points, h)?;
    op.set_first_row(-1.0 / h, 1.0 / h)?;
    op.set_mid_rows(-1.0 / (2.0 * h), 0.0, 1.0 / (2.0 * h));
    op.set_last_row(-1.0 / h, 1.0 / h)?;
    Ok(op)
}

/// Central second difference `D₊D₋`: `(u[i+1] − 2u[i] + u[i−1]) / h²`.
///
/// Edge rows are zero.
pub fn d_plus_d_minus(grid_points: Size, h: Real) -> Result<TridiagonalOperator> {
    let mut op = uniform(grid_points, h)?;
    op.set_first_row(0.0, 0.0)?;
    op.set_mid_rows(1.0 / (h * h), -2.0 / (h * h), 1.0 / (h * h));
    op.set_last_row(0.0, 0.0)?;
    Ok(op)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finite_differences::Operator;
    use approx::assert_abs_diff_eq;
    use ql_math::Array;

    fn squares(n: Size, h: Real) -> Array {
        Array::from_fn(n, |i| {
            let x = i as Real * h;
            x * x
        })
    }

    #[test]
    fn first_differences_of_a_line_are_its_slope() {
        let h = 0.1;
        let line = Array::from_fn(6, |i| 3.0 * i as Real * h + 1.0);
        for op in [d_minus(6, h), d_plus(6, h), d_zero(6, h)] {
            let d = op.unwrap().apply_to(&line).unwrap();
            for v in d.iter() {
                assert_abs_diff_eq!(*v, 3.0, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn central_second_difference_of_a_parabola() {
        let h = 0.5;
        let d2 = d_plus_d_minus(7, h).unwrap().apply_to(&squares(7, h)).unwrap();
        assert_eq!(d2[0], 0.0);
        assert_eq!(d2[6], 0.0);
        for i in 1..6 {
            assert_abs_diff_eq!(d2[i], 2.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn central_difference_is_average_of_one_sided() {
        let h = 0.25;
        let u = squares(8, h);
        let dm = d_minus(8, h).unwrap().apply_to(&u).unwrap();
        let dp = d_plus(8, h).unwrap().apply_to(&u).unwrap();
        let d0 = d_zero(8, h).unwrap().apply_to(&u).unwrap();
        for i in 1..7 {
            assert_abs_diff_eq!(d0[i], 0.5 * (dm[i] + dp[i]), epsilon = 1e-12);
        }
    }

    #[test]
    fn invalid_spacing_is_rejected() {
        assert!(d_minus(5, 0.0).is_err());
        assert!(d_plus(2, 0.1).is_err());
    }
}
