//! A function sampled on a grid (translates `ql/math/sampledcurve.hpp`).

use ql_core::{ensure, ensure_size, Real, Result, Size};
use ql_math::{Array, LogGrid};

/// Grid points and the values sampled on them.
#[derive(Debug, Clone, PartialEq)]
pub struct SampledCurve {
    grid: Array,
    values: Array,
}

impl SampledCurve {
    /// A zero curve over `size` points at zero.
    pub fn new(size: Size) -> Self {
        Self {
            grid: Array::zeros(size),
            values: Array::zeros(size),
        }
    }

    /// A zero curve over `grid`.
    pub fn from_grid(grid: Array) -> Self {
        let values = Array::zeros(grid.size());
        Self { grid, values }
    }

    /// Number of points.
    pub fn size(&self) -> Size {
        self.grid.size()
    }

    /// Grid points.
    pub fn grid(&self) -> &Array {
        &self.grid
    }

    /// Sampled values.
    pub fn values(&self) -> &Array {
        &self.values
    }

    /// Mutable sampled values.
    pub fn values_mut(&mut self) -> &mut Array {
        &mut self.values
    }

    /// Replace the values.
    pub fn set_values(&mut self, values: Array) -> Result<()> {
        ensure_size!(values.size(), self.size());
        self.values = values;
        Ok(())
    }

    /// Re-space the grid uniformly in log between `min` and `max`, keeping
    /// the number of points.
    pub fn set_log_grid(&mut self, min: Real, max: Real) -> Result<()> {
        ensure!(self.size() >= 2, "log grid needs at least two points");
        let log_grid = LogGrid::bounded(min, max, self.size() - 1)?;
        self.grid = log_grid.as_transformed().grid_array().clone();
        Ok(())
    }

    /// Sample `f` at every grid point.
    pub fn sample<F: Fn(Real) -> Real>(&mut self, f: F) {
        self.values = self.grid.map(f);
    }

    fn mid(&self) -> Size {
        self.size() / 2
    }

    /// Value at the middle of the grid; the mean of the two central values
    /// when the size is even.
    pub fn value_at_center(&self) -> Result<Real> {
        ensure!(!self.values.is_empty(), "empty sampled curve");
        let j = self.mid();
        let v = &self.values;
        Ok(if self.size() % 2 == 1 {
            v[j]
        } else {
            0.5 * (v[j] + v[j - 1])
        })
    }

    /// Central first derivative at the middle of the grid.
    pub fn first_derivative_at_center(&self) -> Result<Real> {
        ensure!(
            self.size() >= 3,
            "the size of the curve must be at least 3"
        );
        let j = self.mid();
        let (g, v) = (&self.grid, &self.values);
        Ok(if self.size() % 2 == 1 {
            (v[j + 1] - v[j - 1]) / (g[j + 1] - g[j - 1])
        } else {
            (v[j] - v[j - 1]) / (g[j] - g[j - 1])
        })
    }

    /// Central second derivative at the middle of the grid.
    pub fn second_derivative_at_center(&self) -> Result<Real> {
        ensure!(
            self.size() >= 4,
            "the size of the curve must be at least 4"
        );
        let j = self.mid();
        let (g, v) = (&self.grid, &self.values);
        Ok(if self.size() % 2 == 1 {
            let delta_plus = (v[j + 1] - v[j]) / (g[j + 1] - g[j]);
            let delta_minus = (v[j] - v[j - 1]) / (g[j] - g[j - 1]);
            let ds = (g[j + 1] - g[j - 1]) / 2.0;
            (delta_plus - delta_minus) / ds
        } else {
            let delta_plus = (v[j + 1] - v[j - 1]) / (g[j + 1] - g[j - 1]);
            let delta_minus = (v[j] - v[j - 2]) / (g[j] - g[j - 2]);
            let ds = g[j] - g[j - 1];
            (delta_plus - delta_minus) / ds
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn log_grid_spacing() {
        let mut curve = SampledCurve::new(5);
        curve.set_log_grid(50.0, 200.0).unwrap();
        let g = curve.grid();
        assert_abs_diff_eq!(g[0], 50.0, epsilon = 1e-12);
        assert_abs_diff_eq!(g[2], 100.0, epsilon = 1e-12);
        assert_abs_diff_eq!(g[4], 200.0, epsilon = 1e-12);
        assert!(curve.set_log_grid(-1.0, 2.0).is_err());
    }

    #[test]
    fn derivatives_of_a_parabola_odd_size() {
        let mut curve = SampledCurve::from_grid(Array::from_fn(7, |i| i as Real * 0.5));
        curve.sample(|x| x * x);
        assert_abs_diff_eq!(curve.value_at_center().unwrap(), 2.25, epsilon = 1e-14);
        assert_abs_diff_eq!(curve.first_derivative_at_center().unwrap(), 3.0, epsilon = 1e-12);
        assert_abs_diff_eq!(curve.second_derivative_at_center().unwrap(), 2.0, epsilon = 1e-12);
    }

    #[test]
    fn derivatives_of_a_parabola_even_size() {
        let mut curve = SampledCurve::from_grid(Array::from_fn(6, |i| i as Real));
        curve.sample(|x| x * x);
        // centre between 2 and 3
        assert_abs_diff_eq!(curve.value_at_center().unwrap(), 6.5, epsilon = 1e-14);
        assert_abs_diff_eq!(curve.first_derivative_at_center().unwrap(), 5.0, epsilon = 1e-12);
        assert_abs_diff_eq!(curve.second_derivative_at_center().unwrap(), 2.0, epsilon = 1e-12);
    }

    #[test]
    fn too_small_curves() {
        let curve = SampledCurve::new(3);
        assert!(curve.first_derivative_at_center().is_ok());
        assert!(curve.second_derivative_at_center().is_err());
        assert!(SampledCurve::new(0).value_at_center().is_err());
        let mut c = SampledCurve::new(3);
        assert!(c.set_values(Array::zeros(2)).is_err());
    }
}
