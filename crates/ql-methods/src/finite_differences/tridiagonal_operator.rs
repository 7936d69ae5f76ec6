//! Tridiagonal operator (translates
//! `ql/methods/finitedifferences/tridiagonaloperator.hpp`).
//!
//! Stores the three bands of a tridiagonal matrix and provides the O(N)
//! matrix-vector product, the Thomas-algorithm solve and the operator
//! algebra the theta scheme is assembled from. An optional [`TimeSetter`]
//! makes the operator time dependent.

use std::fmt;
use std::sync::Arc;

use ql_core::{ensure, ensure_size, Error, Real, Result, Size, Time};
use ql_math::Array;

use super::operator::Operator;

// ─── Time setter ──────────────────────────────────────────────────────────────

/// Regenerates the bands of a [`TridiagonalOperator`] for a given time.
///
/// Corresponds to `QuantLib::TridiagonalOperator::TimeSetter`.
pub trait TimeSetter: Send + Sync {
    /// Overwrite the coefficients of `op` for time `t`.
    fn set_time(&self, t: Time, op: &mut TridiagonalOperator) -> Result<()>;
}

// ─── Tridiagonal operator ─────────────────────────────────────────────────────

/// A tridiagonal matrix operator.
///
/// Invariant: `lower.size() == diagonal.size() − 1 == upper.size()`, and the
/// size is either 0 or at least 3. Row `i` reads
/// `lower[i−1] · v[i−1] + diagonal[i] · v[i] + upper[i] · v[i+1]`.
///
/// Cloning shares the time setter; the bands are copied.
#[derive(Clone)]
pub struct TridiagonalOperator {
    lower: Array,
    diagonal: Array,
    upper: Array,
    time_setter: Option<Arc<dyn TimeSetter>>,
}

impl TridiagonalOperator {
    /// A zero operator of size `n` (0, or at least 3).
    pub fn new(n: Size) -> Result<Self> {
        ensure!(
            n == 0 || n >= 3,
            "invalid size ({n}) for tridiagonal operator (must be null or >= 3)"
        );
        Ok(Self {
            lower: Array::zeros(n.saturating_sub(1)),
            diagonal: Array::zeros(n),
            upper: Array::zeros(n.saturating_sub(1)),
            time_setter: None,
        })
    }

    /// Build from explicit bands.
    pub fn from_diagonals(lower: Array, diagonal: Array, upper: Array) -> Result<Self> {
        let n = diagonal.size();
        ensure!(
            n == 0 || n >= 3,
            "invalid size ({n}) for tridiagonal operator (must be null or >= 3)"
        );
        ensure!(
            lower.size() == n.saturating_sub(1),
            "wrong size for lower diagonal vector ({} instead of {})",
            lower.size(),
            n.saturating_sub(1)
        );
        ensure!(
            upper.size() == n.saturating_sub(1),
            "wrong size for upper diagonal vector ({} instead of {})",
            upper.size(),
            n.saturating_sub(1)
        );
        Ok(Self {
            lower,
            diagonal,
            upper,
            time_setter: None,
        })
    }

    /// Attach a time setter, making the operator time dependent.
    pub fn with_time_setter(mut self, setter: Arc<dyn TimeSetter>) -> Self {
        self.time_setter = Some(setter);
        self
    }

    /// The attached time setter, if any.
    pub fn time_setter(&self) -> Option<&Arc<dyn TimeSetter>> {
        self.time_setter.as_ref()
    }

    /// Lower band (`size − 1` entries).
    pub fn lower_diagonal(&self) -> &Array {
        &self.lower
    }

    /// Main diagonal.
    pub fn diagonal(&self) -> &Array {
        &self.diagonal
    }

    /// Upper band (`size − 1` entries).
    pub fn upper_diagonal(&self) -> &Array {
        &self.upper
    }

    // ── Row builders ─────────────────────────────────────────────────────────

    /// Set row 0 to `(b, c)`.
    pub fn set_first_row(&mut self, b: Real, c: Real) -> Result<()> {
        ensure!(self.size() >= 3, "cannot set the first row of an empty operator");
        self.diagonal[0] = b;
        self.upper[0] = c;
        Ok(())
    }

    /// Set interior row `i` (`1 ≤ i ≤ size − 2`) to `(a, b, c)`.
    pub fn set_mid_row(&mut self, i: Size, a: Real, b: Real, c: Real) -> Result<()> {
        if i < 1 || i + 2 > self.size() {
            return Err(Error::IndexOutOfRange {
                index: i,
                size: self.size(),
            });
        }
        self.lower[i - 1] = a;
        self.diagonal[i] = b;
        self.upper[i] = c;
        Ok(())
    }

    /// Set every interior row to `(a, b, c)`.
    pub fn set_mid_rows(&mut self, a: Real, b: Real, c: Real) {
        for i in 1..self.size().saturating_sub(1) {
            self.lower[i - 1] = a;
            self.diagonal[i] = b;
            self.upper[i] = c;
        }
    }

    /// Set the last row to `(a, b)`.
    pub fn set_last_row(&mut self, a: Real, b: Real) -> Result<()> {
        let n = self.size();
        ensure!(n >= 3, "cannot set the last row of an empty operator");
        self.lower[n - 2] = a;
        self.diagonal[n - 1] = b;
        Ok(())
    }

    fn combine<F: Fn(&Array, &Array) -> Array>(&self, other: &Self, f: F) -> Result<Self> {
        ensure_size!(other.size(), self.size());
        Ok(Self {
            lower: f(&self.lower, &other.lower),
            diagonal: f(&self.diagonal, &other.diagonal),
            upper: f(&self.upper, &other.upper),
            time_setter: None,
        })
    }
}

impl fmt::Debug for TridiagonalOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TridiagonalOperator")
            .field("lower", &self.lower)
            .field("diagonal", &self.diagonal)
            .field("upper", &self.upper)
            .field("time_dependent", &self.time_setter.is_some())
            .finish()
    }
}

impl Operator for TridiagonalOperator {
    fn size(&self) -> Size {
        self.diagonal.size()
    }

    fn is_time_dependent(&self) -> bool {
        self.time_setter.is_some()
    }

    fn set_time(&mut self, t: Time) -> Result<()> {
        // the setter writes into `self`, so hold it through its own handle
        if let Some(setter) = self.time_setter.clone() {
            tracing::trace!(t, size = self.size(), "regenerating bands");
            setter.set_time(t, self)?;
        }
        Ok(())
    }

    fn identity(&self, size: Size) -> Result<Self> {
        Self::from_diagonals(
            Array::zeros(size.saturating_sub(1)),
            Array::from_element(size, 1.0),
            Array::zeros(size.saturating_sub(1)),
        )
    }

    fn apply_to(&self, v: &Array) -> Result<Array> {
        let n = self.size();
        ensure_size!(v.size(), n);
        if n == 0 {
            return Ok(Array::zeros(0));
        }

        // result = diagonal * v
        let mut result = self.diagonal.component_mul(v);

        // off-diagonal contributions
        result[0] += self.upper[0] * v[1];
        for j in 1..n - 1 {
            result[j] += self.lower[j - 1] * v[j - 1] + self.upper[j] * v[j + 1];
        }
        result[n - 1] += self.lower[n - 2] * v[n - 2];

        Ok(result)
    }

    fn solve_for(&self, rhs: &Array) -> Result<Array> {
        let n = self.size();
        ensure_size!(rhs.size(), n);
        if n == 0 {
            return Ok(Array::zeros(0));
        }

        let mut result = Array::zeros(n);
        let mut tmp = Array::zeros(n);

        // Forward elimination
        let mut bet = self.diagonal[0];
        if bet == 0.0 {
            return Err(Error::Numerical("division by zero: null pivot in row 0".into()));
        }
        result[0] = rhs[0] / bet;
        for j in 1..n {
            tmp[j] = self.upper[j - 1] / bet;
            bet = self.diagonal[j] - self.lower[j - 1] * tmp[j];
            if bet == 0.0 {
                return Err(Error::Numerical(format!(
                    "division by zero: null pivot in row {j}"
                )));
            }
            result[j] = (rhs[j] - self.lower[j - 1] * result[j - 1]) / bet;
        }

        // Back substitution
        for j in (0..n - 1).rev() {
            result[j] -= tmp[j + 1] * result[j + 1];
        }

        Ok(result)
    }

    fn add(&self, other: &Self) -> Result<Self> {
        self.combine(other, |a, b| a + b)
    }

    fn subtract(&self, other: &Self) -> Result<Self> {
        self.combine(other, |a, b| a - b)
    }

    fn multiply(&self, a: Real) -> Self {
        Self {
            lower: &self.lower * a,
            diagonal: &self.diagonal * a,
            upper: &self.upper * a,
            time_setter: None,
        }
    }

    fn swap(&mut self, other: &mut Self) {
        std::mem::swap(self, other);
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use proptest::prelude::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn op(lower: &[Real], diag: &[Real], upper: &[Real]) -> TridiagonalOperator {
        TridiagonalOperator::from_diagonals(
            Array::from_slice(lower),
            Array::from_slice(diag),
            Array::from_slice(upper),
        )
        .unwrap()
    }

    #[test]
    fn sizes_one_and_two_are_invalid() {
        assert!(TridiagonalOperator::new(0).is_ok());
        assert!(TridiagonalOperator::new(1).is_err());
        assert!(TridiagonalOperator::new(2).is_err());
        assert!(TridiagonalOperator::new(3).is_ok());
    }

    #[test]
    fn mismatched_bands_are_rejected() {
        let r = TridiagonalOperator::from_diagonals(
            Array::zeros(2),
            Array::zeros(4),
            Array::zeros(3),
        );
        assert!(matches!(r, Err(Error::Precondition(_))));
    }

    #[test]
    fn solves_symmetric_three_point_system() {
        // 2x0 + x1 = 4, x0 + 2x1 + x2 = 4, x1 + 2x2 = 4
        let a = op(&[1.0, 1.0], &[2.0, 2.0, 2.0], &[1.0, 1.0]);
        let x = a.solve_for(&Array::from_slice(&[4.0, 4.0, 4.0])).unwrap();
        assert_abs_diff_eq!(x[0], 2.0, epsilon = 1e-14);
        assert_abs_diff_eq!(x[1], 0.0, epsilon = 1e-14);
        assert_abs_diff_eq!(x[2], 2.0, epsilon = 1e-14);
    }

    #[test]
    fn solves_non_symmetric_system() {
        let a = op(&[11.0, 1.0], &[12.0, 10.0, 3.0], &[7.0, 9.0]);
        let x = a.solve_for(&Array::from_slice(&[7.0, 8.0, 7.0])).unwrap();
        let expected = [20.0, -33.285714285714285, 13.428571428571429];
        for i in 0..3 {
            assert_abs_diff_eq!(x[i], expected[i], epsilon = 1e-12);
        }
    }

    #[test]
    fn apply_is_matrix_vector_product() {
        let a = op(&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0, 7.0], &[8.0, 9.0, 10.0]);
        let y = a.apply_to(&Array::from_slice(&[1.0, 1.0, 2.0, -1.0])).unwrap();
        assert_eq!(y.as_slice(), &[12.0, 24.0, 4.0, -1.0]);
    }

    #[test]
    fn zero_pivot_is_a_numerical_error() {
        let a = op(&[1.0, 1.0], &[1.0, 1.0, 1.0], &[1.0, 1.0]);
        let err = a.solve_for(&Array::from_slice(&[1.0, 1.0, 1.0])).unwrap_err();
        assert!(matches!(err, Error::Numerical(_)), "{err}");

        let b = op(&[0.0, 0.0], &[0.0, 1.0, 1.0], &[0.0, 0.0]);
        assert!(matches!(
            b.solve_for(&Array::zeros(3)),
            Err(Error::Numerical(_))
        ));
    }

    #[test]
    fn wrong_vector_size_is_rejected() {
        let a = TridiagonalOperator::new(4).unwrap();
        let err = a.apply_to(&Array::zeros(3)).unwrap_err();
        assert_eq!(
            err,
            Error::DimensionMismatch {
                expected: 4,
                found: 3
            }
        );
        assert!(a.solve_for(&Array::zeros(5)).is_err());
    }

    #[test]
    fn empty_operator_maps_empty_vectors() {
        let a = TridiagonalOperator::new(0).unwrap();
        assert_eq!(a.apply_to(&Array::zeros(0)).unwrap().size(), 0);
        assert_eq!(a.solve_for(&Array::zeros(0)).unwrap().size(), 0);
        assert!(a.identity(0).is_ok());
    }

    #[test]
    fn algebra_is_elementwise_on_bands() {
        let a = op(&[1.0, 2.0], &[3.0, 4.0, 5.0], &[6.0, 7.0]);
        let b = op(&[1.0, 1.0], &[1.0, 1.0, 1.0], &[1.0, 1.0]);

        let sum = a.add(&b).unwrap();
        assert_eq!(sum.diagonal().as_slice(), &[4.0, 5.0, 6.0]);
        assert_eq!(sum.lower_diagonal().as_slice(), &[2.0, 3.0]);

        let diff = a.subtract(&b).unwrap();
        assert_eq!(diff.upper_diagonal().as_slice(), &[5.0, 6.0]);

        let scaled = a.multiply(2.0);
        assert_eq!(scaled.diagonal().as_slice(), &[6.0, 8.0, 10.0]);

        // operands are untouched
        assert_eq!(a.diagonal().as_slice(), &[3.0, 4.0, 5.0]);

        let c = TridiagonalOperator::new(4).unwrap();
        assert!(matches!(a.add(&c), Err(Error::DimensionMismatch { .. })));
    }

    #[test]
    fn row_builders() {
        let mut a = TridiagonalOperator::new(4).unwrap();
        a.set_first_row(1.0, 2.0).unwrap();
        a.set_mid_rows(3.0, 4.0, 5.0);
        a.set_last_row(6.0, 7.0).unwrap();
        a.set_mid_row(2, -1.0, -2.0, -3.0).unwrap();
        assert_eq!(a.diagonal().as_slice(), &[1.0, 4.0, -2.0, 7.0]);
        assert_eq!(a.lower_diagonal().as_slice(), &[3.0, -1.0, 6.0]);
        assert_eq!(a.upper_diagonal().as_slice(), &[2.0, 5.0, -3.0]);

        assert!(matches!(
            a.set_mid_row(0, 0.0, 0.0, 0.0),
            Err(Error::IndexOutOfRange { index: 0, size: 4 })
        ));
        assert!(a.set_mid_row(3, 0.0, 0.0, 0.0).is_err());
        assert!(TridiagonalOperator::new(0).unwrap().set_first_row(1.0, 0.0).is_err());
    }

    struct CountingSetter(AtomicUsize);

    impl TimeSetter for CountingSetter {
        fn set_time(&self, t: Time, op: &mut TridiagonalOperator) -> Result<()> {
            self.0.fetch_add(1, Ordering::SeqCst);
            op.set_mid_rows(0.0, t, 0.0);
            Ok(())
        }
    }

    #[test]
    fn time_setter_regenerates_bands() {
        let setter = Arc::new(CountingSetter(AtomicUsize::new(0)));
        let mut a = TridiagonalOperator::new(3).unwrap().with_time_setter(setter.clone());
        assert!(a.is_time_dependent());
        a.set_time(0.25).unwrap();
        assert_eq!(a.diagonal()[1], 0.25);
        assert_eq!(setter.0.load(Ordering::SeqCst), 1);

        // derived operators are constant
        assert!(!a.multiply(2.0).is_time_dependent());

        let mut plain = TridiagonalOperator::new(3).unwrap();
        plain.set_time(1.0).unwrap();
        assert_eq!(plain.diagonal().as_slice(), &[0.0, 0.0, 0.0]);
    }

    #[test]
    fn swap_exchanges_bands_and_setter() {
        let setter = Arc::new(CountingSetter(AtomicUsize::new(0)));
        let mut a = op(&[1.0, 1.0], &[2.0, 2.0, 2.0], &[1.0, 1.0]).with_time_setter(setter);
        let mut b = TridiagonalOperator::new(4).unwrap();
        a.swap(&mut b);
        assert_eq!(a.size(), 4);
        assert!(!a.is_time_dependent());
        assert_eq!(b.diagonal().as_slice(), &[2.0, 2.0, 2.0]);
        assert!(b.is_time_dependent());
    }

    fn operator_and_vector() -> impl Strategy<Value = (TridiagonalOperator, Array)> {
        (3usize..40)
            .prop_flat_map(|n| {
                (
                    prop::collection::vec(-5.0..5.0f64, n - 1),
                    prop::collection::vec(0.5..5.0f64, n),
                    prop::collection::vec(-5.0..5.0f64, n - 1),
                    prop::collection::vec(-100.0..100.0f64, n),
                )
            })
            .prop_map(|(l, d, u, x)| {
                let n = d.len();
                // strictly diagonally dominant, hence non-singular
                let diag: Vec<Real> = (0..n)
                    .map(|i| {
                        let left = if i > 0 { l[i - 1].abs() } else { 0.0 };
                        let right = if i + 1 < n { u[i].abs() } else { 0.0 };
                        d[i] + left + right
                    })
                    .collect();
                let a = TridiagonalOperator::from_diagonals(
                    Array::from_vec(l),
                    Array::from_vec(diag),
                    Array::from_vec(u),
                )
                .unwrap();
                (a, Array::from_vec(x))
            })
    }

    proptest! {
        #[test]
        fn solve_inverts_apply((a, x) in operator_and_vector()) {
            let y = a.apply_to(&x).unwrap();
            let back = a.solve_for(&y).unwrap();
            for i in 0..x.size() {
                prop_assert!((back[i] - x[i]).abs() <= 1e-9 * (1.0 + x[i].abs()));
            }
        }

        #[test]
        fn identity_is_neutral((a, x) in operator_and_vector()) {
            let id = a.identity(a.size()).unwrap();
            prop_assert_eq!(id.apply_to(&x).unwrap(), x.clone());
            prop_assert_eq!(id.solve_for(&x).unwrap(), x);
        }
    }
}
