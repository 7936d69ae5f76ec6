//! Comparison utilities (translates `ql/math/comparison.hpp`).
//!
//! Used when matching stopping times and mesh points, which are produced by
//! accumulating floating-point time steps.

use ql_core::Real;

/// Return `true` if `|a - b| <= epsilon`.
#[inline]
pub fn close(a: Real, b: Real, epsilon: Real) -> bool {
    (a - b).abs() <= epsilon
}

/// Return `true` if `|a - b| <= n * epsilon` where `epsilon` is the
/// machine-epsilon relative to `max(|a|, |b|)`.
///
/// Values of opposite sign, or a zero compared with a non-zero, are never
/// close enough; use [`close`] with an absolute tolerance for those.
#[inline]
pub fn close_enough(a: Real, b: Real, n: u32) -> bool {
    if a == b {
        return true;
    }
    let eps = (a.abs().max(b.abs())) * f64::EPSILON * n as f64;
    (a - b).abs() <= eps
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn close_basic() {
        assert!(close(1.0, 1.0 + 1e-11, 1e-10));
        assert!(!close(1.0, 1.0 + 1e-9, 1e-10));
    }

    #[test]
    fn close_enough_accumulated_steps() {
        let t: Real = (0..10).map(|_| 0.1).sum();
        assert!(t != 1.0);
        assert!(close_enough(t, 1.0, 42));
        assert!(!close_enough(0.0, 1e-300, 42));
    }
}
