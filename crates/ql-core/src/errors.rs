//! Error types for the finite-difference engine.
//!
//! Every failure is local and deterministic: configuration problems are
//! caught at construction or at the start of an operation, numerical
//! breakdowns (a zero pivot) are reported where they happen, and nothing is
//! retried. The `ensure!` and `fail!` macros mirror QuantLib's `QL_REQUIRE`
//! and `QL_FAIL`.

use thiserror::Error;

/// The top-level error type.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    /// General runtime error (maps to `QL_FAIL`).
    #[error("{0}")]
    Runtime(String),

    /// Precondition violated (maps to `QL_REQUIRE`).
    #[error("precondition not satisfied: {0}")]
    Precondition(String),

    /// A vector or operator does not have the size the operation expects.
    #[error("vector of the wrong size ({found} instead of {expected})")]
    DimensionMismatch {
        /// The size the operation required.
        expected: usize,
        /// The size that was supplied.
        found: usize,
    },

    /// Numerical breakdown, e.g. a zero pivot in a tridiagonal solve.
    #[error("numerical failure: {0}")]
    Numerical(String),

    /// Index out of range.
    #[error("index ({index}) out of range [0, {size})")]
    IndexOutOfRange {
        /// The index that was out of range.
        index: usize,
        /// The size of the container.
        size: usize,
    },
}

/// Shorthand `Result` type.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Equivalent to C++ `QL_REQUIRE(condition, message)`.
///
/// Returns `Err(Error::Precondition(...))` if `$cond` is false.
///
/// # Example
/// ```
/// use ql_core::{ensure, errors::Error};
/// fn positive(x: f64) -> ql_core::errors::Result<f64> {
///     ensure!(x > 0.0, "x must be positive, got {x}");
///     Ok(x)
/// }
/// assert!(positive(1.0).is_ok());
/// assert!(positive(-1.0).is_err());
/// ```
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $($msg:tt)*) => {
        if !$cond {
            return Err($crate::errors::Error::Precondition(
                format!($($msg)*)
            ));
        }
    };
}

/// Returns `Err(Error::DimensionMismatch { .. })` unless `$found == $expected`.
///
/// # Example
/// ```
/// use ql_core::ensure_size;
/// fn check(v: &[f64]) -> ql_core::errors::Result<()> {
///     ensure_size!(v.len(), 3);
///     Ok(())
/// }
/// assert!(check(&[1.0, 2.0, 3.0]).is_ok());
/// assert!(check(&[1.0]).is_err());
/// ```
#[macro_export]
macro_rules! ensure_size {
    ($found:expr, $expected:expr) => {
        if $found != $expected {
            return Err($crate::errors::Error::DimensionMismatch {
                expected: $expected,
                found: $found,
            });
        }
    };
}

/// Equivalent to C++ `QL_FAIL(message)`.
///
/// Returns `Err(Error::Runtime(...))` immediately.
///
/// # Example
/// ```
/// use ql_core::{fail, errors::Error};
/// fn always_err() -> ql_core::errors::Result<()> {
///     fail!("something went wrong");
/// }
/// assert!(always_err().is_err());
/// ```
#[macro_export]
macro_rules! fail {
    ($($msg:tt)*) => {
        return Err($crate::errors::Error::Runtime(format!($($msg)*)))
    };
}
