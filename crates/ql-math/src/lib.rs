//! # ql-math
//!
//! Numeric building blocks for the finite-difference engine: the `Array`
//! grid vector (over nalgebra), log/transformed spatial grids, and
//! floating-point comparison helpers.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// ── Modules ───────────────────────────────────────────────────────────────────

/// Dense grid vector.
pub mod array;

/// Floating-point comparison utilities.
pub mod comparison;

/// Transformed and log-transformed spatial grids.
pub mod transformed_grid;

// ── Convenience re-exports ────────────────────────────────────────────────────

pub use array::Array;
pub use comparison::{close, close_enough};
pub use transformed_grid::{LogGrid, TransformedGrid};
