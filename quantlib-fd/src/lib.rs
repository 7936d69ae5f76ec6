//! # quantlib-fd
//!
//! Finite-difference evolution engine for Black-Scholes type PDEs, in the
//! style of [QuantLib](https://www.quantlib.org/)'s
//! `methods/finitedifferences` package.
//!
//! This crate is a **façade** that re-exports all public items from the
//! underlying workspace crates. Application code should depend on this
//! crate rather than the individual `ql-*` crates.
//!
//! ## Quick start
//!
//! ```rust
//! use std::sync::Arc;
//! use quantlib_fd::methods::finite_differences::{
//!     ExerciseStyle, FdBlackScholesSolver, FdmSettings, OptionType, PlainVanillaPayoff,
//! };
//! use quantlib_fd::processes::BlackScholesMertonProcess;
//!
//! let process = BlackScholesMertonProcess::new(100.0, 0.05, 0.0, 0.2)?;
//! let solver = FdBlackScholesSolver::new(Arc::new(process), FdmSettings::default());
//! let payoff = PlainVanillaPayoff::new(OptionType::Put, 100.0);
//! let american = solver.solve(&payoff, 1.0, ExerciseStyle::American)?;
//! assert!(american.value > 5.0);
//! # Ok::<(), quantlib_fd::core::Error>(())
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

/// Core types, aliases, and error definitions.
pub use ql_core as core;

/// Grid vectors and transformed grids.
pub use ql_math as math;

/// Stochastic process definitions.
pub use ql_processes as processes;

/// Finite-difference operators, schemes, models and the vanilla solver.
pub use ql_methods as methods;
