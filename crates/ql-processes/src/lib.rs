//! # ql-processes
//!
//! The stochastic-process interface the finite-difference operators read
//! their PDE coefficients from.
//!
//! Only the Black-Scholes family is described here: the engine needs drift,
//! diffusion and discounting as functions of time and underlying level, plus
//! the discount factors and Black variance used by closed-form control
//! variates.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod black_scholes_process;

pub use black_scholes_process::{BlackScholesMertonProcess, GeneralizedBlackScholesProcess};
