//! Shared helpers for the integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use quantlib_fd::methods::finite_differences::OptionType;
use quantlib_fd::processes::{BlackScholesMertonProcess, GeneralizedBlackScholesProcess};
use statrs::distribution::{ContinuousCDF, Normal};

/// Install a `RUST_LOG`-driven subscriber once per test binary.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

pub fn flat_process(
    spot: f64,
    rate: f64,
    dividend: f64,
    vol: f64,
) -> Arc<dyn GeneralizedBlackScholesProcess> {
    Arc::new(
        BlackScholesMertonProcess::new(spot, rate, dividend, vol).expect("valid process"),
    )
}

/// Closed-form European value.
pub fn black_scholes(
    option_type: OptionType,
    spot: f64,
    strike: f64,
    rate: f64,
    dividend: f64,
    vol: f64,
    t: f64,
) -> f64 {
    let n = Normal::new(0.0, 1.0).expect("standard normal");
    let sd = vol * t.sqrt();
    let d1 = ((spot / strike).ln() + (rate - dividend) * t) / sd + 0.5 * sd;
    let d2 = d1 - sd;
    let df_r = (-rate * t).exp();
    let df_q = (-dividend * t).exp();
    match option_type {
        OptionType::Call => spot * df_q * n.cdf(d1) - strike * df_r * n.cdf(d2),
        OptionType::Put => strike * df_r * n.cdf(-d2) - spot * df_q * n.cdf(-d1),
    }
}
