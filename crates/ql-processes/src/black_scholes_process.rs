//! Generalized Black-Scholes process
//! (translates `ql/processes/blackscholesprocess.hpp`).
//!
//! `dS/S = (r(t) − q(t)) dt + σ(t, S) dW`
//!
//! In log-price `x = ln S` the drift is `r − q − σ²/2` and the diffusion is
//! `σ`. The finite-difference PDE generators query these per grid point.

use ql_core::{ensure, DiscountFactor, Rate, Real, Result, Time, Volatility};
use std::fmt;
use std::sync::Arc;

/// Coefficients of a generalized Black-Scholes process.
///
/// Corresponds to `QuantLib::GeneralizedBlackScholesProcess`, reduced to the
/// quantities a PDE discretisation needs.
pub trait GeneralizedBlackScholesProcess: fmt::Debug + Send + Sync {
    /// Spot value of the underlying.
    fn x0(&self) -> Real;

    /// Instantaneous risk-free forward rate at `t`.
    fn risk_free_rate(&self, t: Time) -> Rate;

    /// Instantaneous dividend-yield forward rate at `t`.
    fn dividend_yield(&self, t: Time) -> Rate;

    /// Local volatility at time `t` and underlying level `s`.
    fn local_volatility(&self, t: Time, s: Real) -> Volatility;

    /// Risk-free discount factor from 0 to `t`.
    fn risk_free_discount(&self, t: Time) -> DiscountFactor;

    /// Dividend discount factor from 0 to `t`.
    fn dividend_discount(&self, t: Time) -> DiscountFactor;

    /// Black variance `σ²·t` for expiry `t` and `strike`.
    fn black_variance(&self, t: Time, strike: Real) -> Real;

    /// Log-price drift `r − q − σ²/2`.
    fn drift(&self, t: Time, s: Real) -> Real {
        let sigma = self.local_volatility(t, s);
        self.risk_free_rate(t) - self.dividend_yield(t) - 0.5 * sigma * sigma
    }

    /// Log-price diffusion `σ`.
    fn diffusion(&self, t: Time, s: Real) -> Real {
        self.local_volatility(t, s)
    }
}

impl<P: GeneralizedBlackScholesProcess + ?Sized> GeneralizedBlackScholesProcess for Arc<P> {
    fn x0(&self) -> Real {
        (**self).x0()
    }
    fn risk_free_rate(&self, t: Time) -> Rate {
        (**self).risk_free_rate(t)
    }
    fn dividend_yield(&self, t: Time) -> Rate {
        (**self).dividend_yield(t)
    }
    fn local_volatility(&self, t: Time, s: Real) -> Volatility {
        (**self).local_volatility(t, s)
    }
    fn risk_free_discount(&self, t: Time) -> DiscountFactor {
        (**self).risk_free_discount(t)
    }
    fn dividend_discount(&self, t: Time) -> DiscountFactor {
        (**self).dividend_discount(t)
    }
    fn black_variance(&self, t: Time, strike: Real) -> Real {
        (**self).black_variance(t, strike)
    }
    fn drift(&self, t: Time, s: Real) -> Real {
        (**self).drift(t, s)
    }
    fn diffusion(&self, t: Time, s: Real) -> Real {
        (**self).diffusion(t, s)
    }
}

// ── BlackScholesMertonProcess ─────────────────────────────────────────────────

/// A Black-Scholes-Merton process with flat rate, dividend yield and
/// volatility.
///
/// Corresponds to `QuantLib::BlackScholesMertonProcess` over flat term
/// structures.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlackScholesMertonProcess {
    spot: Real,
    rate: Rate,
    dividend: Rate,
    volatility: Volatility,
}

impl BlackScholesMertonProcess {
    /// Create a flat process. `spot` must be positive, `volatility`
    /// non-negative.
    pub fn new(spot: Real, rate: Rate, dividend: Rate, volatility: Volatility) -> Result<Self> {
        ensure!(spot > 0.0, "spot must be positive, got {spot}");
        ensure!(volatility >= 0.0, "volatility must be non-negative, got {volatility}");
        Ok(Self {
            spot,
            rate,
            dividend,
            volatility,
        })
    }

    /// A process without dividends (`QuantLib::BlackScholesProcess`).
    pub fn without_dividends(spot: Real, rate: Rate, volatility: Volatility) -> Result<Self> {
        Self::new(spot, rate, 0.0, volatility)
    }

    /// The flat volatility.
    pub fn volatility(&self) -> Volatility {
        self.volatility
    }
}

impl GeneralizedBlackScholesProcess for BlackScholesMertonProcess {
    fn x0(&self) -> Real {
        self.spot
    }

    fn risk_free_rate(&self, _t: Time) -> Rate {
        self.rate
    }

    fn dividend_yield(&self, _t: Time) -> Rate {
        self.dividend
    }

    fn local_volatility(&self, _t: Time, _s: Real) -> Volatility {
        self.volatility
    }

    fn risk_free_discount(&self, t: Time) -> DiscountFactor {
        (-self.rate * t).exp()
    }

    fn dividend_discount(&self, t: Time) -> DiscountFactor {
        (-self.dividend * t).exp()
    }

    fn black_variance(&self, t: Time, _strike: Real) -> Real {
        self.volatility * self.volatility * t
    }
}
