//! One-dimensional Black-Scholes finite-difference driver.
//!
//! Builds a log-spaced price grid around the spot, samples the payoff on it,
//! and rolls it back to today with the operator, boundary conditions and
//! step conditions of this module. Early-exercise styles are valued with a
//! control variate: the same grid is rolled back without the condition and
//! the difference is added to the closed-form European price.
//!
//! Corresponds to `QuantLib::FDVanillaEngine` together with
//! `FDEuropeanEngine` and `FDStepConditionEngine` (American and shout).

use std::sync::Arc;

use statrs::distribution::{Continuous, ContinuousCDF, Normal};

use ql_core::{ensure, Error, Real, Result, Size, Time};
use ql_math::Array;
use ql_processes::GeneralizedBlackScholesProcess;

use super::boundary_condition::{
    BoundaryConditionSet, BoundaryConditions, BoundarySide, NeumannBc,
};
use super::bsm_operator::OperatorFactory;
use super::finite_difference_model::FiniteDifferenceModel;
use super::mixed_scheme::MixedScheme;
use super::parallel_evolver::ParallelEvolver;
use super::payoff::{OptionType, Payoff, PlainVanillaPayoff};
use super::sampled_curve::SampledCurve;
use super::step_condition::{
    AmericanCondition, NullCondition, ShoutCondition, StepCondition, StepConditionSet,
};
use super::tridiagonal_operator::TridiagonalOperator;
use super::FdmSettings;

const MIN_GRID_POINTS: Size = 10;
const MIN_GRID_POINTS_PER_YEAR: Size = 2;
const SAFETY_ZONE_FACTOR: Real = 1.1;

/// When the holder may act on the option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ExerciseStyle {
    /// Only at maturity.
    European,
    /// At any time up to maturity.
    American,
    /// Once before maturity, locking in the discounted intrinsic value.
    Shout,
}

/// Value and spot sensitivities read at the centre of the grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FdResult {
    /// Option value.
    pub value: Real,
    /// `∂V/∂S`.
    pub delta: Real,
    /// `∂²V/∂S²`.
    pub gamma: Real,
}

/// Finite-difference pricer for vanilla options on a Black-Scholes process.
#[derive(Debug, Clone)]
pub struct FdBlackScholesSolver {
    process: Arc<dyn GeneralizedBlackScholesProcess>,
    settings: FdmSettings,
}

impl FdBlackScholesSolver {
    /// A solver for `process` with the given grid and scheme settings.
    pub fn new(process: Arc<dyn GeneralizedBlackScholesProcess>, settings: FdmSettings) -> Self {
        Self { process, settings }
    }

    /// The settings in use.
    pub fn settings(&self) -> &FdmSettings {
        &self.settings
    }

    /// The underlying process.
    pub fn process(&self) -> &Arc<dyn GeneralizedBlackScholesProcess> {
        &self.process
    }

    /// Number of grid points used for an option expiring in `maturity`.
    pub fn grid_points(&self, maturity: Time) -> Size {
        let floor = if maturity > 1.0 {
            MIN_GRID_POINTS + ((maturity - 1.0) * MIN_GRID_POINTS_PER_YEAR as Real) as Size
        } else {
            MIN_GRID_POINTS
        };
        self.settings.grid_points.max(floor)
    }

    /// Lower and upper price of the grid: about four standard deviations
    /// either side of the spot, widened to keep `strike` well inside, with
    /// the spot at the log-centre.
    pub fn grid_limits(&self, strike: Real, maturity: Time) -> Result<(Real, Real)> {
        let center = self.process.x0();
        ensure!(center > 0.0, "negative or null underlying given");
        ensure!(maturity > 0.0, "negative or zero residual time");

        let vol_sqrt_time = self.process.black_variance(maturity, center).sqrt();
        ensure!(
            vol_sqrt_time > 0.0,
            "black variance must be positive to size the grid"
        );
        let prefactor = 1.0 + 0.02 / vol_sqrt_time;
        let min_max_factor = (4.0 * prefactor * vol_sqrt_time).exp();
        let mut s_min = center / min_max_factor;
        let mut s_max = center * min_max_factor;

        if s_min > strike / SAFETY_ZONE_FACTOR {
            s_min = strike / SAFETY_ZONE_FACTOR;
            s_max = center / (s_min / center);
        }
        if s_max < strike * SAFETY_ZONE_FACTOR {
            s_max = strike * SAFETY_ZONE_FACTOR;
            s_min = center / (s_max / center);
        }
        Ok((s_min, s_max))
    }

    /// Value a vanilla option expiring in `maturity`.
    pub fn solve(
        &self,
        payoff: &PlainVanillaPayoff,
        maturity: Time,
        exercise: ExerciseStyle,
    ) -> Result<FdResult> {
        let (s_min, s_max) = self.grid_limits(payoff.strike, maturity)?;
        let points = self.grid_points(maturity);
        tracing::debug!(
            s_min,
            s_max,
            points,
            steps = self.settings.time_steps,
            ?exercise,
            "finite-difference grid"
        );

        let mut intrinsic = SampledCurve::new(points);
        intrinsic.set_log_grid(s_min, s_max)?;
        intrinsic.sample(|s| payoff.value(s));

        let op = OperatorFactory::get_operator(
            self.process.clone(),
            intrinsic.grid(),
            maturity,
            self.settings.time_dependent,
        )?;

        match self.step_condition(&intrinsic, maturity, exercise) {
            None => self.rollback_european(op, &intrinsic, maturity),
            Some(condition) => {
                self.rollback_with_control(op, &intrinsic, maturity, condition, payoff)
            }
        }
    }

    fn step_condition(
        &self,
        intrinsic: &SampledCurve,
        maturity: Time,
        exercise: ExerciseStyle,
    ) -> Option<Box<dyn StepCondition<Array>>> {
        match exercise {
            ExerciseStyle::European => None,
            ExerciseStyle::American => {
                Some(Box::new(AmericanCondition::new(intrinsic.values().clone())))
            }
            ExerciseStyle::Shout => {
                let rate = -self.process.risk_free_discount(maturity).ln() / maturity;
                Some(Box::new(ShoutCondition::new(
                    intrinsic.values().clone(),
                    maturity,
                    rate,
                )))
            }
        }
    }

    fn boundary_conditions(
        &self,
        intrinsic: &SampledCurve,
    ) -> BoundaryConditions<TridiagonalOperator> {
        let v = intrinsic.values();
        let n = v.size();
        vec![
            Box::new(NeumannBc::new(v[1] - v[0], BoundarySide::Lower)),
            Box::new(NeumannBc::new(v[n - 1] - v[n - 2], BoundarySide::Upper)),
        ]
    }

    fn rollback_european(
        &self,
        op: TridiagonalOperator,
        intrinsic: &SampledCurve,
        maturity: Time,
    ) -> Result<FdResult> {
        let scheme =
            MixedScheme::new(op, self.settings.scheme.theta(), self.boundary_conditions(intrinsic))?;
        let mut model = FiniteDifferenceModel::new(scheme, &[]);
        let mut prices = intrinsic.clone();
        model.rollback(
            prices.values_mut(),
            maturity,
            0.0,
            self.settings.time_steps,
            None,
        )?;
        Ok(FdResult {
            value: prices.value_at_center()?,
            delta: prices.first_derivative_at_center()?,
            gamma: prices.second_derivative_at_center()?,
        })
    }

    fn rollback_with_control(
        &self,
        op: TridiagonalOperator,
        intrinsic: &SampledCurve,
        maturity: Time,
        condition: Box<dyn StepCondition<Array>>,
        payoff: &PlainVanillaPayoff,
    ) -> Result<FdResult> {
        let bcs: BoundaryConditionSet<TridiagonalOperator> = (0..2)
            .map(|_| self.boundary_conditions(intrinsic))
            .collect();
        let evolver =
            ParallelEvolver::with_theta(vec![op.clone(), op], bcs, self.settings.scheme.theta())?;

        let mut conditions: StepConditionSet<Array> = StepConditionSet::new();
        conditions.push(condition);
        conditions.push(Box::new(NullCondition::<Array>::new()));

        let mut grids = vec![intrinsic.values().clone(); 2];
        FiniteDifferenceModel::new(evolver, &[]).rollback(
            &mut grids,
            maturity,
            0.0,
            self.settings.time_steps,
            Some(&conditions),
        )?;
        let [conditioned, control]: [Array; 2] = grids
            .try_into()
            .map_err(|_| Error::Runtime("system rollback lost a grid".into()))?;

        let mut prices = intrinsic.clone();
        prices.set_values(conditioned)?;
        let mut control_prices = intrinsic.clone();
        control_prices.set_values(control)?;

        let black = BlackCalculator::new(self.process.as_ref(), payoff, maturity)?;
        Ok(FdResult {
            value: prices.value_at_center()? - control_prices.value_at_center()? + black.value(),
            delta: prices.first_derivative_at_center()?
                - control_prices.first_derivative_at_center()?
                + black.delta(),
            gamma: prices.second_derivative_at_center()?
                - control_prices.second_derivative_at_center()?
                + black.gamma(),
        })
    }
}

/// Closed-form European value and spot Greeks.
pub(crate) struct BlackCalculator {
    phi: Real,
    spot: Real,
    forward: Real,
    strike: Real,
    std_dev: Real,
    discount: Real,
    n_d1: Real,
    n_d2: Real,
    pdf_d1: Real,
}

impl BlackCalculator {
    pub(crate) fn new(
        process: &dyn GeneralizedBlackScholesProcess,
        payoff: &PlainVanillaPayoff,
        maturity: Time,
    ) -> Result<Self> {
        let spot = process.x0();
        let strike = payoff.strike;
        let discount = process.risk_free_discount(maturity);
        let forward = spot * process.dividend_discount(maturity) / discount;
        let std_dev = process.black_variance(maturity, strike).sqrt();
        ensure!(std_dev > 0.0, "black variance must be positive");
        ensure!(strike > 0.0, "strike must be positive, got {strike}");

        let normal = Normal::new(0.0, 1.0).map_err(|e| Error::Runtime(e.to_string()))?;
        let phi = payoff.option_type.sign();
        let d1 = (forward / strike).ln() / std_dev + 0.5 * std_dev;
        let d2 = d1 - std_dev;
        Ok(Self {
            phi,
            spot,
            forward,
            strike,
            std_dev,
            discount,
            n_d1: normal.cdf(phi * d1),
            n_d2: normal.cdf(phi * d2),
            pdf_d1: normal.pdf(d1),
        })
    }

    pub(crate) fn value(&self) -> Real {
        self.discount * self.phi * (self.forward * self.n_d1 - self.strike * self.n_d2)
    }

    pub(crate) fn delta(&self) -> Real {
        self.discount * self.phi * self.n_d1 * self.forward / self.spot
    }

    pub(crate) fn gamma(&self) -> Real {
        self.discount * self.pdf_d1 * self.forward / (self.spot * self.spot * self.std_dev)
    }
}

impl std::fmt::Debug for BlackCalculator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlackCalculator")
            .field("option_type", &if self.phi > 0.0 { OptionType::Call } else { OptionType::Put })
            .field("forward", &self.forward)
            .field("strike", &self.strike)
            .field("std_dev", &self.std_dev)
            .finish()
    }
}
