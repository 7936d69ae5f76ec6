//! Theta-weighted time stepping (translates
//! `ql/methods/finitedifferences/mixedscheme.hpp`, `cranknicolson.hpp`,
//! `expliciteuler.hpp` and `impliciteuler.hpp`).
//!
//! One step from `t` to `t − dt` solves
//!
//! ```text
//! (I + θ·dt·L) · u(t − dt) = (I − (1 − θ)·dt·L) · u(t)
//! ```
//!
//! as an explicit multiply followed by an implicit solve. `θ = 0` is
//! explicit Euler, `θ = 1` implicit Euler and `θ = ½` Crank-Nicolson.

use ql_core::{ensure, fail, Real, Result, Time};
use ql_math::Array;

use super::boundary_condition::BoundaryConditions;
use super::operator::Operator;

/// Something that can evolve a grid backwards by one step.
///
/// Implemented by [`MixedScheme`] and by
/// [`ParallelEvolver`](super::ParallelEvolver), so the
/// [`FiniteDifferenceModel`](super::FiniteDifferenceModel) is written once.
pub trait Evolver {
    /// The grid type evolved.
    type Values;

    /// Set the step size used by subsequent calls to [`step`](Evolver::step).
    fn set_step(&mut self, dt: Time) -> Result<()>;

    /// Evolve `values` from `t` to `t − dt`.
    fn step(&mut self, values: &mut Self::Values, t: Time) -> Result<()>;
}

/// Mixed explicit/implicit scheme over an operator `O`.
///
/// Corresponds to `QuantLib::MixedScheme<Operator>`.
pub struct MixedScheme<O: Operator> {
    l: O,
    identity: O,
    explicit_part: Option<O>,
    implicit_part: Option<O>,
    dt: Time,
    theta: Real,
    bcs: BoundaryConditions<O>,
}

impl<O: Operator> MixedScheme<O> {
    /// Create a scheme with weight `theta ∈ [0, 1]`.
    pub fn new(l: O, theta: Real, bcs: BoundaryConditions<O>) -> Result<Self> {
        ensure!(
            (0.0..=1.0).contains(&theta),
            "theta must be in [0, 1], got {theta}"
        );
        let identity = l.identity(l.size())?;
        Ok(Self {
            l,
            identity,
            explicit_part: None,
            implicit_part: None,
            dt: 0.0,
            theta,
            bcs,
        })
    }

    /// Fully explicit scheme (`θ = 0`).
    pub fn explicit_euler(l: O, bcs: BoundaryConditions<O>) -> Result<Self> {
        Self::new(l, 0.0, bcs)
    }

    /// Fully implicit scheme (`θ = 1`).
    pub fn implicit_euler(l: O, bcs: BoundaryConditions<O>) -> Result<Self> {
        Self::new(l, 1.0, bcs)
    }

    /// Crank-Nicolson (`θ = ½`).
    pub fn crank_nicolson(l: O, bcs: BoundaryConditions<O>) -> Result<Self> {
        Self::new(l, 0.5, bcs)
    }

    /// The theta weight.
    pub fn theta(&self) -> Real {
        self.theta
    }

    /// The current step size (0 until [`Evolver::set_step`] is called).
    pub fn dt(&self) -> Time {
        self.dt
    }

    /// The spatial operator.
    pub fn operator(&self) -> &O {
        &self.l
    }

    fn has_explicit_part(&self) -> bool {
        self.theta != 1.0
    }

    fn has_implicit_part(&self) -> bool {
        self.theta != 0.0
    }

    // I − (1 − θ)·dt·L
    fn build_explicit_part(&self) -> Result<O> {
        self.identity
            .subtract(&self.l.multiply((1.0 - self.theta) * self.dt))
    }

    // I + θ·dt·L
    fn build_implicit_part(&self) -> Result<O> {
        self.identity.add(&self.l.multiply(self.theta * self.dt))
    }
}

impl<O: Operator> Evolver for MixedScheme<O> {
    type Values = Array;

    fn set_step(&mut self, dt: Time) -> Result<()> {
        tracing::trace!(dt, theta = self.theta, "building scheme parts");
        self.dt = dt;
        if self.has_explicit_part() {
            self.explicit_part = Some(self.build_explicit_part()?);
        }
        if self.has_implicit_part() {
            self.implicit_part = Some(self.build_implicit_part()?);
        }
        Ok(())
    }

    fn step(&mut self, values: &mut Array, t: Time) -> Result<()> {
        // set_step always builds at least one part
        if self.explicit_part.is_none() && self.implicit_part.is_none() {
            fail!("time step not set before stepping");
        }
        for bc in self.bcs.iter_mut() {
            bc.set_time(t);
        }

        if self.has_explicit_part() {
            if self.l.is_time_dependent() {
                self.l.set_time(t)?;
                self.explicit_part = Some(self.build_explicit_part()?);
            }
            let Some(explicit_part) = self.explicit_part.as_mut() else {
                fail!("time step not set before stepping");
            };
            for bc in self.bcs.iter() {
                bc.apply_before_applying(explicit_part)?;
            }
            *values = explicit_part.apply_to(values)?;
            for bc in self.bcs.iter() {
                bc.apply_after_applying(values)?;
            }
        }

        if self.has_implicit_part() {
            if self.l.is_time_dependent() {
                self.l.set_time(t - self.dt)?;
                self.implicit_part = Some(self.build_implicit_part()?);
            }
            let Some(implicit_part) = self.implicit_part.as_mut() else {
                fail!("time step not set before stepping");
            };
            for bc in self.bcs.iter() {
                bc.apply_before_solving(implicit_part, values)?;
            }
            *values = implicit_part.solve_for(values)?;
            for bc in self.bcs.iter() {
                bc.apply_after_solving(values)?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finite_differences::boundary_condition::{
        BoundaryCondition, BoundarySide, DirichletBc,
    };
    use crate::finite_differences::difference_operators::d_plus_d_minus;
    use crate::finite_differences::tridiagonal_operator::{TimeSetter, TridiagonalOperator};
    use approx::assert_abs_diff_eq;
    use ql_core::Error;
    use std::sync::{Arc, Mutex};

    /// `L = −D₊D₋`, the backward heat operator with the sign convention used
    /// by the PDE generators.
    fn diffusion(n: usize, h: Real) -> TridiagonalOperator {
        d_plus_d_minus(n, h).unwrap().multiply(-1.0)
    }

    fn bump(n: usize) -> Array {
        Array::from_fn(n, |i| {
            let x = (i as Real - (n - 1) as Real / 2.0) / 4.0;
            (-x * x).exp()
        })
    }

    #[test]
    fn theta_outside_unit_interval_is_rejected() {
        let l = diffusion(5, 1.0);
        assert!(MixedScheme::new(l.clone(), -0.1, Vec::new()).is_err());
        assert!(MixedScheme::new(l, 1.5, Vec::new()).is_err());
    }

    #[test]
    fn stepping_before_set_step_fails() {
        let mut scheme = MixedScheme::crank_nicolson(diffusion(5, 1.0), Vec::new()).unwrap();
        let err = scheme.step(&mut Array::zeros(5), 1.0).unwrap_err();
        assert!(matches!(err, Error::Runtime(_)));
    }

    #[test]
    fn explicit_euler_is_a_single_multiply() {
        let l = diffusion(7, 0.5);
        let dt = 0.01;
        let u = bump(7);
        let expected = l
            .identity(7)
            .unwrap()
            .subtract(&l.multiply(dt))
            .unwrap()
            .apply_to(&u)
            .unwrap();

        let mut scheme = MixedScheme::explicit_euler(l, Vec::new()).unwrap();
        scheme.set_step(dt).unwrap();
        let mut v = u.clone();
        scheme.step(&mut v, 1.0).unwrap();
        assert_eq!(v, expected);
    }

    #[test]
    fn implicit_euler_is_a_single_solve() {
        let l = diffusion(7, 0.5);
        let dt = 0.01;
        let u = bump(7);
        let expected = l
            .identity(7)
            .unwrap()
            .add(&l.multiply(dt))
            .unwrap()
            .solve_for(&u)
            .unwrap();

        let mut scheme = MixedScheme::implicit_euler(l, Vec::new()).unwrap();
        scheme.set_step(dt).unwrap();
        let mut v = u.clone();
        scheme.step(&mut v, 1.0).unwrap();
        assert_eq!(v, expected);
    }

    #[test]
    fn zero_operator_leaves_values_unchanged() {
        let l = TridiagonalOperator::new(6).unwrap();
        let mut scheme = MixedScheme::crank_nicolson(l, Vec::new()).unwrap();
        scheme.set_step(0.1).unwrap();
        let u = bump(6);
        let mut v = u.clone();
        for k in 0..25 {
            scheme.step(&mut v, 2.5 - k as Real * 0.1).unwrap();
        }
        assert_eq!(v, u);
    }

    #[test]
    fn crank_nicolson_keeps_l2_norm_bounded_for_large_steps() {
        let n = 41;
        let mut bcs: BoundaryConditions<TridiagonalOperator> = Vec::new();
        bcs.push(Box::new(DirichletBc::new(0.0, BoundarySide::Lower)));
        bcs.push(Box::new(DirichletBc::new(0.0, BoundarySide::Upper)));
        let mut scheme = MixedScheme::crank_nicolson(diffusion(n, 0.1), bcs).unwrap();
        // dt/h² = 50, far beyond the explicit stability limit
        scheme.set_step(0.5).unwrap();

        let mut v = bump(n);
        v[0] = 0.0;
        v[n - 1] = 0.0;
        let initial = v.norm();
        let mut previous = initial;
        for k in 0..40 {
            scheme.step(&mut v, 20.0 - 0.5 * k as Real).unwrap();
            let m = v.norm();
            assert!(m <= previous * (1.0 + 1e-12), "step {k}: {m} > {previous}");
            previous = m;
        }
        assert!(previous <= initial);
    }

    /// Records the order in which the hooks fire.
    struct Recorder(Arc<Mutex<Vec<String>>>);

    impl BoundaryCondition<TridiagonalOperator> for Recorder {
        fn set_time(&mut self, t: Time) {
            self.0.lock().unwrap().push(format!("set_time {t}"));
        }
        fn apply_before_applying(&self, _op: &mut TridiagonalOperator) -> Result<()> {
            self.0.lock().unwrap().push("before_applying".into());
            Ok(())
        }
        fn apply_after_applying(&self, _values: &mut Array) -> Result<()> {
            self.0.lock().unwrap().push("after_applying".into());
            Ok(())
        }
        fn apply_before_solving(
            &self,
            _op: &mut TridiagonalOperator,
            _rhs: &mut Array,
        ) -> Result<()> {
            self.0.lock().unwrap().push("before_solving".into());
            Ok(())
        }
        fn apply_after_solving(&self, _values: &mut Array) -> Result<()> {
            self.0.lock().unwrap().push("after_solving".into());
            Ok(())
        }
    }

    #[test]
    fn hooks_fire_in_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let bcs: BoundaryConditions<TridiagonalOperator> = vec![Box::new(Recorder(log.clone()))];
        let mut scheme = MixedScheme::crank_nicolson(diffusion(5, 1.0), bcs).unwrap();
        scheme.set_step(0.1).unwrap();
        scheme.step(&mut bump(5), 1.0).unwrap();
        assert_eq!(
            *log.lock().unwrap(),
            vec![
                "set_time 1",
                "before_applying",
                "after_applying",
                "before_solving",
                "after_solving"
            ]
        );

        log.lock().unwrap().clear();
        let bcs: BoundaryConditions<TridiagonalOperator> = vec![Box::new(Recorder(log.clone()))];
        let mut implicit = MixedScheme::implicit_euler(diffusion(5, 1.0), bcs).unwrap();
        implicit.set_step(0.1).unwrap();
        implicit.step(&mut bump(5), 1.0).unwrap();
        assert_eq!(
            *log.lock().unwrap(),
            vec!["set_time 1", "before_solving", "after_solving"]
        );
    }

    /// Writes the time it was asked for on the diagonal, scaled.
    struct RecordingSetter(Arc<Mutex<Vec<Time>>>);

    impl TimeSetter for RecordingSetter {
        fn set_time(&self, t: Time, op: &mut TridiagonalOperator) -> Result<()> {
            self.0.lock().unwrap().push(t);
            op.set_mid_rows(0.0, t, 0.0);
            Ok(())
        }
    }

    #[test]
    fn time_dependent_step_before_set_step_fails() {
        let times = Arc::new(Mutex::new(Vec::new()));
        let l = TridiagonalOperator::new(5)
            .unwrap()
            .with_time_setter(Arc::new(RecordingSetter(times.clone())));
        let mut scheme = MixedScheme::crank_nicolson(l, Vec::new()).unwrap();
        let mut v = Array::from_slice(&[0.0, 1.0, 4.0, 1.0, 0.0]);
        let err = scheme.step(&mut v, 1.0).unwrap_err();
        assert!(matches!(err, Error::Runtime(_)));
        assert!(times.lock().unwrap().is_empty());
        assert_eq!(v.as_slice(), &[0.0, 1.0, 4.0, 1.0, 0.0]);
    }

    #[test]
    fn time_dependent_operator_sees_both_ends_of_the_step() {
        let times = Arc::new(Mutex::new(Vec::new()));
        let l = TridiagonalOperator::new(3)
            .unwrap()
            .with_time_setter(Arc::new(RecordingSetter(times.clone())));
        let mut scheme = MixedScheme::crank_nicolson(l, Vec::new()).unwrap();
        scheme.set_step(0.25).unwrap();
        let mut v = Array::from_element(3, 1.0);
        scheme.step(&mut v, 1.0).unwrap();
        assert_eq!(*times.lock().unwrap(), vec![1.0, 0.75]);

        // middle row: explicit (1 − ½·0.25·1.0), implicit (1 + ½·0.25·0.75)
        let expected = (1.0 - 0.125) / (1.0 + 0.125 * 0.75);
        assert_abs_diff_eq!(v[1], expected, epsilon = 1e-15);
        assert_eq!(v[0], 1.0);
    }
}
