//! Backward evolution driver (translates
//! `ql/methods/finitedifferences/finitedifferencemodel.hpp`).

use ql_core::{ensure, Real, Result, Size, Time};
use ql_math::comparison::{close, close_enough};

use super::mixed_scheme::{Evolver, MixedScheme};
use super::parallel_evolver::ParallelEvolver;
use super::step_condition::StepCondition;
use super::tridiagonal_operator::TridiagonalOperator;
use crate::time_grid::TimeGrid;

/// A step condition anchored to one mesh time.
pub type AnchoredCondition<'a, A> = (Time, &'a dyn StepCondition<A>);

/// Rolls a grid back in time with an [`Evolver`], applying a step condition
/// after every step and stopping exactly on every registered stopping time.
pub struct FiniteDifferenceModel<E: Evolver> {
    evolver: E,
    stopping_times: Vec<Time>,
}

/// Crank-Nicolson over a single tridiagonal operator.
pub type StandardFiniteDifferenceModel = FiniteDifferenceModel<MixedScheme<TridiagonalOperator>>;

/// Crank-Nicolson over a system of tridiagonal operators.
pub type StandardSystemFiniteDifferenceModel =
    FiniteDifferenceModel<ParallelEvolver<TridiagonalOperator>>;

impl<E: Evolver> FiniteDifferenceModel<E> {
    /// Wrap `evolver`; `stopping_times` are sorted and deduplicated.
    pub fn new(evolver: E, stopping_times: &[Time]) -> Self {
        let mut stopping_times = stopping_times.to_vec();
        stopping_times.sort_by(Real::total_cmp);
        stopping_times.dedup();
        Self {
            evolver,
            stopping_times,
        }
    }

    /// The wrapped evolver.
    pub fn evolver(&self) -> &E {
        &self.evolver
    }

    /// Mutable access to the wrapped evolver.
    pub fn evolver_mut(&mut self) -> &mut E {
        &mut self.evolver
    }

    /// Sorted stopping times.
    pub fn stopping_times(&self) -> &[Time] {
        &self.stopping_times
    }

    /// Evolve `values` from `from` back to `to` in `steps` uniform steps.
    ///
    /// `condition`, when given, is applied after every step at the time just
    /// reached, and at `from` when `from` is itself the last stopping time.
    /// A stopping time strictly inside a step splits it so that the condition
    /// is also applied exactly there.
    pub fn rollback(
        &mut self,
        values: &mut E::Values,
        from: Time,
        to: Time,
        steps: Size,
        condition: Option<&dyn StepCondition<E::Values>>,
    ) -> Result<()> {
        ensure!(
            from >= to,
            "trying to roll back from {from} to {to}: rollback only runs backwards"
        );
        ensure!(steps > 0, "rollback needs at least one step");

        let dt = (from - to) / steps as Real;
        tracing::debug!(
            from,
            to,
            steps,
            stopping_times = self.stopping_times.len(),
            "rolling back"
        );

        self.evolver.set_step(dt)?;

        if let Some(cond) = condition {
            if matches!(self.stopping_times.last(), Some(&last) if close_enough(last, from, 42)) {
                cond.apply_to(values, from)?;
            }
        }

        let snap = Real::EPSILON.sqrt();
        let mut t = from;
        for i in 0..steps {
            let mut now = t;
            let mut next = t - dt;
            if close(to, next, snap) {
                next = to;
            }

            let mut hit = false;
            for &stop in self.stopping_times.iter().rev() {
                if next <= stop && stop < now {
                    hit = true;
                    tracing::debug!(step = i, now, stop, "stopping time inside step");
                    self.evolver.set_step(now - stop)?;
                    self.evolver.step(values, now)?;
                    if let Some(cond) = condition {
                        cond.apply_to(values, stop)?;
                    }
                    now = stop;
                }
            }

            if hit {
                if now > next {
                    self.evolver.set_step(now - next)?;
                    self.evolver.step(values, now)?;
                    if let Some(cond) = condition {
                        cond.apply_to(values, next)?;
                    }
                }
                self.evolver.set_step(dt)?;
            } else {
                tracing::trace!(step = i, t = now, "step");
                self.evolver.step(values, now)?;
                if let Some(cond) = condition {
                    cond.apply_to(values, next)?;
                }
            }

            t -= dt;
        }

        tracing::debug!(to, "rollback complete");
        Ok(())
    }

    /// Evolve `values` along an explicit mesh, from its last point down to
    /// the point closest to `to`.
    ///
    /// Each anchored condition is applied right after the step that reaches
    /// its mesh time (or before stepping, if anchored at the mesh end).
    /// Anchored times that are not mesh points are never applied.
    pub fn rollback_on_grid(
        &mut self,
        values: &mut E::Values,
        grid: &TimeGrid,
        to: Time,
        conditions: &[AnchoredCondition<'_, E::Values>],
    ) -> Result<()> {
        ensure!(
            to <= grid.end(),
            "target time {to} lies beyond the mesh end {}",
            grid.end()
        );
        let start = grid.size() - 1;
        let target = grid.closest_index(to);
        tracing::debug!(
            from = grid.end(),
            to = grid.time(target),
            steps = start - target,
            conditions = conditions.len(),
            "rolling back on mesh"
        );

        let apply_at = |index: Size, values: &mut E::Values| -> Result<()> {
            let t = grid.time(index);
            for (anchor, condition) in conditions {
                if grid.closest_index(*anchor) == index && grid.index(*anchor).is_ok() {
                    condition.apply_to(values, t)?;
                }
            }
            Ok(())
        };

        apply_at(start, values)?;

        let mut current_dt: Option<Time> = None;
        for i in (target + 1..=start).rev() {
            let dt = grid.dt(i - 1);
            if current_dt != Some(dt) {
                self.evolver.set_step(dt)?;
                current_dt = Some(dt);
            }
            tracing::trace!(index = i, t = grid.time(i), dt, "mesh step");
            self.evolver.step(values, grid.time(i))?;
            apply_at(i - 1, values)?;
        }

        Ok(())
    }
}
