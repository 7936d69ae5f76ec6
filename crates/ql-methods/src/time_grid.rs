//! Time discretisation shared by the finite-difference rollback.
//!
//! Corresponds to `QuantLib::TimeGrid`.

use ql_core::{ensure, fail, Real, Result, Size, Time};

const TIME_TOLERANCE: Real = 1e-12;

/// An increasing sequence of time points starting at zero (or at the first
/// mandatory time when that is negative).
#[derive(Debug, Clone, PartialEq)]
pub struct TimeGrid {
    times: Vec<Time>,
    dts: Vec<Time>,
}

impl TimeGrid {
    /// Regular grid from 0 to `end` with `steps` intervals.
    pub fn uniform(end: Time, steps: Size) -> Result<Self> {
        ensure!(steps > 0, "time grid needs at least one step");
        ensure!(end > 0.0, "time grid end must be positive, got {end}");
        let dt = end / steps as Real;
        let times = (0..=steps).map(|i| i as Real * dt).collect();
        Ok(Self {
            times,
            dts: vec![dt; steps],
        })
    }

    /// Grid containing 0, every mandatory time, and enough regularly spaced
    /// points in between that no interval exceeds `end / steps`.
    pub fn from_times(mandatory: &[Time], steps: Size) -> Result<Self> {
        ensure!(!mandatory.is_empty(), "at least one mandatory time required");
        if let Some(t) = mandatory.iter().find(|t| !t.is_finite()) {
            fail!("mandatory time {t} is not finite");
        }

        let mut anchors: Vec<Time> = mandatory.to_vec();
        anchors.push(0.0);
        anchors.sort_by(Real::total_cmp);
        anchors.dedup_by(|a, b| (*a - *b).abs() <= TIME_TOLERANCE);

        let start = anchors[0];
        let end = anchors[anchors.len() - 1];
        ensure!(end > start, "mandatory times span an empty interval");
        let max_dt = if steps == 0 {
            end - start
        } else {
            (end - start) / steps as Real
        };

        let mut times = vec![start];
        for pair in anchors.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            let n = (((b - a) / max_dt).round() as Size).max(1);
            let dt = (b - a) / n as Real;
            times.extend((1..n).map(|k| a + k as Real * dt));
            times.push(b);
        }
        let dts = times.windows(2).map(|w| w[1] - w[0]).collect();
        Ok(Self { times, dts })
    }

    /// Number of time points.
    pub fn size(&self) -> Size {
        self.times.len()
    }

    /// Number of intervals.
    pub fn steps(&self) -> Size {
        self.dts.len()
    }

    /// Time at index `i`.
    pub fn time(&self, i: Size) -> Time {
        self.times[i]
    }

    /// Interval between index `i` and `i + 1`.
    pub fn dt(&self, i: Size) -> Time {
        self.dts[i]
    }

    /// All time points.
    pub fn times(&self) -> &[Time] {
        &self.times
    }

    /// First time point.
    pub fn start(&self) -> Time {
        self.times[0]
    }

    /// Last time point.
    pub fn end(&self) -> Time {
        self.times[self.times.len() - 1]
    }

    /// Index of the point equal to `t` (within tolerance).
    pub fn index(&self, t: Time) -> Result<Size> {
        let i = self.closest_index(t);
        if (self.times[i] - t).abs() <= TIME_TOLERANCE * t.abs().max(1.0) {
            Ok(i)
        } else {
            fail!(
                "time {t} is not on the grid (closest point: {})",
                self.times[i]
            )
        }
    }

    /// Index of the point closest to `t`; ties go to the earlier point.
    pub fn closest_index(&self, t: Time) -> Size {
        let upper = self.times.partition_point(|&x| x < t);
        if upper == 0 {
            0
        } else if upper == self.times.len() {
            self.times.len() - 1
        } else if t - self.times[upper - 1] <= self.times[upper] - t {
            upper - 1
        } else {
            upper
        }
    }

    /// The point closest to `t`.
    pub fn closest_time(&self, t: Time) -> Time {
        self.times[self.closest_index(t)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn uniform_grid() {
        let grid = TimeGrid::uniform(1.0, 4).unwrap();
        assert_eq!(grid.size(), 5);
        assert_eq!(grid.steps(), 4);
        assert_eq!(grid.times(), &[0.0, 0.25, 0.5, 0.75, 1.0]);
        assert_eq!(grid.dt(2), 0.25);
        assert_eq!(grid.start(), 0.0);
        assert_eq!(grid.end(), 1.0);
        assert!(TimeGrid::uniform(1.0, 0).is_err());
        assert!(TimeGrid::uniform(0.0, 3).is_err());
    }

    #[test]
    fn mandatory_times_are_hit() {
        let grid = TimeGrid::from_times(&[0.3, 1.0], 10).unwrap();
        assert_eq!(grid.start(), 0.0);
        assert_eq!(grid.end(), 1.0);
        assert!(grid.index(0.3).is_ok());
        for i in 0..grid.steps() {
            assert!(grid.dt(i) <= 0.1 + 1e-12);
        }
        assert_eq!(grid.steps(), 10);
    }

    #[test]
    fn duplicates_collapse() {
        let grid = TimeGrid::from_times(&[1.0, 1.0, 0.0], 2).unwrap();
        assert_eq!(grid.times(), &[0.0, 0.5, 1.0]);
    }

    #[test]
    fn lookup() {
        let grid = TimeGrid::uniform(2.0, 4).unwrap();
        assert_eq!(grid.index(1.5).unwrap(), 3);
        assert!(grid.index(1.4).is_err());
        assert_eq!(grid.closest_index(1.3), 3);
        assert_eq!(grid.closest_index(-1.0), 0);
        assert_eq!(grid.closest_index(9.0), 4);
        assert_abs_diff_eq!(grid.closest_time(0.2), 0.0);
        assert_abs_diff_eq!(grid.closest_time(0.3), 0.5);
    }
}
