//! Sample grids and integrated trajectories
//!
//! A [`TimeGrid`] lists the times at which the solver reports the state. It is
//! independent of the solver's internal steps. A [`Trajectory`] holds one state
//! per grid sample and is never mutated after the integrator returns it.

use crate::simulation::error::{SimError, SimResult};
use crate::simulation::states::{State, NVec3, PendulumState};
use crate::simulation::systems::cart_coords;

/// Strictly increasing, finite sample times (at least one)
#[derive(Debug, Clone, PartialEq)]
pub struct TimeGrid {
    times: Vec<f64>,
}

impl TimeGrid {
    pub fn new(times: Vec<f64>) -> SimResult<Self> {
        if times.is_empty() {
            return Err(SimError::InvalidTimeGrid("no sample times".into()));
        }
        if let Some(bad) = times.iter().find(|t| !t.is_finite()) {
            return Err(SimError::InvalidTimeGrid(format!("non-finite sample time {bad}")));
        }
        if let Some(w) = times.windows(2).find(|w| w[1] <= w[0]) {
            return Err(SimError::InvalidTimeGrid(format!(
                "sample times must be strictly increasing ({} then {})",
                w[0], w[1]
            )));
        }
        Ok(Self { times })
    }

    /// `n` evenly spaced samples over `[t0, t1]`, both ends included
    pub fn linspace(t0: f64, t1: f64, n: usize) -> SimResult<Self> {
        match n {
            0 => Err(SimError::InvalidTimeGrid("sample count must be at least 1".into())),
            1 => Self::new(vec![t0]),
            _ => {
                let step = (t1 - t0) / (n - 1) as f64;
                let mut times: Vec<f64> = (0..n).map(|i| t0 + step * i as f64).collect();
                // Land exactly on the end point
                times[n - 1] = t1;
                Self::new(times)
            }
        }
    }

    pub fn times(&self) -> &[f64] {
        &self.times
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn start(&self) -> f64 {
        self.times[0]
    }

    pub fn end(&self) -> f64 {
        self.times[self.times.len() - 1]
    }
}

/// Work done by the solver for one trajectory
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SolveStats {
    pub evals: usize, // derivative evaluations
    pub accepted: usize, // accepted steps
    pub rejected: usize, // rejected steps
}

/// Dense state samples, one per grid time
#[derive(Debug, Clone)]
pub struct Trajectory<const N: usize> {
    times: Vec<f64>,
    states: Vec<State<N>>,
    stats: SolveStats,
}

impl<const N: usize> Trajectory<N> {
    pub(crate) fn new(times: Vec<f64>, states: Vec<State<N>>, stats: SolveStats) -> Self {
        debug_assert_eq!(times.len(), states.len());
        Self { times, states, stats }
    }

    /// `(samples, components)`
    pub fn shape(&self) -> (usize, usize) {
        (self.states.len(), N)
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn times(&self) -> &[f64] {
        &self.times
    }

    pub fn states(&self) -> &[State<N>] {
        &self.states
    }

    pub fn state(&self, frame: usize) -> Option<&State<N>> {
        self.states.get(frame)
    }

    pub fn component(&self, frame: usize, k: usize) -> Option<f64> {
        if k >= N {
            return None;
        }
        self.states.get(frame).map(|y| y[k])
    }

    pub fn stats(&self) -> SolveStats {
        self.stats
    }

    /// Fail with the time of the first sample holding a NaN or infinity
    pub fn check_finite(&self) -> SimResult<()> {
        match self
            .states
            .iter()
            .zip(&self.times)
            .find(|(y, _)| y.iter().any(|v| !v.is_finite()))
        {
            Some((_, &t)) => Err(SimError::Singular { t }),
            None => Ok(()),
        }
    }
}

/// Pendulum bob positions, indexable in lockstep with the trajectory
#[derive(Debug, Clone)]
pub struct CartesianTrace {
    points: Vec<NVec3>,
}

impl CartesianTrace {
    /// Apply the spherical-to-Cartesian transform to every sample
    pub fn from_pendulum(traj: &Trajectory<4>, l: f64) -> Self {
        let points = traj
            .states()
            .iter()
            .map(|y: &PendulumState| cart_coords(y[0], y[2], l))
            .collect();
        Self { points }
    }

    pub fn points(&self) -> &[NVec3] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn get(&self, frame: usize) -> Option<NVec3> {
        self.points.get(frame).copied()
    }
}
