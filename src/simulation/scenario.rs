//! Build fully-initialized simulation scenarios from configuration
//!
//! Takes a `ScenarioConfig` and produces a runtime `Scenario` containing:
//! - the ODE system with its parameters bound
//! - the initial state vector
//! - the sample grid (`TimeGrid`)
//! - solver settings (`SolverParams`)
//!
//! `Scenario::run` integrates once and returns a `ScenarioRun` holding the
//! owned trajectory and the frame source the viewers replay.

use log::info;

use crate::configuration::config::{ScenarioConfig, ScenarioKind, SystemConfig};
use crate::simulation::error::SimResult;
use crate::simulation::frames::{PendulumFrames, PlanarBinaryFrames, SpatialBinaryFrames};
use crate::simulation::integrator::integrate;
use crate::simulation::params::{BinaryParams, PendulumParams, PostNewtonianParams, SolverParams};
use crate::simulation::states::{planar_position, spatial_position, PendulumState, PlanarState, SpatialState};
use crate::simulation::systems::{PlanarBinary, RelativisticBinary, SphericalPendulum};
use crate::simulation::trajectory::{SolveStats, TimeGrid, Trajectory};

/// System plus its initial state
enum Model {
    Pendulum(SphericalPendulum, PendulumState),
    Binary(PlanarBinary, PlanarState),
    Binary1pn(RelativisticBinary, SpatialState),
}

/// A validated scenario, ready to integrate
pub struct Scenario {
    pub grid: TimeGrid,
    pub solver: SolverParams,
    model: Model,
}

impl Scenario {
    pub fn from_config(cfg: &ScenarioConfig) -> SimResult<Self> {
        let grid = TimeGrid::linspace(cfg.time.t0, cfg.time.t_end, cfg.time.samples)?;
        let solver = cfg.solver_params();
        solver.validate()?;

        let model = match &cfg.system {
            SystemConfig::Pendulum { g, l, y0 } => {
                let system = SphericalPendulum::new(PendulumParams { g: *g, l: *l })?;
                Model::Pendulum(system, PendulumState::from(*y0))
            }
            SystemConfig::Binary { G: g, m1, m2, y0 } => {
                let system = PlanarBinary::new(BinaryParams { G: *g, m1: *m1, m2: *m2 })?;
                Model::Binary(system, PlanarState::from(*y0))
            }
            SystemConfig::Binary1pn { G: g, c, m1, m2, y0 } => {
                let system = RelativisticBinary::new(PostNewtonianParams {
                    binary: BinaryParams { G: *g, m1: *m1, m2: *m2 },
                    c: *c,
                })?;
                Model::Binary1pn(system, SpatialState::from(*y0))
            }
        };

        Ok(Self { grid, solver, model })
    }

    pub fn builtin(kind: ScenarioKind) -> SimResult<Self> {
        Self::from_config(&ScenarioConfig::builtin(kind))
    }

    pub fn kind(&self) -> ScenarioKind {
        match self.model {
            Model::Pendulum(..) => ScenarioKind::Pendulum,
            Model::Binary(..) => ScenarioKind::Binary,
            Model::Binary1pn(..) => ScenarioKind::Binary1pn,
        }
    }

    /// Override solver settings, e.g. for a tolerance sweep
    pub fn with_solver(mut self, solver: SolverParams) -> Self {
        self.solver = solver;
        self
    }

    /// Integrate over the whole grid in one blocking call
    pub fn run(&self) -> SimResult<ScenarioRun> {
        info!(
            "integrating {:?}: {} samples over [{}, {}] with {:?}",
            self.kind(),
            self.grid.len(),
            self.grid.start(),
            self.grid.end(),
            self.solver.integrator
        );

        let run = match &self.model {
            Model::Pendulum(system, y0) => {
                let trajectory = integrate(system, y0, &self.grid, &self.solver)?;
                let frames = PendulumFrames::new(&trajectory, system.params.l);
                ScenarioRun::Pendulum { trajectory, frames, system: *system }
            }
            Model::Binary(system, y0) => {
                let trajectory = integrate(system, y0, &self.grid, &self.solver)?;
                let frames = PlanarBinaryFrames::new(&trajectory);
                ScenarioRun::Binary { trajectory, frames }
            }
            Model::Binary1pn(system, y0) => {
                let trajectory = integrate(system, y0, &self.grid, &self.solver)?;
                let frames = SpatialBinaryFrames::new(&trajectory);
                ScenarioRun::Binary1pn { trajectory, frames }
            }
        };

        let stats = run.stats();
        info!(
            "done: {} evals, {} accepted steps, {} rejected",
            stats.evals, stats.accepted, stats.rejected
        );
        Ok(run)
    }
}

/// Result of one scenario run: the trajectory and its frame source
pub enum ScenarioRun {
    Pendulum { trajectory: Trajectory<4>, frames: PendulumFrames, system: SphericalPendulum },
    Binary { trajectory: Trajectory<8>, frames: PlanarBinaryFrames },
    Binary1pn { trajectory: Trajectory<12>, frames: SpatialBinaryFrames },
}

/// Headline numbers for the log
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub samples: usize,
    pub t_end: f64,
    pub stats: SolveStats,
    /// Pendulum: energy drift. Binaries: `(min, max)` separation.
    pub check: RunCheck,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RunCheck {
    /// Largest `|E - E0| / |E0|` of [`SphericalPendulum::energy`] over the samples
    EnergyDrift(f64),
    Separation { min: f64, max: f64 },
}

impl ScenarioRun {
    pub fn stats(&self) -> SolveStats {
        match self {
            Self::Pendulum { trajectory, .. } => trajectory.stats(),
            Self::Binary { trajectory, .. } => trajectory.stats(),
            Self::Binary1pn { trajectory, .. } => trajectory.stats(),
        }
    }

    pub fn summary(&self) -> RunSummary {
        let (samples, t_end, check) = match self {
            Self::Pendulum { trajectory, system, .. } => {
                let drift = energy_drift(system, trajectory);
                (trajectory.len(), last_time(trajectory.times()), RunCheck::EnergyDrift(drift))
            }
            Self::Binary { trajectory, .. } => {
                let (min, max) = separation_range(
                    trajectory
                        .states()
                        .iter()
                        .map(|y| (planar_position(y, 1) - planar_position(y, 0)).norm()),
                );
                (trajectory.len(), last_time(trajectory.times()), RunCheck::Separation { min, max })
            }
            Self::Binary1pn { trajectory, .. } => {
                let (min, max) = separation_range(
                    trajectory
                        .states()
                        .iter()
                        .map(|y| (spatial_position(y, 1) - spatial_position(y, 0)).norm()),
                );
                (trajectory.len(), last_time(trajectory.times()), RunCheck::Separation { min, max })
            }
        };

        RunSummary { samples, t_end, stats: self.stats(), check }
    }
}

/// Largest relative energy change against the first sample
pub fn energy_drift(system: &SphericalPendulum, traj: &Trajectory<4>) -> f64 {
    let Some(y0) = traj.states().first() else {
        return 0.0;
    };
    let e0 = system.energy(y0);
    let scale = if e0 != 0.0 { e0.abs() } else { 1.0 };
    traj.states()
        .iter()
        .map(|y| (system.energy(y) - e0).abs() / scale)
        .fold(0.0, f64::max)
}

fn last_time(times: &[f64]) -> f64 {
    times.last().copied().unwrap_or(0.0)
}

/// `(min, max)` of the body separation over all samples
pub fn separation_range(r: impl Iterator<Item = f64>) -> (f64, f64) {
    r.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), d| (lo.min(d), hi.max(d)))
}
