//! Configuration types for the built-in scenarios and their YAML form.
//!
//! A scenario consists of:
//!
//! - [`EngineConfig`]  – which integrator advances the state
//! - [`SolverConfig`]  – tolerances and step limits
//! - [`TimeConfig`]    – the sample grid handed to the renderer
//! - [`SystemConfig`]  – which physical system, its constants and initial state
//! - [`ScenarioConfig`] – top-level wrapper
//!
//! The three scenarios are compiled in ([`ScenarioConfig::builtin`]); the
//! same structure can be restated in YAML and loaded instead.
//!
//! # YAML format
//! The built-in planar binary, written out:
//!
//! ```yaml
//! engine:
//!   integrator: "rk45"      # or "rk4"
//!
//! solver:
//!   rtol: 1.0e-8            # relative error tolerance
//!   atol: 1.0e-9            # absolute error tolerance
//!   max_steps: 1000000
//!
//! time:
//!   t0: 0.0
//!   t_end: 1.0e7            # seconds
//!   samples: 1000           # frames in the animation
//!
//! system:
//!   kind: binary            # pendulum | binary | binary_1pn
//!   G: 6.67430e-11
//!   m1: 1.989e30            # Sun
//!   m2: 5.972e24            # Earth
//!   # x1, vx1, y1, vy1, x2, vx2, y2, vy2
//!   y0: [0.0, 0.0, 0.0, 0.0, 1.496e11, 0.0, 0.0, 29.29e3]
//! ```

use std::f64::consts::PI;
use std::io::Read;

use clap::ValueEnum;
use serde::Deserialize;

use crate::simulation::params::SolverParams;

/// Which integrator method is used by the engine
/// `integrator: "rk45"` or `integrator: "rk4"`
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IntegratorConfig {
    #[serde(rename = "rk45")] // Adaptive Dormand-Prince 5(4) with dense output
    #[default]
    Rk45,

    #[serde(rename = "rk4")] // Classical fixed-step 4th-order Runge-Kutta
    Rk4,
}

/// The three fixed scenarios, selectable from the command line
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenarioKind {
    /// Spherical pendulum on a rigid rod
    Pendulum,
    /// Sun/Earth in a plane, Newtonian gravity
    Binary,
    /// Sun/Earth in space with the 1PN correction
    #[value(name = "binary-1pn")]
    Binary1pn,
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
pub struct EngineConfig {
    #[serde(default)]
    pub integrator: IntegratorConfig,
}

/// Tolerances and step limits, every field optional in YAML
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct SolverConfig {
    pub rtol: f64,
    pub atol: f64,
    pub h0: Option<f64>, // initial step, estimated when absent
    pub h_max: Option<f64>, // unbounded when absent
    pub max_steps: usize,
    pub rk4_substeps: usize,
}

impl Default for SolverConfig {
    fn default() -> Self {
        let p = SolverParams::default();
        Self {
            rtol: p.rtol,
            atol: p.atol,
            h0: None,
            h_max: None,
            max_steps: p.max_steps,
            rk4_substeps: p.rk4_substeps,
        }
    }
}

/// Sample grid: `samples` evenly spaced times over `[t0, t_end]`
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct TimeConfig {
    #[serde(default)]
    pub t0: f64,
    pub t_end: f64,
    pub samples: usize,
}

/// Physical system, constants and initial state
#[allow(non_snake_case)]
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "kind")]
pub enum SystemConfig {
    /// `y0 = [theta, omega_theta, phi, omega_phi]`
    #[serde(rename = "pendulum")]
    Pendulum { g: f64, l: f64, y0: [f64; 4] },

    /// `y0 = [x1, vx1, y1, vy1, x2, vx2, y2, vy2]`
    #[serde(rename = "binary")]
    Binary { G: f64, m1: f64, m2: f64, y0: [f64; 8] },

    /// `y0 = [x1, vx1, y1, vy1, z1, vz1, x2, vx2, y2, vy2, z2, vz2]`
    #[serde(rename = "binary_1pn")]
    Binary1pn { G: f64, c: f64, m1: f64, m2: f64, y0: [f64; 12] },
}

/// Top-level scenario configuration
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct ScenarioConfig {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub solver: SolverConfig,
    pub time: TimeConfig,
    pub system: SystemConfig,
}

// Shared constants of the two binary scenarios (SI units)
const G_SI: f64 = 6.67430e-11;
const M_SUN: f64 = 1.989e30;
const M_EARTH: f64 = 5.972e24;
const AU: f64 = 1.496e11;
const V_EARTH: f64 = 29.29e3;
const C_LIGHT: f64 = 3.0e8;

impl ScenarioConfig {
    /// The compiled-in constants of each scenario
    pub fn builtin(kind: ScenarioKind) -> Self {
        match kind {
            ScenarioKind::Pendulum => Self {
                engine: EngineConfig::default(),
                solver: SolverConfig::default(),
                time: TimeConfig { t0: 0.0, t_end: 10.0, samples: 1000 },
                system: SystemConfig::Pendulum {
                    g: 9.81,
                    l: 1.0,
                    y0: [PI / 4.0, 0.0, PI / 2.0, PI / 2.0],
                },
            },
            ScenarioKind::Binary => Self {
                engine: EngineConfig::default(),
                solver: SolverConfig::default(),
                time: TimeConfig { t0: 0.0, t_end: 1.0e7, samples: 1000 },
                system: SystemConfig::Binary {
                    G: G_SI,
                    m1: M_SUN,
                    m2: M_EARTH,
                    y0: [0.0, 0.0, 0.0, 0.0, AU, 0.0, 0.0, V_EARTH],
                },
            },
            ScenarioKind::Binary1pn => Self {
                engine: EngineConfig::default(),
                solver: SolverConfig::default(),
                time: TimeConfig { t0: 0.0, t_end: 1.0e8, samples: 10_000 },
                system: SystemConfig::Binary1pn {
                    G: G_SI,
                    c: C_LIGHT,
                    m1: M_SUN,
                    m2: M_EARTH,
                    y0: [0.0, 0.0, 0.0, 0.0, 0.0, 0.0, AU, 0.0, 0.0, V_EARTH, 0.0, 0.0],
                },
            },
        }
    }

    pub fn from_yaml_reader<R: Read>(reader: R) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_reader(reader)
    }

    pub fn from_yaml_str(s: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(s)
    }

    pub fn kind(&self) -> ScenarioKind {
        match self.system {
            SystemConfig::Pendulum { .. } => ScenarioKind::Pendulum,
            SystemConfig::Binary { .. } => ScenarioKind::Binary,
            SystemConfig::Binary1pn { .. } => ScenarioKind::Binary1pn,
        }
    }

    /// Runtime solver settings
    pub fn solver_params(&self) -> SolverParams {
        let s = &self.solver;
        SolverParams {
            integrator: self.engine.integrator,
            rtol: s.rtol,
            atol: s.atol,
            h0: s.h0,
            h_max: s.h_max.unwrap_or(f64::INFINITY),
            max_steps: s.max_steps,
            rk4_substeps: s.rk4_substeps,
            ..SolverParams::default()
        }
    }
}
