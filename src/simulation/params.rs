//! Numerical and physical parameters for the three scenarios
//!
//! - `PendulumParams`: gravity and rod length
//! - `BinaryParams`: gravitational constant and the two masses
//! - `PostNewtonianParams`: `BinaryParams` plus the speed of light
//! - `SolverParams`: integrator choice, tolerances and step limits
//!
//! All of them are bound once when a scenario is built and never mutated
//! during integration.

use crate::configuration::config::IntegratorConfig;
use crate::simulation::error::{SimError, SimResult};

#[derive(Debug, Clone, Copy)]
pub struct PendulumParams {
    pub g: f64, // gravitational acceleration
    pub l: f64, // rod length
}

#[allow(non_snake_case)]
#[derive(Debug, Clone, Copy)]
pub struct BinaryParams {
    pub G: f64, // gravitational constant
    pub m1: f64, // mass of body 1
    pub m2: f64, // mass of body 2
}

#[derive(Debug, Clone, Copy)]
pub struct PostNewtonianParams {
    pub binary: BinaryParams,
    pub c: f64, // speed of light
}

#[derive(Debug, Clone)]
pub struct SolverParams {
    pub integrator: IntegratorConfig, // rk45 or rk4
    pub rtol: f64, // relative error tolerance
    pub atol: f64, // absolute error tolerance
    pub h0: Option<f64>, // initial step size, estimated when None
    pub h_max: f64, // largest step the adaptive solver may take
    pub min_step: f64, // caller floor above the time resolution, 0 for none
    pub max_steps: usize, // step budget for one run
    pub rk4_substeps: usize, // fixed steps between two samples
}

impl Default for SolverParams {
    fn default() -> Self {
        Self {
            integrator: IntegratorConfig::Rk45,
            rtol: 1.0e-8,
            atol: 1.0e-9,
            h0: None,
            h_max: f64::INFINITY,
            min_step: 0.0,
            max_steps: 1_000_000,
            rk4_substeps: 10,
        }
    }
}

fn positive(name: &str, value: f64) -> SimResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(SimError::InvalidInput(format!("{name} must be finite and positive, got {value}")))
    }
}

impl PendulumParams {
    pub fn validate(&self) -> SimResult<()> {
        if !self.g.is_finite() {
            return Err(SimError::InvalidInput(format!("g must be finite, got {}", self.g)));
        }
        positive("l", self.l)
    }
}

impl BinaryParams {
    pub fn validate(&self) -> SimResult<()> {
        positive("G", self.G)?;
        positive("m1", self.m1)?;
        positive("m2", self.m2)
    }

    pub fn masses(&self) -> [f64; 2] {
        [self.m1, self.m2]
    }
}

impl PostNewtonianParams {
    pub fn validate(&self) -> SimResult<()> {
        self.binary.validate()?;
        positive("c", self.c)
    }
}

impl SolverParams {
    pub fn validate(&self) -> SimResult<()> {
        positive("rtol", self.rtol)?;
        positive("atol", self.atol)?;
        if let Some(h0) = self.h0 {
            positive("h0", h0)?;
        }
        if !(self.h_max > 0.0) {
            return Err(SimError::InvalidInput(format!("h_max must be positive, got {}", self.h_max)));
        }
        if self.max_steps == 0 {
            return Err(SimError::InvalidInput("max_steps must be at least 1".into()));
        }
        if self.rk4_substeps == 0 {
            return Err(SimError::InvalidInput("rk4_substeps must be at least 1".into()));
        }
        Ok(())
    }
}
