//! Right-hand sides of the three ODE systems
//!
//! Each system implements [`OdeSystem`]: a pure function of `(t, y)` that the
//! integrator may call any number of times, including for rejected steps.
//! Preconditions on the initial state are checked by
//! [`OdeSystem::check_initial`] before integration starts.

use crate::simulation::error::{SimError, SimResult};
use crate::simulation::forces::{AccelSet, AccelSet3, NewtonianGravity, NewtonianGravity3, PostNewtonian1};
use crate::simulation::params::{BinaryParams, PendulumParams, PostNewtonianParams};
use crate::simulation::states::{
    pack_planar, pack_spatial, NVec2, NVec3, PendulumState, PlanarState, SpatialState, State, System, System3,
};

/// `|sin(theta)|` below this counts as sitting on the vertical axis
const AXIS_EPS: f64 = 1.0e-12;

/// First-order ODE system `dy/dt = f(t, y)` over a fixed-length state
pub trait OdeSystem<const N: usize> {
    fn derivative(&self, t: f64, y: &State<N>) -> State<N>;

    /// Reject initial states the equations are singular at
    fn check_initial(&self, _y: &State<N>) -> SimResult<()> {
        Ok(())
    }

    /// Put an accepted state `y` back on the first integrals fixed by `y0`
    ///
    /// Called by the integrators after every accepted step. Returns `true`
    /// if `y` was touched, so a cached derivative must be recomputed.
    fn project(&self, _y0: &State<N>, _y: &mut State<N>) -> bool {
        false
    }
}

/// Adapter turning a closure into an [`OdeSystem`]
pub struct FnSystem<F>(pub F);

impl<F, const N: usize> OdeSystem<N> for FnSystem<F>
where
    F: Fn(f64, &State<N>) -> State<N>,
{
    fn derivative(&self, t: f64, y: &State<N>) -> State<N> {
        (self.0)(t, y)
    }
}

// =========================================================================================
// Spherical pendulum
// =========================================================================================

/// Rigid massless rod of length `l` swinging freely about a fixed pivot
///
/// State `[theta, omega_theta, phi, omega_phi]`, `theta` measured from the
/// downward vertical. The azimuthal equation divides by `sin(theta)`, so the
/// bob must not start on the vertical axis.
///
/// The equations keep `omega_phi / sin^2(theta)` constant, so `omega_phi`
/// vanishes like `sin^2(theta)` whenever the bob swings through the axis and
/// the `omega_phi / sin(theta)` quotient stays finite along exact solutions.
/// Truncation error breaks that cancellation right at the crossing and would
/// pick an arbitrary new constant on the far side; [`OdeSystem::project`]
/// restores it after every step so the crossing is stepped over.
#[derive(Debug, Clone, Copy)]
pub struct SphericalPendulum {
    pub params: PendulumParams,
}

impl SphericalPendulum {
    pub fn new(params: PendulumParams) -> SimResult<Self> {
        params.validate()?;
        Ok(Self { params })
    }

    /// `omega_phi / sin^2(theta)`, constant along solutions
    pub fn azimuthal_invariant(y: &PendulumState) -> f64 {
        y[3] / y[0].sin().powi(2)
    }

    /// `omega_theta^2 / 2 - (g / l) cos(theta) + omega_phi^2 sin^2(theta) / 6`, constant along solutions
    pub fn energy(&self, y: &PendulumState) -> f64 {
        let PendulumParams { g, l } = self.params;
        let s = y[0].sin();
        0.5 * y[1] * y[1] - (g / l) * y[0].cos() + y[3] * y[3] * s * s / 6.0
    }
}

impl OdeSystem<4> for SphericalPendulum {
    fn derivative(&self, _t: f64, y: &PendulumState) -> PendulumState {
        let (theta, omega_theta, omega_phi) = (y[0], y[1], y[3]);
        let PendulumParams { g, l } = self.params;
        let (s, c) = theta.sin_cos();

        PendulumState::new(
            omega_theta,
            -(g / l) * s - omega_phi * omega_phi * s * c,
            omega_phi,
            2.0 * omega_theta * omega_phi * c / s,
        )
    }

    fn check_initial(&self, y: &PendulumState) -> SimResult<()> {
        if y.iter().any(|v| !v.is_finite()) {
            return Err(SimError::InvalidInput("pendulum initial state must be finite".into()));
        }
        if y[0].sin().abs() < AXIS_EPS {
            return Err(SimError::InvalidInput(format!(
                "pendulum starts on the vertical axis (theta = {}), sin(theta) must be nonzero",
                y[0]
            )));
        }
        Ok(())
    }

    fn project(&self, y0: &PendulumState, y: &mut PendulumState) -> bool {
        y[3] = Self::azimuthal_invariant(y0) * y[0].sin().powi(2);
        true
    }
}

/// Spherical to Cartesian, `z` pointing up so the bob hangs at `z = -l`
pub fn cart_coords(theta: f64, phi: f64, l: f64) -> NVec3 {
    let (st, ct) = theta.sin_cos();
    let (sp, cp) = phi.sin_cos();
    NVec3::new(l * st * cp, l * st * sp, -l * ct)
}

/// Inverse of [`cart_coords`]: `(theta, phi)` with `theta = acos(-z / l)`, `phi = atan2(y, x)`
pub fn spherical_coords(p: &NVec3, l: f64) -> (f64, f64) {
    let theta = (-p.z / l).clamp(-1.0, 1.0).acos();
    let phi = p.y.atan2(p.x);
    (theta, phi)
}

// =========================================================================================
// Planar binary
// =========================================================================================

/// Two point masses in a plane under Newtonian gravity
///
/// State `[x1, vx1, y1, vy1, x2, vx2, y2, vy2]`. No softening: the bodies
/// must start apart and a collision surfaces as a singular configuration.
pub struct PlanarBinary {
    pub params: BinaryParams,
    forces: AccelSet,
}

impl PlanarBinary {
    pub fn new(params: BinaryParams) -> SimResult<Self> {
        params.validate()?;
        let forces = AccelSet::new().with(NewtonianGravity { G: params.G });
        Ok(Self { params, forces })
    }

    /// Accelerations of both bodies for state `y`
    pub fn accelerations(&self, t: f64, y: &PlanarState) -> [NVec2; 2] {
        let sys = System::from_planar(t, y, self.params.masses());
        let mut acc = [NVec2::zeros(); 2];
        self.forces.accumulate_accels(t, &sys, &mut acc);
        acc
    }
}

impl OdeSystem<8> for PlanarBinary {
    fn derivative(&self, t: f64, y: &PlanarState) -> PlanarState {
        let acc = self.accelerations(t, y);
        let vel = [NVec2::new(y[1], y[3]), NVec2::new(y[5], y[7])];
        pack_planar(vel, acc)
    }

    fn check_initial(&self, y: &PlanarState) -> SimResult<()> {
        if y.iter().any(|v| !v.is_finite()) {
            return Err(SimError::InvalidInput("binary initial state must be finite".into()));
        }
        let sep = System::from_planar(0.0, y, self.params.masses());
        if (sep.bodies[1].x - sep.bodies[0].x).norm() == 0.0 {
            return Err(SimError::InvalidInput("bodies start at zero separation".into()));
        }
        Ok(())
    }
}

// =========================================================================================
// Spatial binary with 1PN correction
// =========================================================================================

/// Two point masses in space, Newtonian gravity plus the 1PN correction
///
/// State `[x1, vx1, y1, vy1, z1, vz1, x2, vx2, y2, vy2, z2, vz2]`.
pub struct RelativisticBinary {
    pub params: PostNewtonianParams,
    forces: AccelSet3,
}

impl RelativisticBinary {
    pub fn new(params: PostNewtonianParams) -> SimResult<Self> {
        params.validate()?;
        let g = params.binary.G;
        let forces = AccelSet3::new()
            .with(NewtonianGravity3 { G: g })
            .with(PostNewtonian1 { G: g, c: params.c });
        Ok(Self { params, forces })
    }

    /// Accelerations of both bodies for state `y`
    pub fn accelerations(&self, t: f64, y: &SpatialState) -> [NVec3; 2] {
        let sys = System3::from_spatial(t, y, self.params.binary.masses());
        let mut acc = [NVec3::zeros(); 2];
        self.forces.accumulate_accels(t, &sys, &mut acc);
        acc
    }
}

impl OdeSystem<12> for RelativisticBinary {
    fn derivative(&self, t: f64, y: &SpatialState) -> SpatialState {
        let acc = self.accelerations(t, y);
        let vel = [
            NVec3::new(y[1], y[3], y[5]),
            NVec3::new(y[7], y[9], y[11]),
        ];
        pack_spatial(vel, acc)
    }

    fn check_initial(&self, y: &SpatialState) -> SimResult<()> {
        if y.iter().any(|v| !v.is_finite()) {
            return Err(SimError::InvalidInput("binary initial state must be finite".into()));
        }
        let sys = System3::from_spatial(0.0, y, self.params.binary.masses());
        if (sys.bodies[1].x - sys.bodies[0].x).norm() == 0.0 {
            return Err(SimError::InvalidInput("bodies start at zero separation".into()));
        }
        Ok(())
    }
}
